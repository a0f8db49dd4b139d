//! Persistence port and its adapters.
//!
//! Everything the client remembers lives under three string keys, each
//! holding a JSON document. The rest of the crate only sees the
//! [`KeyValueStore`] trait, so tests can swap in [`MemoryStore`].

pub mod conversation_repository;
pub mod memory_store;
pub mod settings_repository;
pub mod sqlite_store;

use async_trait::async_trait;

use crate::errors::AppError;

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

pub const API_KEY_KEY: &str = "apiKey";
pub const SYSTEM_INSTRUCTION_KEY: &str = "systemInstruction";
pub const CONVERSATIONS_KEY: &str = "conversations";

/// String-keyed storage of serialized JSON that survives restarts.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Replaces whatever is stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}
