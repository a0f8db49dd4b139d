use std::sync::Arc;

use crate::db::{KeyValueStore, API_KEY_KEY, SYSTEM_INSTRUCTION_KEY};
use crate::errors::AppError;
use crate::models::{SessionSettings, DEFAULT_SYSTEM_INSTRUCTION};

/// Session configuration, stored as plain strings under their own keys.
#[derive(Clone)]
pub struct SettingsRepository {
    store: Arc<dyn KeyValueStore>,
}

impl SettingsRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<SessionSettings, AppError> {
        let api_key = self.store.get(API_KEY_KEY).await?.unwrap_or_default();
        let system_instruction = self
            .store
            .get(SYSTEM_INSTRUCTION_KEY)
            .await?
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string());

        Ok(SessionSettings { api_key, system_instruction })
    }

    pub async fn save_api_key(&self, api_key: &str) -> Result<(), AppError> {
        self.store.set(API_KEY_KEY, api_key).await
    }

    pub async fn save_system_instruction(&self, text: &str) -> Result<(), AppError> {
        self.store.set(SYSTEM_INSTRUCTION_KEY, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn defaults_when_nothing_stored() {
        let repo = SettingsRepository::new(Arc::new(MemoryStore::new()));
        let settings = repo.load().await.unwrap();
        assert_eq!(settings, SessionSettings::default());
        assert!(!settings.has_api_key());
    }

    #[tokio::test]
    async fn blank_instruction_falls_back_to_default() {
        let store = MemoryStore::with_entries([(API_KEY_KEY, "k-123"), (SYSTEM_INSTRUCTION_KEY, "  ")]);
        let settings = SettingsRepository::new(Arc::new(store)).load().await.unwrap();
        assert_eq!(settings.api_key, "k-123");
        assert_eq!(settings.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);
    }

    #[tokio::test]
    async fn saved_values_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let repo = SettingsRepository::new(store.clone());
        repo.save_api_key("secret").await.unwrap();
        repo.save_system_instruction("Answer in French.").await.unwrap();

        let settings = repo.load().await.unwrap();
        assert_eq!(settings.api_key, "secret");
        assert_eq!(settings.system_instruction, "Answer in French.");
        assert_eq!(store.write_log(), vec![API_KEY_KEY, SYSTEM_INSTRUCTION_KEY]);
    }
}
