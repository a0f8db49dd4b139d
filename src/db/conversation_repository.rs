use std::sync::Arc;

use tracing::{error, warn};

use crate::db::{KeyValueStore, CONVERSATIONS_KEY};
use crate::errors::AppError;
use crate::models::Conversation;

/// Reads and writes the whole conversation list as one JSON document.
#[derive(Clone)]
pub struct ConversationRepository {
    store: Arc<dyn KeyValueStore>,
}

impl ConversationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns `None` when nothing usable is stored yet.
    pub async fn load(&self) -> Result<Option<Vec<Conversation>>, AppError> {
        let Some(raw) = self.store.get(CONVERSATIONS_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Vec<Conversation>>(&raw) {
            Ok(conversations) if conversations.is_empty() => Ok(None),
            Ok(conversations) => Ok(Some(conversations)),
            Err(e) => {
                warn!("Discarding unreadable stored conversations: {e}");
                Ok(None)
            }
        }
    }

    pub async fn save_all(&self, conversations: &[Arc<Conversation>]) -> Result<(), AppError> {
        let json = serde_json::to_string(conversations).map_err(|e| {
            error!("Failed to serialize conversations: {e}");
            AppError::serialization(CONVERSATIONS_KEY, e)
        })?;
        self.store.set(CONVERSATIONS_KEY, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::Message;

    #[tokio::test]
    async fn missing_or_empty_or_garbage_loads_as_none() {
        for stored in [None, Some("[]"), Some("{not json")] {
            let store = match stored {
                Some(raw) => MemoryStore::with_entries([(CONVERSATIONS_KEY, raw)]),
                None => MemoryStore::new(),
            };
            let repo = ConversationRepository::new(Arc::new(store));
            assert!(repo.load().await.unwrap().is_none(), "stored: {stored:?}");
        }
    }

    #[tokio::test]
    async fn save_then_load_keeps_order_and_messages() {
        let repo = ConversationRepository::new(Arc::new(MemoryStore::new()));
        let mut first = Conversation::new(1);
        first.messages.push(Message::user("Hello"));
        let second = Conversation::new(2);

        repo.save_all(&[Arc::new(first.clone()), Arc::new(second.clone())])
            .await
            .unwrap();

        assert_eq!(repo.load().await.unwrap(), Some(vec![first, second]));
    }
}
