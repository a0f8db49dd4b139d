use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::db::conversation_repository::ConversationRepository;
use crate::errors::AppError;
use crate::models::{Conversation, ConversationMatch, Message};

/// Ordered conversations plus the one the user is looking at.
///
/// Never empty, and `current` is always a valid position. Each conversation
/// sits behind an [`Arc`]: a mutation copies only the conversation it
/// touches, and every mutation writes the full list back through the
/// repository before it takes effect in memory.
pub struct ConversationStore {
    conversations: Vec<Arc<Conversation>>,
    current: usize,
    repo: ConversationRepository,
}

impl ConversationStore {
    /// Restores the stored list, seeding one empty conversation when there
    /// is nothing to restore.
    pub async fn hydrate(repo: ConversationRepository) -> Result<Self, AppError> {
        match repo.load().await? {
            Some(conversations) => {
                debug!("Restored {} conversations", conversations.len());
                Ok(Self {
                    conversations: conversations.into_iter().map(Arc::new).collect(),
                    current: 0,
                    repo,
                })
            }
            None => {
                let seeded = Conversation::new(Utc::now().timestamp_millis());
                let store = Self { conversations: vec![Arc::new(seeded)], current: 0, repo };
                store.persist().await?;
                Ok(store)
            }
        }
    }

    pub fn list(&self) -> &[Arc<Conversation>] {
        &self.conversations
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current(&self) -> &Arc<Conversation> {
        &self.conversations[self.current]
    }

    /// Where the conversation with `id` currently sits.
    pub fn position(&self, id: i64) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }

    pub async fn create(&mut self) -> Result<usize, AppError> {
        let mut candidate = self.conversations.clone();
        candidate.push(Arc::new(Conversation::new(self.next_id())));
        self.commit(candidate).await?;
        self.current = self.conversations.len() - 1;
        Ok(self.current)
    }

    pub fn switch_to(&mut self, index: usize) -> Result<(), AppError> {
        self.check(index)?;
        self.current = index;
        Ok(())
    }

    /// Appends to the conversation at `index`, whichever one is current.
    pub async fn append_message(&mut self, index: usize, message: Message) -> Result<(), AppError> {
        self.check(index)?;
        let mut candidate = self.conversations.clone();
        Arc::make_mut(&mut candidate[index]).messages.push(message);
        self.commit(candidate).await
    }

    /// Stale indices are ignored.
    pub async fn rename_title(&mut self, index: usize, title: impl Into<String>) -> Result<(), AppError> {
        if index >= self.conversations.len() {
            debug!("Ignoring rename of missing conversation at {index}");
            return Ok(());
        }
        let mut candidate = self.conversations.clone();
        Arc::make_mut(&mut candidate[index]).title = title.into();
        self.commit(candidate).await
    }

    /// Case-insensitive title filter; matches carry their position in [`Self::list`].
    pub fn search(&self, query: &str) -> Vec<ConversationMatch> {
        let needle = query.to_lowercase();
        self.conversations
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.title.is_empty() && c.title.to_lowercase().contains(&needle))
            .map(|(index, c)| ConversationMatch { index, id: c.id, title: c.title.clone() })
            .collect()
    }

    fn check(&self, index: usize) -> Result<(), AppError> {
        if index < self.conversations.len() {
            Ok(())
        } else {
            Err(AppError::OutOfRange { index, len: self.conversations.len() })
        }
    }

    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let max = self.conversations.iter().map(|c| c.id).max().unwrap_or(i64::MIN);
        now.max(max.saturating_add(1))
    }

    async fn persist(&self) -> Result<(), AppError> {
        self.repo.save_all(&self.conversations).await
    }

    /// Stores `candidate`, then adopts it; a failed write leaves `self` as it was.
    async fn commit(&mut self, candidate: Vec<Arc<Conversation>>) -> Result<(), AppError> {
        self.repo.save_all(&candidate).await?;
        self.conversations = candidate;
        Ok(())
    }
}
