//! Storage of active conversation state, keyed by chat id.

use std::collections::HashMap;

use async_trait::async_trait;
use bot_core::Result;
use tokio::sync::Mutex;

use crate::state::ConversationState;

/// Backing store for active conversations. At most one conversation is active per chat.
#[async_trait]
pub trait ConversationStorage: Send + Sync {
    async fn read(&self, chat_id: i64) -> Result<Option<ConversationState>>;
    async fn write(&self, chat_id: i64, state: ConversationState) -> Result<()>;
    async fn delete(&self, chat_id: i64) -> Result<()>;
}

/// In-process storage. State is lost on restart.
#[derive(Default)]
pub struct MemoryStorage {
    states: Mutex<HashMap<i64, ConversationState>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chats with an active conversation.
    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.states.lock().await.is_empty()
    }
}

#[async_trait]
impl ConversationStorage for MemoryStorage {
    async fn read(&self, chat_id: i64) -> Result<Option<ConversationState>> {
        Ok(self.states.lock().await.get(&chat_id).cloned())
    }

    async fn write(&self, chat_id: i64, state: ConversationState) -> Result<()> {
        self.states.lock().await.insert(chat_id, state);
        Ok(())
    }

    async fn delete(&self, chat_id: i64) -> Result<()> {
        self.states.lock().await.remove(&chat_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage_read_write_delete() {
        let storage = MemoryStorage::new();
        assert!(storage.read(1).await.unwrap().is_none());

        storage.write(1, ConversationState::new("a")).await.unwrap();
        storage.write(2, ConversationState::new("b")).await.unwrap();
        assert_eq!(storage.read(1).await.unwrap().unwrap().name, "a");
        assert_eq!(storage.len().await, 2);

        storage.delete(1).await.unwrap();
        assert!(storage.read(1).await.unwrap().is_none());
        assert_eq!(storage.len().await, 1);
    }
}
