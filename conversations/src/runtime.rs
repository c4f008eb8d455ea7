//! [`ConversationRuntime`]: enters, resumes and finishes conversations.

use std::collections::HashMap;
use std::sync::Arc;

use bot_api::ApiClient;
use bot_core::{ConversationError, Result, Update};
use tracing::{info, instrument, warn};

use crate::context::StepContext;
use crate::conversation::{Conversation, Transition};
use crate::state::ConversationState;
use crate::storage::{ConversationStorage, MemoryStorage};

/// Registered conversations plus the storage holding active ones.
#[derive(Clone)]
pub struct ConversationRuntime {
    conversations: HashMap<String, Arc<dyn Conversation>>,
    storage: Arc<dyn ConversationStorage>,
}

impl Default for ConversationRuntime {
    fn default() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }
}

impl ConversationRuntime {
    pub fn new(storage: Arc<dyn ConversationStorage>) -> Self {
        Self {
            conversations: HashMap::new(),
            storage,
        }
    }

    /// Registers a conversation under its [`Conversation::name`]. A later registration with the same name wins.
    pub fn register(mut self, conversation: Arc<dyn Conversation>) -> Self {
        self.conversations
            .insert(conversation.name().to_string(), conversation);
        self
    }

    /// Active conversation in `chat_id`, if any.
    pub async fn active(&self, chat_id: i64) -> Result<Option<ConversationState>> {
        self.storage.read(chat_id).await
    }

    /// Starts conversation `name` and runs step 0 with `update`. Replaces any conversation active in the chat.
    #[instrument(skip(self, update, api), fields(update_id = update.update_id))]
    pub async fn enter(&self, name: &str, update: &Update, api: &ApiClient) -> Result<()> {
        let conversation = self
            .conversations
            .get(name)
            .cloned()
            .ok_or_else(|| ConversationError::Unknown(name.to_string()))?;
        let chat_id = update
            .chat_id()
            .ok_or(ConversationError::NoChat(update.update_id))?;

        if let Some(previous) = self.storage.read(chat_id).await? {
            info!(
                chat_id,
                previous = %previous.name,
                "Replacing active conversation"
            );
        }
        info!(chat_id, conversation = %name, "Entering conversation");

        self.run_step(conversation, chat_id, ConversationState::new(name), update, api)
            .await
    }

    /// Resumes the conversation active in the update's chat. Returns false when there is none.
    #[instrument(skip(self, update, api), fields(update_id = update.update_id))]
    pub async fn resume(&self, update: &Update, api: &ApiClient) -> Result<bool> {
        let Some(chat_id) = update.chat_id() else {
            return Ok(false);
        };
        let Some(state) = self.storage.read(chat_id).await? else {
            return Ok(false);
        };
        let Some(conversation) = self.conversations.get(&state.name).cloned() else {
            warn!(
                chat_id,
                conversation = %state.name,
                "Active conversation is not registered, dropping its state"
            );
            self.storage.delete(chat_id).await?;
            return Ok(false);
        };

        info!(chat_id, conversation = %state.name, step = state.step, "Resuming conversation");
        self.run_step(conversation, chat_id, state, update, api).await?;
        Ok(true)
    }

    /// Records the update, runs the current step and stores, advances or removes the state.
    async fn run_step(
        &self,
        conversation: Arc<dyn Conversation>,
        chat_id: i64,
        mut state: ConversationState,
        update: &Update,
        api: &ApiClient,
    ) -> Result<()> {
        state.record_update(update.clone());
        let step = state.step;

        let outcome = {
            let mut cx = StepContext::new(api.clone(), update, step, &mut state);
            conversation.step(step, &mut cx).await
        };

        match outcome {
            Ok(Transition::Next) => {
                state.step += 1;
                self.storage.write(chat_id, state).await
            }
            Ok(Transition::Stay) => self.storage.write(chat_id, state).await,
            Ok(Transition::Done) => {
                info!(chat_id, conversation = %state.name, steps = step + 1, "Conversation finished");
                self.storage.delete(chat_id).await
            }
            Err(e) => {
                warn!(
                    chat_id,
                    conversation = %state.name,
                    step,
                    error = %e,
                    "Conversation step failed, leaving conversation"
                );
                self.storage.delete(chat_id).await?;
                Err(e)
            }
        }
    }
}
