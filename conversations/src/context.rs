//! [`StepContext`]: what a conversation step sees.

use std::future::Future;

use bot_api::ApiClient;
use bot_core::{ConversationError, Result, Update};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::state::ConversationState;

/// The update being handled, the API client, and the conversation's recorded state.
pub struct StepContext<'a> {
    api: ApiClient,
    update: &'a Update,
    step: usize,
    state: &'a mut ConversationState,
}

impl<'a> StepContext<'a> {
    pub fn new(
        api: ApiClient,
        update: &'a Update,
        step: usize,
        state: &'a mut ConversationState,
    ) -> Self {
        Self {
            api,
            update,
            step,
            state,
        }
    }

    pub fn update(&self) -> &Update {
        self.update
    }

    /// Chat the conversation runs in.
    pub fn chat_id(&self) -> Result<i64> {
        self.update
            .chat_id()
            .ok_or_else(|| ConversationError::NoChat(self.update.update_id).into())
    }

    /// Runs `action` at most once for (current step, `label`).
    ///
    /// The first run records the JSON-serialized result; later runs of the same step return the recorded
    /// value without calling `action`. Errors are not recorded.
    pub async fn external<T, F, Fut>(&mut self, label: &str, action: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(ApiClient) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
    {
        if let Some(value) = self.state.find_external(self.step, label) {
            debug!(
                conversation = %self.state.name,
                step = self.step,
                label,
                "Replaying recorded external action"
            );
            return serde_json::from_value(value.clone()).map_err(|source| {
                ConversationError::Replay {
                    step: self.step,
                    label: label.to_string(),
                    source,
                }
                .into()
            });
        }

        let result = action(self.api.clone()).await?;
        let value = serde_json::to_value(&result).map_err(|source| ConversationError::Replay {
            step: self.step,
            label: label.to_string(),
            source,
        })?;
        self.state.record_external(self.step, label, value);
        Ok(result)
    }

    /// Result recorded by an earlier step's external action.
    pub fn recall<T: DeserializeOwned>(&self, step: usize, label: &str) -> Result<Option<T>> {
        match self.state.find_external(step, label) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| {
                    ConversationError::Replay {
                        step,
                        label: label.to_string(),
                        source,
                    }
                    .into()
                }),
            None => Ok(None),
        }
    }
}
