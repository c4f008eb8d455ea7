//! The [`Conversation`] trait.

use async_trait::async_trait;
use bot_core::Result;

use crate::context::StepContext;

/// What the runtime does after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Advance to the next step and wait for the next update.
    Next,
    /// Wait for the next update and run this step again; its recorded external actions are replayed.
    Stay,
    /// The conversation is finished; its state is removed.
    Done,
}

/// A multi-step handler expressed as a state machine over step indices.
///
/// Steps must be deterministic given the update and the recorded log: anything with side effects goes
/// through [`StepContext::external`].
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Name used to enter the conversation.
    fn name(&self) -> &str;

    /// Runs step `step` with the update in `cx`.
    async fn step(&self, step: usize, cx: &mut StepContext<'_>) -> Result<Transition>;
}
