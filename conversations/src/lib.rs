//! # conversations
//!
//! Conversations that span several updates. A [`Conversation`] is a state machine over step indices: each
//! step runs with the update that resumed it and returns a [`Transition`]. Outbound calls inside a step go
//! through [`StepContext::external`], which records the result in the [`ConversationState`] log and replays
//! it if the step runs again, so an action is executed at most once per (step, label).
//!
//! [`ConversationRuntime`] enters, resumes and finishes conversations; state lives in a
//! [`ConversationStorage`] keyed by chat id.

mod context;
mod conversation;
mod runtime;
mod state;
mod storage;

pub use context::StepContext;
pub use conversation::{Conversation, Transition};
pub use runtime::ConversationRuntime;
pub use state::{ConversationState, LogEntry};
pub use storage::{ConversationStorage, MemoryStorage};
