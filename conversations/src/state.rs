//! Recorded state of one active conversation.

use bot_core::Update;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogEntry {
    /// An inbound update that entered or resumed the conversation.
    Update { step: usize, update: Update },
    /// Result of an external action, replayed instead of re-executed.
    External { step: usize, label: String, value: Value },
}

/// Conversation name, current step and the ordered log of updates and external action results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub name: String,
    pub step: usize,
    pub log: Vec<LogEntry>,
}

impl ConversationState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step: 0,
            log: Vec::new(),
        }
    }

    pub fn record_update(&mut self, update: Update) {
        self.log.push(LogEntry::Update {
            step: self.step,
            update,
        });
    }

    pub fn record_external(&mut self, step: usize, label: impl Into<String>, value: Value) {
        self.log.push(LogEntry::External {
            step,
            label: label.into(),
            value,
        });
    }

    /// Recorded result of the external action `label` at `step`.
    pub fn find_external(&self, step: usize, label: &str) -> Option<&Value> {
        self.log.iter().find_map(|entry| match entry {
            LogEntry::External {
                step: s,
                label: l,
                value,
            } if *s == step && l == label => Some(value),
            _ => None,
        })
    }

    /// Updates received so far, in arrival order.
    pub fn updates(&self) -> impl Iterator<Item = &Update> {
        self.log.iter().filter_map(|entry| match entry {
            LogEntry::Update { update, .. } => Some(update),
            LogEntry::External { .. } => None,
        })
    }

    /// Number of external actions recorded for `step`.
    pub fn external_count(&self, step: usize) -> usize {
        self.log
            .iter()
            .filter(|entry| matches!(entry, LogEntry::External { step: s, .. } if *s == step))
            .count()
    }
}
