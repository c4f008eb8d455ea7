//! One outgoing Bot API request.

use serde_json::Value;

/// Method name, JSON payload and 1-based attempt number.
///
/// Created once per logical call by [`crate::ApiClient`]; [`crate::AutoRetry`] derives the next attempt
/// with [`Request::next_attempt`] when it resubmits.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub payload: Value,
    pub attempt: u32,
}

impl Request {
    pub fn new(method: impl Into<String>, payload: Value) -> Self {
        Self {
            method: method.into(),
            payload,
            attempt: 1,
        }
    }

    /// Same method and payload, attempt number incremented.
    pub fn next_attempt(&self) -> Self {
        Self {
            method: self.method.clone(),
            payload: self.payload.clone(),
            attempt: self.attempt + 1,
        }
    }

    pub fn is_retry(&self) -> bool {
        self.attempt > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_next_attempt_keeps_payload() {
        let first = Request::new("sendMessage", json!({"chat_id": 1, "text": "hi"}));
        assert_eq!(first.attempt, 1);
        assert!(!first.is_retry());

        let second = first.next_attempt();
        assert_eq!(second.attempt, 2);
        assert_eq!(second.method, "sendMessage");
        assert_eq!(second.payload, first.payload);
        assert!(second.is_retry());
    }
}
