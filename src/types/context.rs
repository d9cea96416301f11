//! Per-invocation agent context.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::AgentMessage;

/// Input to one run of the execution loop.
///
/// Created once by the caller. The loop never mutates it; it works on a private copy
/// of `input_messages`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub run_id: Uuid,
    pub conversation_id: Uuid,
    pub input_messages: Vec<AgentMessage>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl AgentContext {
    /// New context with fresh run and conversation ids.
    pub fn new(input_messages: Vec<AgentMessage>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            input_messages,
            metadata: HashMap::new(),
        }
    }

    /// Context seeded with a single user message.
    pub fn from_user(prompt: impl Into<String>) -> Self {
        Self::new(vec![AgentMessage::user(prompt)])
    }

    pub fn with_conversation_id(mut self, id: Uuid) -> Self {
        self.conversation_id = id;
        self
    }

    pub fn with_run_id(mut self, id: Uuid) -> Self {
        self.run_id = id;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn metadata(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }
}
