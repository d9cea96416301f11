//! Tool execution outcome types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ToolError, ToolErrorKind};
use crate::types::AgentMessage;

/// Tagged outcome of one tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: Value },
    Failure { kind: ToolErrorKind, message: String },
}

/// Result of one tool invocation, correlated to its request by `call_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub tool_name: String,
    pub call_id: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    pub fn success(tool_name: impl Into<String>, call_id: impl Into<String>, value: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            outcome: ToolOutcome::Success { value },
        }
    }

    pub fn failure(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        kind: ToolErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            call_id: call_id.into(),
            outcome: ToolOutcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn from_error(
        tool_name: impl Into<String>,
        call_id: impl Into<String>,
        error: &ToolError,
    ) -> Self {
        Self::failure(tool_name, call_id, error.kind(), error.to_string())
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            ToolOutcome::Success { value } => Some(value),
            ToolOutcome::Failure { .. } => None,
        }
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        match &self.outcome {
            ToolOutcome::Failure { kind, .. } => Some(*kind),
            ToolOutcome::Success { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            ToolOutcome::Failure { message, .. } => Some(message),
            ToolOutcome::Success { .. } => None,
        }
    }

    /// Text sent back to the LLM in the tool-role reply.
    ///
    /// String values are passed through unquoted; other values are JSON-encoded.
    pub fn content(&self) -> String {
        match &self.outcome {
            ToolOutcome::Success { value: Value::String(s) } => s.clone(),
            ToolOutcome::Success { value: Value::Null } => String::new(),
            ToolOutcome::Success { value } => value.to_string(),
            ToolOutcome::Failure { message, .. } => format!("Error: {}", message),
        }
    }

    pub fn to_message(&self) -> AgentMessage {
        AgentMessage::tool(&self.call_id, self.content())
    }
}
