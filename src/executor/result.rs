//! Outcome of a run.

use uuid::Uuid;

use crate::types::{AgentMessage, Role, ToolResult, Usage};
use crate::{Error, Result};

/// Everything a finished run produced.
#[derive(Debug)]
pub struct ExecutionResult {
    pub run_id: Uuid,
    pub conversation_id: Uuid,
    /// Seed messages followed by every message the run appended.
    pub messages: Vec<AgentMessage>,
    /// LLM round-trips performed.
    pub iterations: usize,
    pub usage: Usage,
    /// Content of the terminal assistant message. `None` when the run stopped early.
    pub final_content: Option<String>,
    /// Set when the run ended abnormally and the failure was reported instead of raised.
    pub error: Option<Error>,
    pub(crate) seed_len: usize,
    pub(crate) tool_results: Vec<ToolResult>,
}

impl ExecutionResult {
    /// Messages appended during this run, excluding the seed.
    pub fn new_messages(&self) -> &[AgentMessage] {
        self.messages.get(self.seed_len..).unwrap_or_default()
    }

    /// Every tool outcome of the run, in conversation order.
    pub fn tool_results(&self) -> &[ToolResult] {
        &self.tool_results
    }

    pub fn failed_tool_results(&self) -> impl Iterator<Item = &ToolResult> {
        self.tool_results.iter().filter(|r| r.is_error())
    }

    pub fn last_assistant(&self) -> Option<&AgentMessage> {
        self.messages.iter().rev().find(|m| m.role == Role::Assistant)
    }

    /// The run reached a final answer.
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.final_content.is_some()
    }

    /// Turn a reported failure into an error.
    pub fn into_result(mut self) -> Result<Self> {
        match self.error.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}
