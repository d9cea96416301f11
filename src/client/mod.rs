//! LLM client interface consumed by the executor.
//!
//! The wire protocol is the implementor's concern; the loop only needs one
//! request/response exchange per round.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::types::{AgentMessage, ToolSchema, Usage};

/// Per-request generation settings forwarded to the client untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerateOptions {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// One LLM reply: the assistant message and the usage it reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub message: AgentMessage,
    #[serde(default)]
    pub usage: Usage,
}

impl LlmResponse {
    pub fn new(message: AgentMessage, usage: Usage) -> Self {
        Self { message, usage }
    }

    /// Final text reply with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self::new(AgentMessage::assistant(content), Usage::default())
    }

    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = usage;
        self
    }

    pub fn wants_tool_use(&self) -> bool {
        self.message.has_tool_calls()
    }
}

/// Client for an LLM endpoint.
///
/// Errors returned from [`generate`](LlmClient::generate) are never swallowed by the
/// executor; transport failures should be reported as
/// [`Error::LlmTransport`](crate::Error::LlmTransport).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(
        &self,
        messages: &[AgentMessage],
        tools: &[ToolSchema],
        options: &GenerateOptions,
    ) -> Result<LlmResponse>;
}
