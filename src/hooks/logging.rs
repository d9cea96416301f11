//! Hook that logs every lifecycle event through `tracing`.

use async_trait::async_trait;
use serde_json::Value;

use super::{ExecutorHooks, HookPhase};
use crate::client::LlmResponse;
use crate::types::{AgentContext, AgentMessage, ToolResult, Usage};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks {
    log_arguments: bool,
}

impl LoggingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include tool arguments in `before_tool_call` records.
    pub fn with_arguments(mut self) -> Self {
        self.log_arguments = true;
        self
    }
}

#[async_trait]
impl ExecutorHooks for LoggingHooks {
    fn name(&self) -> &str {
        "logging"
    }

    async fn before_llm_call(&self, ctx: &AgentContext, messages: &[AgentMessage]) -> Result<()> {
        tracing::debug!(
            run_id = %ctx.run_id,
            message_count = messages.len(),
            "Calling LLM"
        );
        Ok(())
    }

    async fn after_llm_call(
        &self,
        ctx: &AgentContext,
        response: &LlmResponse,
        usage: &Usage,
    ) -> Result<()> {
        tracing::info!(
            run_id = %ctx.run_id,
            tool_calls = response.message.tool_calls.len(),
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            total_tokens = usage.total_tokens(),
            "LLM responded"
        );
        Ok(())
    }

    async fn before_tool_call(
        &self,
        ctx: &AgentContext,
        name: &str,
        arguments: &Value,
        call_id: &str,
    ) -> Result<()> {
        if self.log_arguments {
            tracing::debug!(run_id = %ctx.run_id, tool = name, call_id, %arguments, "Calling tool");
        } else {
            tracing::debug!(run_id = %ctx.run_id, tool = name, call_id, "Calling tool");
        }
        Ok(())
    }

    async fn after_tool_call(&self, ctx: &AgentContext, result: &ToolResult) -> Result<()> {
        match result.error_message() {
            None => tracing::debug!(
                run_id = %ctx.run_id,
                tool = %result.tool_name,
                call_id = %result.call_id,
                "Tool succeeded"
            ),
            Some(message) => tracing::warn!(
                run_id = %ctx.run_id,
                tool = %result.tool_name,
                call_id = %result.call_id,
                error = message,
                "Tool failed"
            ),
        }
        Ok(())
    }

    async fn on_error(&self, ctx: &AgentContext, error: &Error, phase: HookPhase) {
        tracing::error!(run_id = %ctx.run_id, phase = %phase, error = %error, "Execution error");
    }
}
