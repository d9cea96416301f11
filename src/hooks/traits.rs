//! Hook traits and types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::LlmResponse;
use crate::types::{AgentContext, AgentMessage, ToolCall, ToolResult, Usage};
use crate::{Error, Result};

/// Lifecycle point at which a hook ran or an error surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPhase {
    BeforeLlmCall,
    AfterLlmCall,
    BeforeToolCall,
    AfterToolCall,
    /// The LLM request itself
    LlmCall,
    /// A tool dispatch
    ToolCall,
    /// Run-level conditions such as the iteration limit
    Run,
}

impl HookPhase {
    /// Whether this phase is one of the observer callback points.
    pub fn is_callback(&self) -> bool {
        matches!(
            self,
            HookPhase::BeforeLlmCall
                | HookPhase::AfterLlmCall
                | HookPhase::BeforeToolCall
                | HookPhase::AfterToolCall
        )
    }
}

impl std::fmt::Display for HookPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookPhase::BeforeLlmCall => write!(f, "before_llm_call"),
            HookPhase::AfterLlmCall => write!(f, "after_llm_call"),
            HookPhase::BeforeToolCall => write!(f, "before_tool_call"),
            HookPhase::AfterToolCall => write!(f, "after_tool_call"),
            HookPhase::LlmCall => write!(f, "llm_call"),
            HookPhase::ToolCall => write!(f, "tool_call"),
            HookPhase::Run => write!(f, "run"),
        }
    }
}

/// Observer of the execution loop.
///
/// Every callback defaults to a no-op. A callback returning `Err` is a hook failure:
/// it is reported to the other observers' [`on_error`](ExecutorHooks::on_error) and
/// then isolated or propagated according to the run's error policy.
#[async_trait]
pub trait ExecutorHooks: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    async fn before_llm_call(&self, _ctx: &AgentContext, _messages: &[AgentMessage]) -> Result<()> {
        Ok(())
    }

    /// `usage` is the running total for the run, including this response.
    async fn after_llm_call(
        &self,
        _ctx: &AgentContext,
        _response: &LlmResponse,
        _usage: &Usage,
    ) -> Result<()> {
        Ok(())
    }

    async fn before_tool_call(
        &self,
        _ctx: &AgentContext,
        _name: &str,
        _arguments: &Value,
        _call_id: &str,
    ) -> Result<()> {
        Ok(())
    }

    async fn after_tool_call(&self, _ctx: &AgentContext, _result: &ToolResult) -> Result<()> {
        Ok(())
    }

    async fn on_error(&self, _ctx: &AgentContext, _error: &Error, _phase: HookPhase) {}
}

/// A callback invocation, carried by reference to every observer.
#[derive(Clone, Copy, Debug)]
pub enum HookEvent<'a> {
    BeforeLlmCall {
        messages: &'a [AgentMessage],
    },
    AfterLlmCall {
        response: &'a LlmResponse,
        usage: &'a Usage,
    },
    BeforeToolCall {
        call: &'a ToolCall,
    },
    AfterToolCall {
        result: &'a ToolResult,
    },
}

impl HookEvent<'_> {
    pub fn phase(&self) -> HookPhase {
        match self {
            HookEvent::BeforeLlmCall { .. } => HookPhase::BeforeLlmCall,
            HookEvent::AfterLlmCall { .. } => HookPhase::AfterLlmCall,
            HookEvent::BeforeToolCall { .. } => HookPhase::BeforeToolCall,
            HookEvent::AfterToolCall { .. } => HookPhase::AfterToolCall,
        }
    }

    /// Invoke the matching callback on `hook`.
    pub async fn deliver(&self, hook: &dyn ExecutorHooks, ctx: &AgentContext) -> Result<()> {
        match *self {
            HookEvent::BeforeLlmCall { messages } => hook.before_llm_call(ctx, messages).await,
            HookEvent::AfterLlmCall { response, usage } => {
                hook.after_llm_call(ctx, response, usage).await
            }
            HookEvent::BeforeToolCall { call } => {
                hook.before_tool_call(ctx, &call.name, &call.arguments, &call.id)
                    .await
            }
            HookEvent::AfterToolCall { result } => hook.after_tool_call(ctx, result).await,
        }
    }
}
