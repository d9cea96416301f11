//! Tool executor capability.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config;
use crate::types::{ToolCall, ToolError, ToolResult, ToolSchema};

/// Uniform dispatch of a named tool call to its handler.
///
/// Implementors provide [`dispatch`](ToolExecutor::dispatch); the provided methods turn
/// its raw outcome into a [`ToolResult`] or, when failures are not swallowed, an error.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Schemas advertised to the LLM, in registration order.
    fn schemas(&self) -> Vec<ToolSchema>;

    /// Swallow setting pinned on this executor. `None` defers to the caller or the
    /// process-wide configuration.
    fn swallow_override(&self) -> Option<bool> {
        None
    }

    /// Run the handler registered under `name`.
    async fn dispatch(&self, name: &str, arguments: Map<String, Value>)
    -> Result<Value, ToolError>;

    fn has_tool(&self, name: &str) -> bool {
        self.schemas().iter().any(|s| s.name == name)
    }

    /// Execute `call` under an explicit swallow policy.
    async fn execute_with(&self, call: &ToolCall, swallow: bool) -> crate::Result<ToolResult> {
        let outcome = match call.arguments_object() {
            Ok(arguments) => self.dispatch(&call.name, arguments).await,
            Err(e) => Err(e),
        };
        settle(call, outcome, swallow)
    }

    /// Execute `call`, swallowing failures according to this executor's override or
    /// the process-wide configuration read now.
    async fn execute(&self, call: &ToolCall) -> crate::Result<ToolResult> {
        let swallow = self
            .swallow_override()
            .unwrap_or_else(config::should_swallow_exceptions);
        self.execute_with(call, swallow).await
    }

    /// Execute a tool by name outside of an LLM exchange. A call id is generated.
    async fn invoke(&self, name: &str, arguments: Value) -> crate::Result<ToolResult> {
        let call = ToolCall::new(generate_call_id(), name, arguments);
        self.execute(&call).await
    }
}

/// Map a raw dispatch outcome onto the tool/loop boundary.
///
/// Failures become `failure` results when `swallow` is set and errors otherwise.
pub fn settle(
    call: &ToolCall,
    outcome: Result<Value, ToolError>,
    swallow: bool,
) -> crate::Result<ToolResult> {
    match outcome {
        Ok(value) => Ok(ToolResult::success(&call.name, &call.id, value)),
        Err(error) if swallow => {
            tracing::warn!(
                tool = %call.name,
                call_id = %call.id,
                error = %error,
                "Tool call failed, reporting to LLM"
            );
            Ok(ToolResult::from_error(&call.name, &call.id, &error))
        }
        Err(error) => Err(crate::Error::from_tool_error(&call.name, &call.id, error)),
    }
}

/// Deserialize named arguments into a handler's parameter type.
pub fn parse_arguments<A: DeserializeOwned>(
    tool: &str,
    arguments: Map<String, Value>,
) -> Result<A, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(tool, e.to_string()))
}

pub(crate) fn generate_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}
