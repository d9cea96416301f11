//! # agent-runtime
//!
//! Execution core for journey-based conversational agents.
//!
//! The [`LlmExecutor`] drives a conversation turn: it calls the LLM, dispatches the
//! tool calls it requests through a [`ToolExecutor`], feeds the replies back and stops
//! on a final answer, the iteration limit, or an error. Observers attach through
//! [`ExecutorHooks`], fanned out by [`CompositeHooks`]. Whether tool failures are
//! reported to the LLM or raised to the caller follows [`FrameworkConfig`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agent_runtime::{
//!     AgentContext, CallableToolExecutor, LlmClient, LlmExecutor, ToolError, ToolParameter,
//!     ToolSchema,
//! };
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Divide {
//!     a: f64,
//!     b: f64,
//! }
//!
//! # async fn example(client: Arc<dyn LlmClient>) -> agent_runtime::Result<()> {
//! let tools = CallableToolExecutor::builder()
//!     .sync_tool(
//!         ToolSchema::new("divide", "Divide two numbers")
//!             .parameter(ToolParameter::required("a", "number", "Dividend"))
//!             .parameter(ToolParameter::required("b", "number", "Divisor")),
//!         |args: Divide| {
//!             if args.b == 0.0 {
//!                 return Err(ToolError::execution_failed("division by zero"));
//!             }
//!             Ok(format!("Result: {:?}", args.a / args.b))
//!         },
//!     )
//!     .build();
//!
//! let executor = LlmExecutor::new(client, Arc::new(tools));
//! let result = executor.run(&AgentContext::from_user("divide 10 by 2")).await?;
//! println!("{:?}", result.final_content);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod client;
pub mod config;
pub mod executor;
pub mod hooks;
pub mod observability;
pub mod tools;
pub mod types;

// Re-exports for convenience
pub use client::{GenerateOptions, LlmClient, LlmResponse};
pub use config::{ConfigError, ConfigUpdate, FrameworkConfig, LogLevel};
pub use executor::{
    ExecutionResult, Executor, ExecutorConfig, HookFailurePolicy, LlmExecutor, LlmExecutorConfig,
};
pub use hooks::{CompositeHooks, ExecutorHooks, HookPhase, LoggingHooks};
pub use tools::{
    CallableToolExecutor, CallableToolExecutorBuilder, MethodToolExecutor, StateChangeSink,
    StatefulTools, ToolExecutor,
};
pub use types::{
    AgentContext, AgentMessage, Role, ToolCall, ToolError, ToolErrorKind, ToolOutcome,
    ToolParameter, ToolResult, ToolSchema, Usage,
};

/// Error type for agent-runtime operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A tool call named a tool with no registered handler.
    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    /// A tool handler failed.
    #[error("Tool '{tool}' failed (call {call_id}): {source}")]
    ToolExecution {
        tool: String,
        call_id: String,
        #[source]
        source: ToolError,
    },

    /// The LLM call itself failed. Never swallowed.
    #[error("LLM transport failed: {message}")]
    LlmTransport { message: String },

    /// The LLM call exceeded its configured timeout.
    #[error("LLM call timed out after {:.1}s", .0.as_secs_f64())]
    LlmTimeout(std::time::Duration),

    /// The loop hit `max_iterations` without a final answer.
    #[error("Iteration limit exceeded: no final answer after {max_iterations} LLM calls")]
    IterationLimitExceeded { max_iterations: usize },

    /// An observer callback failed.
    #[error("Hook '{hook}' failed during {phase}: {message}")]
    HookFailed {
        hook: String,
        phase: HookPhase,
        message: String,
    },

    /// The run was cancelled by the caller.
    #[error("Run cancelled")]
    Cancelled,

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn llm_transport(message: impl Into<String>) -> Self {
        Error::LlmTransport {
            message: message.into(),
        }
    }

    pub fn hook_failed(
        hook: impl Into<String>,
        phase: HookPhase,
        message: impl Into<String>,
    ) -> Self {
        Error::HookFailed {
            hook: hook.into(),
            phase,
            message: message.into(),
        }
    }

    /// Convert a tool-layer failure into the error raised in debug mode.
    pub fn from_tool_error(
        tool: impl Into<String>,
        call_id: impl Into<String>,
        error: ToolError,
    ) -> Self {
        match error {
            ToolError::NotFound { name } => Error::ToolNotFound { name },
            source => Error::ToolExecution {
                tool: tool.into(),
                call_id: call_id.into(),
                source,
            },
        }
    }

    /// Lifecycle phase reported to `on_error` for this error.
    pub fn phase(&self) -> HookPhase {
        match self {
            Error::ToolNotFound { .. } | Error::ToolExecution { .. } => HookPhase::ToolCall,
            Error::LlmTransport { .. } | Error::LlmTimeout(_) => HookPhase::LlmCall,
            Error::HookFailed { phase, .. } => *phase,
            Error::IterationLimitExceeded { .. }
            | Error::Cancelled
            | Error::Config(_)
            | Error::Json(_) => HookPhase::Run,
        }
    }

    pub fn is_tool_error(&self) -> bool {
        matches!(self, Error::ToolNotFound { .. } | Error::ToolExecution { .. })
    }

    pub fn is_llm_error(&self) -> bool {
        matches!(self, Error::LlmTransport { .. } | Error::LlmTimeout(_))
    }

    pub fn is_hook_error(&self) -> bool {
        matches!(self, Error::HookFailed { .. })
    }

    pub fn is_iteration_limit(&self) -> bool {
        matches!(self, Error::IterationLimitExceeded { .. })
    }

    /// The underlying tool error, if this is a tool failure.
    pub fn tool_error(&self) -> Option<&ToolError> {
        match self {
            Error::ToolExecution { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
