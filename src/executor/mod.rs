//! LLM execution loop.
//!
//! [`LlmExecutor::run`] repeatedly calls the LLM with the working message sequence,
//! dispatches the tool calls it requests (bounded parallelism, results kept in request
//! order), appends the replies and calls the LLM again until it answers without tool
//! calls or `max_iterations` is reached.
//!
//! Failure handling is resolved once per run from, in order of precedence,
//! [`LlmExecutorConfig::swallow_tool_exceptions`], the tool executor's own setting and
//! the process-wide [`FrameworkConfig`](crate::FrameworkConfig).

mod config;
mod dispatch;
mod execution;
mod result;
mod runner;

#[cfg(test)]
mod tests;

pub use config::{
    DEFAULT_MAX_ITERATIONS, DEFAULT_TOOL_CONCURRENCY, HookFailurePolicy, LlmExecutorConfig,
};
pub use result::ExecutionResult;
pub use runner::{Executor, LlmExecutor};

/// Alias kept for callers of the older name.
pub type ExecutorConfig = LlmExecutorConfig;
