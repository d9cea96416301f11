//! Loop configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::GenerateOptions;
use crate::config::{ConfigError, ConfigResult};

pub const DEFAULT_MAX_ITERATIONS: usize = 10;
pub const DEFAULT_TOOL_CONCURRENCY: usize = 8;

/// What a hook failure does to a run that is not swallowing failures.
///
/// Runs that swallow failures always isolate hook failures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Raise the failure and end the run.
    #[default]
    Abort,
    /// Report the failure to the other hooks and keep going.
    Continue,
}

/// Configuration for [`LlmExecutor`](super::LlmExecutor).
#[derive(Debug, Clone, PartialEq)]
pub struct LlmExecutorConfig {
    /// LLM calls allowed per run before the iteration limit trips.
    pub max_iterations: usize,
    /// Tool calls from one response dispatched at the same time.
    pub tool_concurrency_limit: usize,
    /// Overrides both the tool executor's setting and the process-wide one.
    pub swallow_tool_exceptions: Option<bool>,
    pub hook_failure_policy: HookFailurePolicy,
    pub llm_timeout: Option<Duration>,
    pub tool_timeout: Option<Duration>,
    pub options: GenerateOptions,
}

impl Default for LlmExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_concurrency_limit: DEFAULT_TOOL_CONCURRENCY,
            swallow_tool_exceptions: None,
            hook_failure_policy: HookFailurePolicy::default(),
            llm_timeout: None,
            tool_timeout: None,
            options: GenerateOptions::default(),
        }
    }
}

impl LlmExecutorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tool_concurrency_limit(mut self, limit: usize) -> Self {
        self.tool_concurrency_limit = limit;
        self
    }

    pub fn with_swallow_tool_exceptions(mut self, swallow: bool) -> Self {
        self.swallow_tool_exceptions = Some(swallow);
        self
    }

    pub fn with_hook_failure_policy(mut self, policy: HookFailurePolicy) -> Self {
        self.hook_failure_policy = policy;
        self
    }

    pub fn with_llm_timeout(mut self, timeout: Duration) -> Self {
        self.llm_timeout = Some(timeout);
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = Some(timeout);
        self
    }

    pub fn with_options(mut self, options: GenerateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_iterations == 0 {
            return Err(ConfigError::invalid_value(
                "max_iterations",
                "must be at least 1",
            ));
        }
        if self.tool_concurrency_limit == 0 {
            return Err(ConfigError::invalid_value(
                "tool_concurrency_limit",
                "must be at least 1",
            ));
        }
        for (key, timeout) in [
            ("llm_timeout", self.llm_timeout),
            ("tool_timeout", self.tool_timeout),
        ] {
            if timeout.is_some_and(|t| t.is_zero()) {
                return Err(ConfigError::invalid_value(key, "must be greater than zero"));
            }
        }
        Ok(())
    }
}
