//! The loop driver.

use std::sync::Arc;

use super::LlmExecutorConfig;
use crate::client::LlmClient;
use crate::hooks::{CompositeHooks, ExecutorHooks};
use crate::tools::ToolExecutor;

/// Drives a conversation turn: LLM call, tool dispatch, repeat.
///
/// The executor holds no per-run state, so one instance can serve any number of
/// concurrent [`run`](LlmExecutor::run) calls.
#[derive(Clone)]
pub struct LlmExecutor {
    pub(super) client: Arc<dyn LlmClient>,
    pub(super) tools: Arc<dyn ToolExecutor>,
    pub(super) hooks: CompositeHooks,
    pub(super) config: LlmExecutorConfig,
}

/// Alias kept for callers of the older name.
pub type Executor = LlmExecutor;

impl LlmExecutor {
    pub fn new(client: Arc<dyn LlmClient>, tools: Arc<dyn ToolExecutor>) -> Self {
        Self {
            client,
            tools,
            hooks: CompositeHooks::new(),
            config: LlmExecutorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LlmExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hooks(mut self, hooks: CompositeHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Append one observer to the composite.
    pub fn with_hook<H: ExecutorHooks + 'static>(mut self, hook: H) -> Self {
        self.hooks.register(hook);
        self
    }

    pub fn config(&self) -> &LlmExecutorConfig {
        &self.config
    }

    pub fn hooks(&self) -> &CompositeHooks {
        &self.hooks
    }

    pub fn tools(&self) -> &Arc<dyn ToolExecutor> {
        &self.tools
    }
}

impl std::fmt::Debug for LlmExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmExecutor")
            .field("tools", &self.tools.schemas().len())
            .field("hooks", &self.hooks)
            .field("config", &self.config)
            .finish()
    }
}
