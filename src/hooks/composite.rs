//! Fan-out over multiple hook observers.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{ExecutorHooks, HookEvent, HookPhase};
use crate::client::LlmResponse;
use crate::types::{AgentContext, AgentMessage, ToolCall, ToolResult, Usage};
use crate::{Error, Result};

/// Ordered set of [`ExecutorHooks`], each callback delivered to every member in
/// registration order.
#[derive(Clone, Default)]
pub struct CompositeHooks {
    hooks: Vec<Arc<dyn ExecutorHooks>>,
}

impl CompositeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<H: ExecutorHooks + 'static>(mut self, hook: H) -> Self {
        self.register(hook);
        self
    }

    pub fn register<H: ExecutorHooks + 'static>(&mut self, hook: H) {
        self.hooks.push(Arc::new(hook));
    }

    pub fn register_arc(&mut self, hook: Arc<dyn ExecutorHooks>) {
        self.hooks.push(hook);
    }

    pub fn unregister(&mut self, name: &str) {
        self.hooks.retain(|h| h.name() != name);
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn has_hook(&self, name: &str) -> bool {
        self.hooks.iter().any(|h| h.name() == name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Deliver `event` to every member.
    ///
    /// A failing member is reported to the others' `on_error`. With `isolate` set the
    /// remaining members still receive the event and `Ok` is returned; otherwise the
    /// first failure is returned as [`Error::HookFailed`].
    pub async fn emit(
        &self,
        ctx: &AgentContext,
        event: HookEvent<'_>,
        isolate: bool,
    ) -> Result<()> {
        let phase = event.phase();

        for (index, hook) in self.hooks.iter().enumerate() {
            let Err(e) = event.deliver(hook.as_ref(), ctx).await else {
                continue;
            };

            let error = match e {
                Error::HookFailed { .. } => e,
                other => Error::hook_failed(hook.name(), phase, other.to_string()),
            };
            tracing::warn!(
                hook = hook.name(),
                phase = %phase,
                run_id = %ctx.run_id,
                error = %error,
                "Hook execution failed"
            );
            self.report(ctx, &error, phase, Some(index)).await;

            if !isolate {
                return Err(error);
            }
        }
        Ok(())
    }

    /// Deliver `on_error` to every member.
    pub async fn notify_error(&self, ctx: &AgentContext, error: &Error, phase: HookPhase) {
        self.report(ctx, error, phase, None).await;
    }

    async fn report(
        &self,
        ctx: &AgentContext,
        error: &Error,
        phase: HookPhase,
        skip: Option<usize>,
    ) {
        for (index, hook) in self.hooks.iter().enumerate() {
            if Some(index) == skip {
                continue;
            }
            hook.on_error(ctx, error, phase).await;
        }
    }
}

impl std::fmt::Debug for CompositeHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeHooks")
            .field("hooks", &self.hook_names())
            .finish()
    }
}

impl FromIterator<Arc<dyn ExecutorHooks>> for CompositeHooks {
    fn from_iter<I: IntoIterator<Item = Arc<dyn ExecutorHooks>>>(iter: I) -> Self {
        Self {
            hooks: iter.into_iter().collect(),
        }
    }
}

/// Nesting a composite propagates the first member failure to the outer one.
#[async_trait]
impl ExecutorHooks for CompositeHooks {
    fn name(&self) -> &str {
        "composite"
    }

    async fn before_llm_call(&self, ctx: &AgentContext, messages: &[AgentMessage]) -> Result<()> {
        self.emit(ctx, HookEvent::BeforeLlmCall { messages }, false)
            .await
    }

    async fn after_llm_call(
        &self,
        ctx: &AgentContext,
        response: &LlmResponse,
        usage: &Usage,
    ) -> Result<()> {
        self.emit(ctx, HookEvent::AfterLlmCall { response, usage }, false)
            .await
    }

    async fn before_tool_call(
        &self,
        ctx: &AgentContext,
        name: &str,
        arguments: &Value,
        call_id: &str,
    ) -> Result<()> {
        let call = ToolCall::new(call_id, name, arguments.clone());
        self.emit(ctx, HookEvent::BeforeToolCall { call: &call }, false)
            .await
    }

    async fn after_tool_call(&self, ctx: &AgentContext, result: &ToolResult) -> Result<()> {
        self.emit(ctx, HookEvent::AfterToolCall { result }, false)
            .await
    }

    async fn on_error(&self, ctx: &AgentContext, error: &Error, phase: HookPhase) {
        self.notify_error(ctx, error, phase).await;
    }
}
