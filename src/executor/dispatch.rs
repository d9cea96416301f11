//! Bounded-parallel dispatch of one response's tool calls.

use std::time::{Duration, Instant};

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{Instrument, debug};

use crate::hooks::{CompositeHooks, HookEvent, HookPhase};
use crate::observability::SpanContext;
use crate::tools::{ToolExecutor, settle};
use crate::types::{AgentContext, ToolCall, ToolError, ToolResult};
use crate::{Error, Result};

/// Policy resolved once at the start of a run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunPolicy {
    pub swallow: bool,
    pub isolate_hooks: bool,
    pub concurrency: usize,
    pub tool_timeout: Option<Duration>,
}

pub(crate) struct ToolDispatcher<'a> {
    pub tools: &'a dyn ToolExecutor,
    pub hooks: &'a CompositeHooks,
    pub ctx: &'a AgentContext,
    pub spans: SpanContext,
    pub policy: RunPolicy,
}

impl ToolDispatcher<'_> {
    /// Run every call, at most `concurrency` at a time, and return the results in
    /// request order. An unswallowed failure cancels the calls still in flight.
    pub async fn dispatch(&self, calls: &[ToolCall]) -> Result<Vec<ToolResult>> {
        let mut completed: Vec<(usize, ToolResult)> = stream::iter(calls.iter().enumerate())
            .map(|(index, call)| self.run_call(index, call))
            .buffer_unordered(self.policy.concurrency.max(1))
            .try_collect()
            .await?;

        completed.sort_by_key(|(index, _)| *index);
        Ok(completed.into_iter().map(|(_, result)| result).collect())
    }

    async fn run_call(&self, index: usize, call: &ToolCall) -> Result<(usize, ToolResult)> {
        self.hooks
            .emit(
                self.ctx,
                HookEvent::BeforeToolCall { call },
                self.policy.isolate_hooks,
            )
            .await?;

        let span = self.spans.tool_span(&call.name, &call.id);
        let start = Instant::now();
        let outcome = self.invoke(call).instrument(span.clone()).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let is_error = outcome.is_err();
        span.record("is_error", is_error);
        span.record("duration_ms", duration_ms);
        debug!(
            tool = %call.name,
            call_id = %call.id,
            duration_ms,
            is_error,
            "Tool execution completed"
        );

        if let Err(e) = &outcome {
            let error = Error::from_tool_error(&call.name, &call.id, e.clone());
            self.hooks
                .notify_error(self.ctx, &error, HookPhase::ToolCall)
                .await;
        }

        let result = settle(call, outcome, self.policy.swallow)?;

        self.hooks
            .emit(
                self.ctx,
                HookEvent::AfterToolCall { result: &result },
                self.policy.isolate_hooks,
            )
            .await?;

        Ok((index, result))
    }

    async fn invoke(&self, call: &ToolCall) -> std::result::Result<serde_json::Value, ToolError> {
        let arguments = call.arguments_object()?;
        let request = self.tools.dispatch(&call.name, arguments);

        match self.policy.tool_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or_else(|_| Err(ToolError::timeout(limit.as_millis() as u64))),
            None => request.await,
        }
    }
}
