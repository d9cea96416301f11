//! The execution loop.

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

use super::dispatch::{RunPolicy, ToolDispatcher};
use super::{ExecutionResult, HookFailurePolicy, LlmExecutor};
use crate::client::LlmResponse;
use crate::config;
use crate::hooks::{HookEvent, HookPhase};
use crate::observability::SpanContext;
use crate::tools::generate_call_id;
use crate::types::{AgentContext, AgentMessage, ToolSchema, Usage};
use crate::{Error, Result};

impl LlmExecutor {
    /// Run one conversation turn to completion.
    ///
    /// Returns `Err` for LLM failures, and for tool failures, hook failures and the
    /// iteration limit when the run is not swallowing failures. Otherwise those are
    /// folded into the result.
    pub async fn run(&self, ctx: &AgentContext) -> Result<ExecutionResult> {
        let spans = SpanContext::from_context(ctx);
        let span = spans.run_span(self.config.max_iterations);
        let result = self.run_inner(ctx, spans).instrument(span.clone()).await;
        if let Ok(finished) = &result {
            span.record("iterations", finished.iterations as u64);
        }
        result
    }

    /// [`run`](Self::run), abandoned as soon as `token` is cancelled.
    ///
    /// In-flight LLM and tool calls are dropped and their results discarded.
    pub async fn run_with_cancellation(
        &self,
        ctx: &AgentContext,
        token: CancellationToken,
    ) -> Result<ExecutionResult> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                warn!(run_id = %ctx.run_id, "Run cancelled");
                let error = Error::Cancelled;
                self.hooks.notify_error(ctx, &error, HookPhase::Run).await;
                Err(error)
            }
            result = self.run(ctx) => result,
        }
    }

    fn resolve_policy(&self) -> RunPolicy {
        let swallow = self
            .config
            .swallow_tool_exceptions
            .or_else(|| self.tools.swallow_override())
            .unwrap_or_else(|| config::get_config().swallow_tool_exceptions);

        RunPolicy {
            swallow,
            isolate_hooks: swallow
                || self.config.hook_failure_policy == HookFailurePolicy::Continue,
            concurrency: self.config.tool_concurrency_limit,
            tool_timeout: self.config.tool_timeout,
        }
    }

    async fn run_inner(&self, ctx: &AgentContext, spans: SpanContext) -> Result<ExecutionResult> {
        self.config.validate()?;

        let policy = self.resolve_policy();
        let schemas = self.tools.schemas();
        let dispatcher = ToolDispatcher {
            tools: self.tools.as_ref(),
            hooks: &self.hooks,
            ctx,
            spans,
            policy,
        };

        let seed_len = ctx.input_messages.len();
        let mut messages = ctx.input_messages.clone();
        let mut usage = Usage::default();
        let mut tool_results = Vec::new();
        let mut iterations = 0;

        info!(
            run_id = %ctx.run_id,
            conversation_id = %ctx.conversation_id,
            seed_messages = seed_len,
            tools = schemas.len(),
            swallow = policy.swallow,
            "Starting agent run"
        );

        loop {
            if iterations >= self.config.max_iterations {
                let error = Error::IterationLimitExceeded {
                    max_iterations: self.config.max_iterations,
                };
                warn!(max = self.config.max_iterations, "Max iterations reached");
                self.hooks.notify_error(ctx, &error, HookPhase::Run).await;
                if !policy.swallow {
                    return Err(error);
                }
                return Ok(ExecutionResult {
                    run_id: ctx.run_id,
                    conversation_id: ctx.conversation_id,
                    messages,
                    iterations,
                    usage,
                    final_content: None,
                    error: Some(error),
                    seed_len,
                    tool_results,
                });
            }

            iterations += 1;
            debug!(iteration = iterations, "Starting iteration");

            self.hooks
                .emit(
                    ctx,
                    HookEvent::BeforeLlmCall {
                        messages: &messages,
                    },
                    policy.isolate_hooks,
                )
                .await?;

            let mut response = match self.call_llm(&messages, &schemas, &spans, iterations).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(iteration = iterations, error = %e, "LLM call failed");
                    self.hooks.notify_error(ctx, &e, HookPhase::LlmCall).await;
                    return Err(e);
                }
            };

            for call in &mut response.message.tool_calls {
                if call.id.is_empty() {
                    call.id = generate_call_id();
                }
            }
            usage.accumulate(&response.usage);

            self.hooks
                .emit(
                    ctx,
                    HookEvent::AfterLlmCall {
                        response: &response,
                        usage: &usage,
                    },
                    policy.isolate_hooks,
                )
                .await?;

            if !response.wants_tool_use() {
                debug!("No tool use requested, ending loop");
                let final_content = response.message.content.clone();
                messages.push(response.message);

                info!(
                    iterations,
                    total_tokens = usage.total_tokens(),
                    tool_calls = tool_results.len(),
                    "Agent run completed"
                );
                return Ok(ExecutionResult {
                    run_id: ctx.run_id,
                    conversation_id: ctx.conversation_id,
                    messages,
                    iterations,
                    usage,
                    final_content: Some(final_content),
                    error: None,
                    seed_len,
                    tool_results,
                });
            }

            let assistant = response.message;
            debug!(
                iteration = iterations,
                tool_calls = assistant.tool_calls.len(),
                "Dispatching tool calls"
            );
            let results = dispatcher.dispatch(&assistant.tool_calls).await?;

            messages.push(assistant);
            messages.extend(results.iter().map(|r| r.to_message()));
            tool_results.extend(results);
        }
    }

    async fn call_llm(
        &self,
        messages: &[AgentMessage],
        schemas: &[ToolSchema],
        spans: &SpanContext,
        iteration: usize,
    ) -> Result<LlmResponse> {
        let call_span = spans.llm_call_span(iteration);
        let request = self
            .client
            .generate(messages, schemas, &self.config.options)
            .instrument(call_span.span().clone());

        let outcome = match self.config.llm_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .unwrap_or_else(|_| Err(Error::LlmTimeout(limit))),
            None => request.await,
        };

        match outcome {
            Ok(mut response) => {
                call_span.record_usage(&response.usage, response.message.tool_calls.len());
                let latency_ms = call_span.finish();
                if response.usage.latency_ms == 0 {
                    response.usage.latency_ms = latency_ms;
                }
                debug!(iteration, latency_ms, "LLM call completed");
                Ok(response)
            }
            Err(e) => {
                call_span.finish();
                Err(e)
            }
        }
    }
}
