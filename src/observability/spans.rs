//! Structured span definitions for tracing.

use std::time::Instant;

use tracing::{Level, Span, field, span};
use uuid::Uuid;

use crate::types::{AgentContext, Usage};

/// Identifiers shared by every span of one run.
#[derive(Debug, Clone, Copy)]
pub struct SpanContext {
    run_id: Uuid,
    conversation_id: Uuid,
}

impl SpanContext {
    pub fn new(run_id: Uuid, conversation_id: Uuid) -> Self {
        Self {
            run_id,
            conversation_id,
        }
    }

    pub fn from_context(ctx: &AgentContext) -> Self {
        Self::new(ctx.run_id, ctx.conversation_id)
    }

    pub fn run_span(&self, max_iterations: usize) -> Span {
        span!(
            Level::INFO,
            "agent.run",
            run_id = %self.run_id,
            conversation_id = %self.conversation_id,
            max_iterations = max_iterations,
            otel.name = "agent.run",
            iterations = field::Empty,
        )
    }

    pub fn llm_call_span(&self, iteration: usize) -> LlmCallSpan {
        LlmCallSpan::new(self.run_id, iteration)
    }

    pub fn tool_span(&self, tool_name: &str, call_id: &str) -> Span {
        span!(
            Level::INFO,
            "tool.execute",
            tool_name = tool_name,
            call_id = call_id,
            run_id = %self.run_id,
            otel.name = format!("tool.{}", tool_name),
            is_error = field::Empty,
            duration_ms = field::Empty,
        )
    }
}

/// Span around one LLM call that records usage and latency.
pub struct LlmCallSpan {
    span: Span,
    start: Instant,
}

impl LlmCallSpan {
    pub fn new(run_id: Uuid, iteration: usize) -> Self {
        let span = span!(
            Level::INFO,
            "llm.call",
            run_id = %run_id,
            iteration = iteration,
            otel.name = "llm.call",
            prompt_tokens = field::Empty,
            completion_tokens = field::Empty,
            tool_calls = field::Empty,
            latency_ms = field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
        }
    }

    pub fn record_usage(&self, usage: &Usage, tool_calls: usize) {
        self.span.record("prompt_tokens", usage.prompt_tokens);
        self.span.record("completion_tokens", usage.completion_tokens);
        self.span.record("tool_calls", tool_calls as u64);
    }

    /// Record latency and return it in milliseconds.
    pub fn finish(self) -> u64 {
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.span.record("latency_ms", latency_ms);
        latency_ms
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
