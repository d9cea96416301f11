//! Token and latency counters.

use serde::{Deserialize, Serialize};

/// Usage counters reported by an LLM call, or aggregated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens in the request
    #[serde(default)]
    pub prompt_tokens: u64,
    /// Tokens generated
    #[serde(default)]
    pub completion_tokens: u64,
    /// Wall-clock time spent waiting on the LLM
    #[serde(default)]
    pub latency_ms: u64,
    /// Number of LLM calls folded into these counters
    #[serde(default)]
    pub llm_calls: u32,
}

impl Usage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            ..Default::default()
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Fold one call's usage into a running total.
    pub fn accumulate(&mut self, other: &Usage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.latency_ms = self.latency_ms.saturating_add(other.latency_ms);
        self.llm_calls = self.llm_calls.saturating_add(other.llm_calls.max(1));
    }
}
