//! ProviderAbstraction capability (spec §4.9, C10). Grounded on
//! `oracle::mod.rs`'s `reqwest::Client` + typed request/response structs,
//! generalized into a trait-based capability so Anthropic-native and
//! OpenAI-compatible endpoints are two concrete implementations of the same
//! interface rather than a single Gemini-specific path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::Result;

/// Structural failure codes surfaced by a provider (spec §4.9).
pub const PROVIDER_NO_TOOL_USE: &str = "PROVIDER_NO_TOOL_USE";
pub const PROVIDER_NO_API_KEY: &str = "PROVIDER_NO_API_KEY";
pub const PROVIDER_UNKNOWN: &str = "PROVIDER_UNKNOWN";
pub const PROVIDER_OLLAMA_NO_MODEL: &str = "PROVIDER_OLLAMA_NO_MODEL";
pub const PROVIDER_AZURE_NO_BASE_URL: &str = "PROVIDER_AZURE_NO_BASE_URL";
pub const PROVIDER_CUSTOM_NO_BASE_URL: &str = "PROVIDER_CUSTOM_NO_BASE_URL";
pub const PROVIDER_SAFETY_BLOCKED: &str = "PROVIDER_SAFETY_BLOCKED";

/// A single structured-output completion request.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// JSON schema the forced tool-call/function-call arguments must satisfy.
    pub response_schema: Value,
    /// Name given to the forced tool ("structured_response" on OpenAI-compatible
    /// endpoints; the schema's title on Anthropic-native ones).
    pub tool_name: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CompletionUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Result of a provider call; `data` is the raw JSON arguments validated
/// against `response_schema`, left to the caller to deserialize into a
/// concrete round-payload type.
#[derive(Debug, Clone)]
pub struct CompletionResult {
    pub data: Value,
    pub usage: CompletionUsage,
    pub model: String,
    pub duration_ms: u64,
}

/// Invoked before each retry sleep (spec §4.11): `(attempt, delay_ms, reason)`.
pub type OnRetry<'a> = dyn Fn(u32, u64, &str) + Send + Sync + 'a;

#[derive(Default)]
pub struct CompletionOptions<'a> {
    pub on_retry: Option<&'a OnRetry<'a>>,
}

/// Unified capability interface over LLM providers (spec §9 "dynamic
/// dispatch over providers": a capability interface selected by a factory
/// rather than an inheritance hierarchy).
#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn complete(&self, request: CompletionRequest, options: CompletionOptions<'_>) -> Result<CompletionResult>;

    /// Heuristic token estimate for prompt-sizing decisions.
    fn estimate_tokens(&self, text: &str) -> usize {
        crate::tokens::budget::estimate_tokens(text)
    }

    fn max_context_tokens(&self) -> usize;

    fn model_name(&self) -> &str;
}

/// Per-model pricing, dollars per million tokens.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Computes a USD cost estimate from usage and a model's pricing entry.
pub fn estimate_cost(usage: CompletionUsage, pricing: ModelPricing) -> f64 {
    let input_cost = usage.input_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
    let output_cost = usage.output_tokens as f64 / 1_000_000.0 * pricing.output_per_million;
    input_cost + output_cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_cost_combines_input_and_output_pricing() {
        let usage = CompletionUsage { input_tokens: 2_000_000, output_tokens: 500_000 };
        let pricing = ModelPricing { input_per_million: 3.0, output_per_million: 15.0 };

        let cost = estimate_cost(usage, pricing);
        assert!((cost - (6.0 + 7.5)).abs() < 1e-9);
    }

    #[test]
    fn zero_usage_is_zero_cost() {
        let usage = CompletionUsage::default();
        let pricing = ModelPricing { input_per_million: 3.0, output_per_million: 15.0 };
        assert_eq!(estimate_cost(usage, pricing), 0.0);
    }
}
