//! RoundRunner (spec §4.12, C13). Composes the packer (C7), compressor (C8),
//! round cache (C9), provider abstraction (C10), auth (C11), and rate
//! limiter/retry (C12). Grounded on `oracle::mod.rs`'s overall "assemble
//! context → call provider → handle failure" shape; the teacher's
//! `generate_suggestions` → `create_codebase_bundle` → `query_gemini` chain
//! is the direct ancestor of `run_round` below.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::concurrency::rate_limiter::{default_is_retryable, retry_with_backoff, OnRetry, RateLimiter};
use crate::core::errors::Result;
use crate::packer::context_packer::PackedContext;
use crate::provider::types::{estimate_cost, CompletionOptions, CompletionRequest, CompletionUsage, LLMProvider, ModelPricing};
use crate::rounds::types::{ModuleDeepDive, RoundExecutionResult, TokenUsage};

/// Runs LLM rounds against a single provider, bounding concurrency and
/// applying retry/backoff, and converting any unrecoverable failure into a
/// degraded result rather than aborting the pipeline.
pub struct RoundRunner {
    provider: Arc<dyn LLMProvider>,
    rate_limiter: Arc<RateLimiter>,
    pricing: Option<ModelPricing>,
}

impl RoundRunner {
    pub fn new(provider: Arc<dyn LLMProvider>, rate_limiter: Arc<RateLimiter>, pricing: Option<ModelPricing>) -> Self {
        Self { provider, rate_limiter, pricing }
    }

    /// Executes one round: builds the prompt from `packed` and the
    /// serialized prior-round carry-over, calls the provider with `schema`,
    /// and on success records usage/cost. On validation failure (schema
    /// mismatch despite retries) or provider failure after retries, returns
    /// a degraded result: an empty-valued `T::default()`, status degraded,
    /// whatever usage was recorded, and a reason.
    pub async fn run_round<T>(
        &self,
        system_prompt: &str,
        packed: &PackedContext,
        carry_over: &str,
        schema: Value,
        tool_name: &str,
        on_retry: Option<&OnRetry<'_>>,
    ) -> RoundExecutionResult<T>
    where
        T: DeserializeOwned + Default + Serialize,
    {
        let started = Instant::now();
        let user_prompt = build_round_prompt(packed, carry_over);

        let _permit = self.rate_limiter.acquire().await;

        let outcome = retry_with_backoff(
            || {
                let provider = Arc::clone(&self.provider);
                let request = CompletionRequest {
                    system_prompt: system_prompt.to_string(),
                    user_prompt: user_prompt.clone(),
                    temperature: None,
                    max_tokens: None,
                    response_schema: schema.clone(),
                    tool_name: tool_name.to_string(),
                };
                async move { provider.complete(request, CompletionOptions { on_retry: None }).await }
            },
            |text| default_is_retryable(text),
            on_retry,
        )
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(completion) => match serde_json::from_value::<T>(completion.data) {
                Ok(data) => {
                    let usage = TokenUsage { input: completion.usage.input_tokens as usize, output: completion.usage.output_tokens as usize };
                    let cost = self.pricing.map(|p| estimate_cost(completion.usage, p));
                    info!(elapsed_ms, input_tokens = usage.input, output_tokens = usage.output, "round completed");
                    RoundExecutionResult::success(data, usage, cost, elapsed_ms)
                }
                Err(err) => {
                    warn!(error = %err, "round output failed schema validation; degrading");
                    let usage = TokenUsage { input: completion.usage.input_tokens as usize, output: completion.usage.output_tokens as usize };
                    RoundExecutionResult::degraded(T::default(), format!("schema validation failed: {err}"), Some(usage), elapsed_ms)
                }
            },
            Err(err) => {
                warn!(error = %err, "round failed after retries; degrading");
                RoundExecutionResult::degraded(T::default(), err.to_string(), None, elapsed_ms)
            }
        }
    }

    /// Round 5: fans out one call per detected module, applying its own
    /// concurrency bound (still observing the provider's semaphore via
    /// `run_round`'s `acquire`), retrying only the modules that individually
    /// failed rather than re-running the whole round.
    pub async fn run_module_round(
        &self,
        system_prompt_for: impl Fn(&str) -> String,
        packed: &PackedContext,
        carry_over: &str,
        schema: Value,
        modules: &[String],
        module_concurrency: usize,
    ) -> RoundExecutionResult<Vec<ModuleDeepDive>> {
        let started = Instant::now();
        let bound = module_concurrency.max(1);

        let mut results = Vec::with_capacity(modules.len());
        for chunk in modules.chunks(bound) {
            let futures = chunk.iter().map(|module| {
                let prompt = system_prompt_for(module);
                let schema = schema.clone();
                async move { self.run_round::<ModuleDeepDive>(&prompt, packed, carry_over, schema, "module_deep_dive", None).await }
            });
            results.extend(join_all(futures).await);
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let any_degraded = results.iter().any(|r| r.is_degraded());

        let total_input: usize = results.iter().filter_map(|r| r.tokens.map(|t| t.input)).sum();
        let total_output: usize = results.iter().filter_map(|r| r.tokens.map(|t| t.output)).sum();
        let total_cost: f64 = results.iter().filter_map(|r| r.cost).sum();

        let data: Vec<ModuleDeepDive> = results.into_iter().map(|r| r.data).collect();
        let usage = TokenUsage { input: total_input, output: total_output };

        if any_degraded {
            RoundExecutionResult::degraded(data, "one or more module deep-dives degraded", Some(usage), elapsed_ms)
        } else {
            RoundExecutionResult::success(data, usage, if total_cost > 0.0 { Some(total_cost) } else { None }, elapsed_ms)
        }
    }
}

/// Assembles the user-turn prompt from the packed file context and the
/// prior round's compressed carry-over block.
fn build_round_prompt(packed: &PackedContext, carry_over: &str) -> String {
    let mut prompt = String::new();

    if !carry_over.is_empty() {
        prompt.push_str("# Prior round context\n\n");
        prompt.push_str(carry_over);
        prompt.push_str("\n\n");
    }

    prompt.push_str("# Repository context\n\n");
    for file in &packed.files {
        if file.content.is_empty() {
            continue;
        }
        prompt.push_str(&format!("```{}\n", file.path));
        prompt.push_str(&file.content);
        prompt.push_str("\n```\n\n");
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_round_prompt_skips_skipped_files() {
        use crate::packer::context_packer::{PackTier, PackedContextMetadata, PackedFile};
        use crate::tokens::budget::TokenBudget;

        let packed = PackedContext {
            files: vec![
                PackedFile { path: "a.rs".into(), tier: PackTier::Full, content: "fn main() {}".into(), tokens: 4, score: 10 },
                PackedFile { path: "b.rs".into(), tier: PackTier::Skip, content: String::new(), tokens: 0, score: 0 },
            ],
            budget: TokenBudget { total: 100, prompt_overhead: 0, output_reserve: 0, file_content_budget: 100 },
            metadata: PackedContextMetadata::default(),
        };

        let prompt = build_round_prompt(&packed, "");
        assert!(prompt.contains("a.rs"));
        assert!(!prompt.contains("b.rs"));
    }
}
