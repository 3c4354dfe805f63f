//! Top-level pipeline wiring (spec §2 "Data flow", §6 CLI surface). Assembles
//! C1-C16 into the three entry points an interactive CLI shell consumes:
//! `generate` (full pipeline, disk output), `analyze` (static analysis only,
//! no LLM calls), and `estimate` (token/cost projection, no provider call).
//! The CLI shell itself (argument parsing, interactive prompts beyond the
//! `SecretPrompt` boundary) is out of scope per spec.md §1.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::analyzers::ast::ParserRegistry;
use crate::analyzers::context::AnalysisContext;
use crate::analyzers::coordinator;
use crate::analyzers::types::{FileEntry, StaticAnalysisResult};
use crate::cache::analysis_cache::AnalysisCache;
use crate::cache::round_cache::RoundCache;
use crate::core::config::{Audience, HandoverConfig, ProviderName};
use crate::core::errors::{HandoverError, Result};
use crate::dag::orchestrator::{DagObserver, DagOrchestrator, DagStep, StepOutputs};
use crate::discovery::file_discovery::FileDiscovery;
use crate::packer::context_packer::{self, PackedContext};
use crate::provider::factory::build_provider;
use crate::provider::presets::{self, ProviderPreset};
use crate::provider::types::LLMProvider;
use crate::auth::resolve::{resolve_auth, DialoguerPrompt};
use crate::concurrency::rate_limiter::RateLimiter;
use crate::render::registry::{compute_required_rounds, render_selected, resolve_selected_docs};
use crate::render::types::RenderContext;
use crate::rounds::compressor::compress;
use crate::rounds::runner::RoundRunner;
use crate::rounds::schemas;
use crate::rounds::types::{
    ArchitectureAnalysis, ConventionsAnalysis, FeatureInventory, ModuleDeepDive, ModuleInventory,
    OperationsAnalysis, RoundExecutionResult, RoundOutcome, RoundResultsByNumber, ROUND_DEPS,
};
use crate::scoring::scorer::score_files;
use crate::terminal::renderer::TerminalRenderer;
use crate::tokens::budget::{compute_token_budget, BudgetOptions};

/// Token ceiling applied to each dependency round's compressed carry-over
/// block before it is concatenated into the next round's prompt (spec §4.7).
const CARRY_OVER_TOKEN_CEILING: usize = 2000;

/// How far back to window the default-depth commit log (spec §4.3.3),
/// expressed in days so `GitHistory` doesn't need a calendar dependency.
pub const DEFAULT_GIT_DEPTH_DAYS: u32 = 182;

/// CLI-facing overrides layered on top of a loaded `HandoverConfig` (spec
/// §6 `generate [--provider P] [--model M] [--only LIST] ...`).
#[derive(Default)]
pub struct GenerateOptions {
    pub provider_override: Option<ProviderName>,
    pub model_override: Option<String>,
    pub only: Option<Vec<String>>,
    pub audience_override: Option<Audience>,
    pub static_only_override: bool,
    pub no_cache: bool,
    pub cli_api_key: Option<String>,
    /// No TTY, or `CI` set: interactive credential prompts are skipped.
    pub non_interactive: bool,
}

/// Per-document outcome surfaced to the caller after a `generate` run.
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub filename: String,
    pub status: String,
}

#[derive(Debug)]
pub struct GenerateReport {
    pub documents: Vec<WrittenDocument>,
    pub total_cost: Option<f64>,
    pub static_only: bool,
}

/// Applies config + CLI overrides, then runs the full pipeline: discovery,
/// analysis, scoring, packing, LLM rounds (unless static-only), and
/// rendering to `config.output` under `root`.
pub async fn generate(root: impl Into<PathBuf>, config: &HandoverConfig, options: GenerateOptions) -> Result<GenerateReport> {
    let root = root.into();
    let mut config = config.clone();
    if let Some(provider) = options.provider_override {
        config.provider = provider;
    }
    if let Some(model) = options.model_override.clone() {
        config.model = Some(model);
    }
    if let Some(audience) = options.audience_override {
        config.audience = audience;
    }
    if options.static_only_override {
        config.analysis.static_only = true;
    }
    config.validate()?;

    let (files, analysis) = run_static_analysis(&root, &config).await?;
    let selected_ids = resolve_selected_docs(options.only.as_deref())?;
    let required_rounds = if config.analysis.static_only { Vec::new() } else { compute_required_rounds(&selected_ids) };

    let boosted: HashSet<String> = config.context_window.boost.iter().cloned().collect();
    let priorities = score_files(&files, &analysis, &boosted);

    let mut rounds: RoundResultsByNumber = HashMap::new();
    let mut total_cost = 0.0_f64;
    let mut any_cost = false;
    let mut show_cost = true;

    if !required_rounds.is_empty() {
        let preset_key = config.provider.preset_key();
        let preset = presets::preset(preset_key)
            .ok_or_else(|| HandoverError::provider(crate::provider::types::PROVIDER_UNKNOWN, format!("no preset for '{preset_key}'")))?;

        let resolved_auth = resolve_auth(&config, preset, options.cli_api_key.as_deref(), options.non_interactive, &DialoguerPrompt)?;
        let provider = build_provider(&config, Some(&resolved_auth.token))?;

        show_cost = !preset.is_local && !matches!(config.auth_method, crate::core::config::AuthMethod::Subscription);
        let observer: Arc<TerminalRenderer> = Arc::new(TerminalRenderer::new(show_cost));

        let concurrency = config.effective_concurrency(preset.default_concurrency);
        let rate_limiter = Arc::new(RateLimiter::new(concurrency));
        let pricing = config.model.as_deref().and_then(|m| preset.pricing_for(m)).or_else(|| preset.default_model.and_then(|m| preset.pricing_for(m)));
        let runner = Arc::new(RoundRunner::new(Arc::clone(&provider), rate_limiter, pricing));

        let round_cache = Arc::new(RoundCache::new(&root));
        if options.no_cache {
            round_cache.clear()?;
        }
        let fingerprint = RoundCache::compute_analysis_fingerprint(&files);

        let context_window = config.context_window.max_tokens.unwrap_or_else(|| provider.max_context_tokens());
        let budget = compute_token_budget(context_window, BudgetOptions::default());
        let pinned: HashSet<String> = config.context_window.pin.iter().cloned().collect();
        let packed = Arc::new(context_packer::pack(&priorities, &analysis, budget, &root, &pinned));

        let dag_result = run_rounds(&required_rounds, Arc::clone(&runner), Arc::clone(&packed), Arc::clone(&round_cache), fingerprint, provider.model_name().to_string(), Arc::clone(&observer) as Arc<dyn DagObserver>).await?;

        for round_number in &required_rounds {
            if let Some(value) = dag_result.outputs.get(&format!("round-{round_number}")) {
                match serde_json::from_value::<RoundOutcome>(value.clone()) {
                    Ok(outcome) => {
                        if let Some(cost) = outcome_cost(&outcome) {
                            total_cost += cost;
                            any_cost = true;
                        }
                        rounds.insert(*round_number, outcome);
                    }
                    Err(err) => warn!(round = round_number, error = %err, "failed to decode round output, omitting from render context"),
                }
            }
        }

        observer.finish(selected_ids.len() + 1, if any_cost { Some(total_cost) } else { None });
    }

    let generated_at = Utc::now().to_rfc3339();
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repository".to_string());

    let render_ctx = RenderContext {
        rounds: &rounds,
        analysis: &analysis,
        config: &config,
        audience: config.audience,
        generated_at,
        project_name,
    };

    let rendered = render_selected(&render_ctx, &selected_ids);

    std::fs::create_dir_all(&config.output)
        .map_err(|e| HandoverError::io(format!("failed to create output directory: {}", config.output.display()), e))?;

    let mut written = Vec::new();
    for doc in &rendered {
        if doc.content.is_empty() && doc.id != "00-index" {
            continue;
        }
        let path = config.output.join(doc.filename);
        std::fs::write(&path, &doc.content).map_err(|e| HandoverError::io(format!("failed to write {}", path.display()), e))?;
        written.push(WrittenDocument { filename: doc.filename.to_string(), status: format!("{:?}", doc.status) });
    }

    Ok(GenerateReport {
        documents: written,
        total_cost: if any_cost { Some(total_cost) } else { None },
        static_only: config.analysis.static_only,
    })
}

/// Runs discovery + the analysis cache + all eight analyzers, returning the
/// assembled `StaticAnalysisResult` with no LLM involvement (spec §6
/// `analyze [--json] [--git-depth default|full]`).
pub async fn analyze(root: impl Into<PathBuf>, config: &HandoverConfig) -> Result<StaticAnalysisResult> {
    let (_, analysis) = run_static_analysis(&root.into(), config).await?;
    Ok(analysis)
}

#[derive(Debug, Clone)]
pub struct EstimateReport {
    pub provider: String,
    pub model: String,
    pub context_window: usize,
    pub estimated_rounds: u8,
    pub estimated_input_tokens: usize,
    pub estimated_output_tokens: usize,
    pub estimated_cost: Option<f64>,
}

/// Projects token usage and cost without calling any provider (spec §6
/// `estimate [--provider P] [--model M]`): the round count times the packed
/// context's used-token total for input, and `DEFAULT_OUTPUT_RESERVE` per
/// round for output.
pub async fn estimate(root: impl Into<PathBuf>, config: &HandoverConfig, provider_override: Option<ProviderName>, model_override: Option<String>) -> Result<EstimateReport> {
    let root = root.into();
    let mut config = config.clone();
    if let Some(p) = provider_override {
        config.provider = p;
    }
    if let Some(m) = model_override {
        config.model = Some(m);
    }

    let preset_key = config.provider.preset_key();
    let preset: &'static ProviderPreset = presets::preset(preset_key)
        .ok_or_else(|| HandoverError::provider(crate::provider::types::PROVIDER_UNKNOWN, format!("no preset for '{preset_key}'")))?;

    let (files, analysis) = run_static_analysis(&root, &config).await?;
    let boosted: HashSet<String> = config.context_window.boost.iter().cloned().collect();
    let priorities = score_files(&files, &analysis, &boosted);

    let context_window = config.context_window.max_tokens.unwrap_or(preset.context_window);
    let budget = compute_token_budget(context_window, BudgetOptions::default());
    let pinned: HashSet<String> = config.context_window.pin.iter().cloned().collect();
    let packed = context_packer::pack(&priorities, &analysis, budget, &root, &pinned);

    let model = config.model.clone().or_else(|| preset.default_model.map(str::to_string)).unwrap_or_else(|| "unknown".to_string());
    let pricing = preset.pricing_for(&model);

    let rounds_to_run: u8 = if config.analysis.static_only { 0 } else { 6 };
    let estimated_input = packed.metadata.used_tokens.saturating_mul(rounds_to_run as usize);
    let estimated_output = crate::tokens::budget::DEFAULT_OUTPUT_RESERVE * rounds_to_run as usize;

    let estimated_cost = pricing.map(|p| {
        let input_cost = estimated_input as f64 / 1_000_000.0 * p.input_per_million;
        let output_cost = estimated_output as f64 / 1_000_000.0 * p.output_per_million;
        input_cost + output_cost
    });

    Ok(EstimateReport {
        provider: preset.display_name.to_string(),
        model,
        context_window,
        estimated_rounds: rounds_to_run,
        estimated_input_tokens: estimated_input,
        estimated_output_tokens: estimated_output,
        estimated_cost,
    })
}

async fn run_static_analysis(root: &Path, config: &HandoverConfig) -> Result<(Vec<FileEntry>, StaticAnalysisResult)> {
    let discovery = FileDiscovery::new(root)
        .with_include(config.include.clone())
        .with_exclude(config.exclude.clone());
    let discovered = discovery.discover()?;
    let files = discovered.files.clone();

    let mut cache = AnalysisCache::load(root);
    for file in &discovered.files {
        let content = crate::core::file_utils::FileReader::read_to_string(Path::new(&file.absolute_path)).unwrap_or_default();
        let hash = sha256_hex(&content);
        cache.update(&file.relative_path, &hash);
    }
    cache.save()?;

    let ctx = AnalysisContext::new(root.to_path_buf(), discovered.files, config.clone(), cache);
    let parser_registry = Arc::new(ParserRegistry::new());

    let result = coordinator::run(ctx, parser_registry).await;
    Ok((files, result))
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn outcome_cost(outcome: &RoundOutcome) -> Option<f64> {
    match outcome {
        RoundOutcome::Modules(r) => r.cost,
        RoundOutcome::Architecture(r) => r.cost,
        RoundOutcome::Features(r) => r.cost,
        RoundOutcome::Conventions(r) => r.cost,
        RoundOutcome::ModuleDeepDives(r) => r.cost,
        RoundOutcome::Operations(r) => r.cost,
    }
}

/// Registers and runs every round in `required_rounds` on the DAG
/// orchestrator, wiring deps per `ROUND_DEPS` (spec §4.13).
async fn run_rounds(
    required_rounds: &[u8],
    runner: Arc<RoundRunner>,
    packed: Arc<PackedContext>,
    round_cache: Arc<RoundCache>,
    fingerprint: String,
    model: String,
    observer: Arc<dyn DagObserver>,
) -> Result<crate::dag::orchestrator::DagRunResult> {
    let mut dag = DagOrchestrator::new();
    let required: HashSet<u8> = required_rounds.iter().copied().collect();

    // Registration must be topologically ordered (the orchestrator rejects
    // forward references), so walk 1..=6 in order rather than iterating the
    // caller-provided (possibly unsorted) slice.
    for round in 1u8..=6 {
        if !required.contains(&round) {
            continue;
        }
        let direct_deps: Vec<u8> = ROUND_DEPS.iter().find(|(n, _)| *n == round).map(|(_, d)| d.to_vec()).unwrap_or_default();
        let dep_ids: Vec<String> = direct_deps.iter().map(|d| format!("round-{d}")).collect();

        let step: Arc<dyn DagStep> = make_round_step(round, &direct_deps, Arc::clone(&runner), Arc::clone(&packed), Arc::clone(&round_cache), fingerprint.clone(), model.clone(), Arc::clone(&observer));
        dag.register(format!("round-{round}"), dep_ids, step)?;
    }

    dag.run(observer).await
}

fn make_round_step(
    round: u8,
    direct_deps: &[u8],
    runner: Arc<RoundRunner>,
    packed: Arc<PackedContext>,
    round_cache: Arc<RoundCache>,
    fingerprint: String,
    model: String,
    observer: Arc<dyn DagObserver>,
) -> Arc<dyn DagStep> {
    let direct_deps = direct_deps.to_vec();
    match round {
        1 => Arc::new(RoundStep::<ModuleInventory> {
            round,
            direct_deps,
            runner,
            packed,
            round_cache,
            fingerprint,
            model,
            observer,
            system_prompt: schemas::MODULES_SYSTEM_PROMPT,
            schema: schemas::modules_schema(),
            tool_name: "module_inventory",
            wrap: RoundOutcome::Modules,
        }),
        2 => Arc::new(RoundStep::<ArchitectureAnalysis> {
            round,
            direct_deps,
            runner,
            packed,
            round_cache,
            fingerprint,
            model,
            observer,
            system_prompt: schemas::ARCHITECTURE_SYSTEM_PROMPT,
            schema: schemas::architecture_schema(),
            tool_name: "architecture_analysis",
            wrap: RoundOutcome::Architecture,
        }),
        3 => Arc::new(RoundStep::<FeatureInventory> {
            round,
            direct_deps,
            runner,
            packed,
            round_cache,
            fingerprint,
            model,
            observer,
            system_prompt: schemas::FEATURES_SYSTEM_PROMPT,
            schema: schemas::features_schema(),
            tool_name: "feature_inventory",
            wrap: RoundOutcome::Features,
        }),
        4 => Arc::new(RoundStep::<ConventionsAnalysis> {
            round,
            direct_deps,
            runner,
            packed,
            round_cache,
            fingerprint,
            model,
            observer,
            system_prompt: schemas::CONVENTIONS_SYSTEM_PROMPT,
            schema: schemas::conventions_schema(),
            tool_name: "conventions_analysis",
            wrap: RoundOutcome::Conventions,
        }),
        5 => Arc::new(ModuleDeepDiveStep { direct_deps, runner, packed, round_cache, fingerprint, model, observer }),
        6 => Arc::new(RoundStep::<OperationsAnalysis> {
            round,
            direct_deps,
            runner,
            packed,
            round_cache,
            fingerprint,
            model,
            observer,
            system_prompt: schemas::OPERATIONS_SYSTEM_PROMPT,
            schema: schemas::operations_schema(),
            tool_name: "operations_analysis",
            wrap: RoundOutcome::Operations,
        }),
        other => unreachable!("round numbers are fixed 1..=6, got {other}"),
    }
}

/// Reads each of `direct_deps`'s completed outputs from `outputs`, compresses
/// it (spec §4.7), and concatenates the resulting blocks into one carry-over
/// string for the next round's prompt.
fn build_carry_over(direct_deps: &[u8], outputs: &StepOutputs) -> String {
    let mut blocks = Vec::new();
    for dep in direct_deps {
        if let Some(value) = outputs.get(&format!("round-{dep}")) {
            if let Ok(outcome) = serde_json::from_value::<RoundOutcome>(value.clone()) {
                let ctx = compress(&outcome, *dep, CARRY_OVER_TOKEN_CEILING);
                let block = crate::rounds::compressor::render_block(&ctx.modules, &ctx.findings, &ctx.relationships, &ctx.open_questions);
                if !block.is_empty() {
                    blocks.push(block);
                }
            }
        }
    }
    blocks.join("\n\n")
}

/// A single (non-fan-out) LLM round: builds carry-over from its direct
/// deps, consults the round cache, runs the provider call on a miss, and
/// wraps the typed result back into the type-erased `RoundOutcome` the DAG
/// and downstream renderers share.
struct RoundStep<T> {
    round: u8,
    direct_deps: Vec<u8>,
    runner: Arc<RoundRunner>,
    packed: Arc<PackedContext>,
    round_cache: Arc<RoundCache>,
    fingerprint: String,
    model: String,
    observer: Arc<dyn DagObserver>,
    system_prompt: &'static str,
    schema: serde_json::Value,
    tool_name: &'static str,
    wrap: fn(RoundExecutionResult<T>) -> RoundOutcome,
}

#[async_trait]
impl<T> DagStep for RoundStep<T>
where
    T: DeserializeOwned + Default + Serialize + Send + Sync,
{
    async fn execute(&self, outputs: &StepOutputs) -> Result<serde_json::Value> {
        let carry_over = build_carry_over(&self.direct_deps, outputs);
        let hash = RoundCache::compute_hash(self.round, &self.model, &self.fingerprint);

        if let Some(cached) = self.round_cache.get::<RoundExecutionResult<T>>(self.round, &hash) {
            info!(round = self.round, "round satisfied from cache");
            return Ok(serde_json::to_value((self.wrap)(cached))?);
        }

        let result = self.runner.run_round::<T>(self.system_prompt, &self.packed, &carry_over, self.schema.clone(), self.tool_name, None).await;

        if result.is_degraded() {
            self.observer.on_step_fail(&format!("round-{}", self.round), &HandoverError::pipeline("round", result.degraded_reason.clone().unwrap_or_default()));
        }

        if let Err(err) = self.round_cache.set(self.round, &hash, &self.model, &result) {
            warn!(round = self.round, error = %err, "failed to persist round cache entry");
        }

        Ok(serde_json::to_value((self.wrap)(result))?)
    }
}

/// Round 5's per-module fan-out (spec §4.12 "Round 5 ... fans out one call
/// per detected module"). Reads the module list from round 1's output.
struct ModuleDeepDiveStep {
    direct_deps: Vec<u8>,
    runner: Arc<RoundRunner>,
    packed: Arc<PackedContext>,
    round_cache: Arc<RoundCache>,
    fingerprint: String,
    model: String,
    observer: Arc<dyn DagObserver>,
}

#[async_trait]
impl DagStep for ModuleDeepDiveStep {
    async fn execute(&self, outputs: &StepOutputs) -> Result<serde_json::Value> {
        let carry_over = build_carry_over(&self.direct_deps, outputs);
        let hash = RoundCache::compute_hash(5, &self.model, &self.fingerprint);

        if let Some(cached) = self.round_cache.get::<RoundExecutionResult<Vec<ModuleDeepDive>>>(5, &hash) {
            info!(round = 5, "round satisfied from cache");
            return Ok(serde_json::to_value(RoundOutcome::ModuleDeepDives(cached))?);
        }

        let modules: Vec<String> = outputs
            .get("round-1")
            .and_then(|v| serde_json::from_value::<RoundOutcome>(v.clone()).ok())
            .map(|outcome| match outcome {
                RoundOutcome::Modules(r) => r.data.modules.into_iter().map(|m| m.name).collect(),
                _ => Vec::new(),
            })
            .unwrap_or_default();

        let module_concurrency = modules.len().min(4).max(1);
        let result = self
            .runner
            .run_module_round(schemas::module_deep_dive_system_prompt, &self.packed, &carry_over, schemas::module_deep_dive_schema(), &modules, module_concurrency)
            .await;

        if result.is_degraded() {
            self.observer.on_step_fail("round-5", &HandoverError::pipeline("round", result.degraded_reason.clone().unwrap_or_default()));
        }

        if let Err(err) = self.round_cache.set(5, &hash, &self.model, &result) {
            warn!(round = 5, error = %err, "failed to persist round cache entry");
        }

        Ok(serde_json::to_value(RoundOutcome::ModuleDeepDives(result))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn static_only_generate_produces_documents_without_a_provider() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let mut config = HandoverConfig::default();
        config.output = dir.path().join("handover");
        config.analysis.static_only = true;

        let rt = tokio::runtime::Runtime::new().unwrap();
        let report = rt
            .block_on(generate(dir.path(), &config, GenerateOptions { static_only_override: true, non_interactive: true, ..Default::default() }))
            .unwrap();

        assert!(report.static_only);
        assert!(report.documents.iter().any(|d| d.filename == "00-INDEX.md"));
        assert!(dir.path().join("handover").join("00-INDEX.md").exists());
    }

    #[test]
    fn analyze_runs_without_any_llm_configuration() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("lib.rs"), "pub fn f() {}").unwrap();

        let config = HandoverConfig::default();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let result = rt.block_on(analyze(dir.path(), &config)).unwrap();
        assert_eq!(result.metadata.file_count, 1);
    }

    #[test]
    fn carry_over_is_empty_when_no_deps_completed() {
        let outputs = StepOutputs::default();
        assert_eq!(build_carry_over(&[1, 2], &outputs), "");
    }
}
