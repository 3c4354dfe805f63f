//! # handover-core: analysis & synthesis engine
//!
//! The engine behind a documentation-generation tool that turns a source
//! repository into a set of cross-referenced Markdown handover documents.
//! It is organized as a directed-acyclic pipeline:
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────┐   ┌───────────┐
//! │ FileDiscovery│──▶│   Analyzers   │──▶│   Scorer   │──▶│  Packer   │
//! │  + hash cache│   │  (8, parallel)│   │ (priority) │   │ (budgeted)│
//! └──────────────┘   └───────────────┘   └────────────┘   └─────┬─────┘
//!                                                                 │
//!        ┌────────────────────────────────────────────────────────┘
//!        ▼
//! ┌──────────────┐   ┌───────────────┐   ┌────────────┐
//! │ DAGOrchestrator│▶│  RoundRunner  │──▶│ Renderers  │──▶ disk
//! │ (rounds 1..6)  │  │ (provider,    │   │ (14 docs)  │
//! │                │  │  cache, retry)│   │            │
//! └──────────────┘   └───────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use handover_core::core::config::HandoverConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HandoverConfig::default();
//!     config.validate()?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

/// Core error types, configuration, and file-reading utilities.
pub mod core {
    //! Error handling, configuration, and shared file utilities.

    pub mod config;
    pub mod errors;
    pub mod file_utils;
}

/// C1: repository file discovery and content-hash caching input.
pub mod discovery {
    //! File enumeration, ignore-rule filtering, and binary/size exclusion.

    pub mod file_discovery;
}

/// C2 + C9: on-disk caches (analysis hash cache, round crash-recovery cache).
pub mod cache {
    //! Content-hash-keyed persistence used for incremental runs and
    //! crash-recovery between LLM rounds.

    pub mod analysis_cache;
    pub mod round_cache;
}

/// C3 + C4: the eight static analyzers and their coordinator.
pub mod analyzers {
    //! Independent extractors producing a `StaticAnalysisResult`, run
    //! concurrently with per-analyzer isolation.

    pub mod ast;
    pub mod context;
    pub mod coordinator;
    pub mod dependencies;
    pub mod docs;
    pub mod env_scanner;
    pub mod file_tree;
    pub mod git_history;
    pub mod tests_analyzer;
    pub mod todos;
    pub mod types;
}

/// C5: file-priority scorer.
pub mod scoring {
    //! Six-factor weighted priority scoring over discovered files.

    pub mod scorer;
}

/// C6: token estimation and budget derivation.
pub mod tokens {
    //! Token estimation and provider-context-derived file-content budgets.

    pub mod budget;
}

/// C7: greedy tiered context packer.
pub mod packer {
    //! Token-budgeted, tiered (full/signatures/skip) file content packing.

    pub mod context_packer;
}

/// C8 + C13: inter-round compression and round execution.
pub mod rounds {
    //! LLM analysis round execution: prompt assembly, provider calls,
    //! validation, degraded-result handling, and deterministic inter-round
    //! context compression.

    pub mod compressor;
    pub mod runner;
    pub mod schemas;
    pub mod types;
}

/// C10: multi-provider LLM abstraction.
pub mod provider {
    //! Unified `LLMProvider` capability with Anthropic-native and
    //! OpenAI-compatible implementations, plus the static preset registry.

    pub mod anthropic;
    pub mod factory;
    pub mod openai_compat;
    pub mod presets;
    pub mod types;
}

/// C11: credential resolution and token storage.
pub mod auth {
    //! Per-provider credential precedence chain and the on-disk token store.

    pub mod credentials;
    pub mod resolve;
}

/// C12: concurrency bounding and retry policy.
pub mod concurrency {
    //! Semaphore-bounded provider concurrency and exponential-backoff retry.

    pub mod rate_limiter;
}

/// C14: the DAG step orchestrator.
pub mod dag {
    //! Topological step execution with failure/skip/degrade propagation.

    pub mod orchestrator;
}

/// C15: document renderers and the document registry.
pub mod render {
    //! Deterministic Markdown rendering from a `RenderContext`, driven by a
    //! registry of `DocumentSpec`s with alias/group resolution.

    pub mod documents;
    pub mod registry;
    pub mod types;
}

/// C16: terminal progress presentation.
pub mod terminal {
    //! DAG/round event observer driving TTY and CI-mode progress display.

    pub mod renderer;
}

/// Top-level pipeline wiring: assembles C1-C16 into the `generate`,
/// `analyze`, and `estimate` entry points consumed by the CLI.
pub mod pipeline;

pub use core::errors::{HandoverError, Result, ResultExt};

/// Library version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
