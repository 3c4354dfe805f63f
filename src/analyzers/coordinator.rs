//! AnalysisCoordinator (spec §4.3/§4.4, C4). Launches all eight analyzers
//! concurrently and assembles a `StaticAnalysisResult`. Grounded on the
//! teacher's staged pipeline executor (`core/pipeline/pipeline_executor.rs`),
//! generalized from a sequential stage list to fixed 8-way fan-out with
//! per-analyzer isolation.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{info, warn};

use crate::analyzers::ast::ParserRegistry;
use crate::analyzers::context::AnalysisContext;
use crate::analyzers::types::{AnalysisMetadata, StaticAnalysisResult};
use crate::analyzers::{dependencies, docs, env_scanner, file_tree, git_history, tests_analyzer, todos};

/// Runs all eight analyzers concurrently and waits for every one to finish.
/// A single analyzer's failure never discards the others: the coordinator
/// substitutes that analyzer's default sentinel and logs a warning.
pub async fn run(ctx: AnalysisContext, parser_registry: Arc<ParserRegistry>) -> StaticAnalysisResult {
    let started = Instant::now();
    let file_count = ctx.files.len();

    let ctx_file_tree = ctx.clone();
    let ctx_deps = ctx.clone();
    let ctx_git = ctx.clone();
    let ctx_todos = ctx.clone();
    let ctx_env = ctx.clone();
    let ctx_ast = ctx.clone();
    let ctx_tests = ctx.clone();
    let ctx_docs = ctx.clone();

    let (file_tree_res, deps_res, git_res, todos_res, env_res, ast_res, tests_res, docs_res) = tokio::join!(
        tokio::task::spawn_blocking(move || file_tree::analyze(&ctx_file_tree)),
        tokio::task::spawn_blocking(move || dependencies::analyze(&ctx_deps)),
        tokio::task::spawn_blocking(move || git_history::analyze(&ctx_git)),
        tokio::task::spawn_blocking(move || todos::analyze(&ctx_todos)),
        tokio::task::spawn_blocking(move || env_scanner::analyze(&ctx_env)),
        tokio::task::spawn_blocking(move || { let r = parser_registry; crate::analyzers::ast::analyze(&ctx_ast, &r) }),
        tokio::task::spawn_blocking(move || tests_analyzer::analyze(&ctx_tests)),
        tokio::task::spawn_blocking(move || docs::analyze(&ctx_docs)),
    );

    let file_tree = unwrap_or_warn("file_tree", file_tree_res);
    let dependencies = unwrap_or_warn("dependencies", deps_res);
    let git_history = unwrap_or_warn("git_history", git_res);
    let todos = unwrap_or_warn("todos", todos_res);
    let env = unwrap_or_warn("env", env_res);
    let ast = unwrap_or_warn("ast", ast_res);
    let tests = unwrap_or_warn("tests", tests_res);
    let docs = unwrap_or_warn("docs", docs_res);

    let metadata = AnalysisMetadata {
        analyzed_at: Utc::now().to_rfc3339(),
        root_dir: ctx.root.to_string_lossy().into_owned(),
        file_count,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    info!(elapsed_ms = metadata.elapsed_ms, files = file_count, "analysis coordinator finished");

    StaticAnalysisResult {
        file_tree,
        dependencies,
        git_history,
        todos,
        env,
        ast,
        tests,
        docs,
        metadata,
    }
}

/// Unwraps a spawned analyzer task's result into its success payload,
/// falling back to the default sentinel on a task join failure (panic) or
/// on the analyzer's own reported failure.
fn unwrap_or_warn<T: Default>(
    name: &str,
    joined: std::result::Result<crate::analyzers::context::AnalyzerResult<T>, tokio::task::JoinError>,
) -> T {
    match joined {
        Ok(result) => {
            if !result.success {
                warn!(analyzer = name, error = ?result.error, "analyzer failed, using empty sentinel");
            }
            result.into_data()
        }
        Err(err) => {
            warn!(analyzer = name, error = %err, "analyzer task panicked, using empty sentinel");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn assembles_result_from_all_eight_analyzers() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.rs"), "// TODO: finish\nfn a() {}\n").unwrap();

        let files = vec![FileEntry {
            relative_path: "a.rs".into(),
            absolute_path: dir.path().join("a.rs").to_string_lossy().into_owned(),
            size: 20,
            extension: ".rs".into(),
        }];

        let ctx = AnalysisContext::new(dir.path().to_path_buf(), files, HandoverConfig::default(), AnalysisCache::load(dir.path()));
        let registry = Arc::new(ParserRegistry::new());

        let result = run(ctx, registry).await;

        assert_eq!(result.metadata.file_count, 1);
        assert_eq!(result.file_tree.totals.files, 1);
        assert_eq!(result.todos.items.len(), 1);
        assert!(!result.git_history.is_git_repo);
    }
}
