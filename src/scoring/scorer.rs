//! Scorer (spec §4.5, C5): a 0-100 priority score per file from six weighted
//! factors. Keeps the teacher's statistical-module pattern (doc-commented
//! struct with named weight constants, `rayon`-parallel iteration over
//! files) but implements the weighted breakdown below instead of the
//! teacher's Bayesian feature normalization, which has no counterpart here.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analyzers::types::{FileEntry, StaticAnalysisResult};

/// Named weight constants (spec §4.5), exposed so callers and tests can
/// reference them directly rather than duplicating magic numbers.
pub const WEIGHT_ENTRY_POINT: u32 = 30;
pub const WEIGHT_IMPORT_PER_COUNT: u32 = 3;
pub const WEIGHT_IMPORT_MAX: u32 = 30;
pub const WEIGHT_EXPORT_PER_COUNT: u32 = 2;
pub const WEIGHT_EXPORT_MAX: u32 = 20;
pub const WEIGHT_GIT_ACTIVITY_PER_COMMIT: u32 = 1;
pub const WEIGHT_GIT_ACTIVITY_MAX: u32 = 10;
pub const WEIGHT_EDGE_CASES: u32 = 10;
pub const WEIGHT_CONFIG_FILE: u32 = 15;
pub const TEST_FILE_PENALTY: i32 = 15;
pub const BOOST_AMOUNT: i32 = 20;

const LOCK_FILE_NAMES: &[&str] = &[
    "package-lock.json", "yarn.lock", "Cargo.lock", "go.sum", "poetry.lock", "Pipfile.lock", "composer.lock",
];

const ENTRY_POINT_STEMS: &[&str] = &["index", "main", "app", "server", "cli"];

const CONFIG_FILE_PATTERNS: &[&str] = &[
    ".yaml", ".yml", ".toml", ".json", ".ini", ".cfg", ".conf",
];
const CONFIG_FILE_NAMES: &[&str] = &[
    "Dockerfile", "Makefile", ".env", ".gitignore", ".eslintrc", "tsconfig.json", "webpack.config.js",
];

const RELATIVE_EXT_SUFFIXES: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".py", ".go", ".rs", "/index.ts", "/index.js"];

/// Per-file score breakdown (spec §3 FilePriority).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub entry_point: u32,
    pub import_count: u32,
    pub export_count: u32,
    pub git_activity: u32,
    pub edge_cases: u32,
    pub config_file: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilePriority {
    pub path: String,
    pub score: u32,
    pub breakdown: ScoreBreakdown,
}

/// Computes priority scores for every non-lockfile entry in the discovered
/// file tree (spec §4.5: "per non-lockfile entry in the file tree"),
/// sorted `(score desc, path asc)` (spec §4.5/§5, an observable ordering
/// contract). `files` is the complete set `FileDiscovery` produced; the
/// other four factors are signals looked up from `analysis` per candidate.
pub fn score_files(files: &[FileEntry], analysis: &StaticAnalysisResult, boosted_paths: &HashSet<String>) -> Vec<FilePriority> {
    let reverse_imports = build_reverse_import_map(analysis);
    let export_counts = build_export_count_map(analysis);
    let git_activity = build_git_activity_map(analysis);
    let todo_files = build_todo_file_set(analysis);

    let candidate_paths: HashSet<String> = files.iter().map(|f| f.relative_path.clone()).collect();

    let mut priorities: Vec<FilePriority> = candidate_paths
        .into_par_iter()
        .filter(|path| !is_lock_file(path))
        .map(|path| {
            let entry_point = if is_entry_point(&path) { WEIGHT_ENTRY_POINT } else { 0 };

            let import_count = (reverse_imports.get(&path).copied().unwrap_or(0) * WEIGHT_IMPORT_PER_COUNT)
                .min(WEIGHT_IMPORT_MAX);

            let export_count = (export_counts.get(&path).copied().unwrap_or(0) * WEIGHT_EXPORT_PER_COUNT)
                .min(WEIGHT_EXPORT_MAX);

            let git_activity_score =
                (git_activity.get(&path).copied().unwrap_or(0) * WEIGHT_GIT_ACTIVITY_PER_COMMIT).min(WEIGHT_GIT_ACTIVITY_MAX);

            let edge_cases = if todo_files.contains(&path) { WEIGHT_EDGE_CASES } else { 0 };
            let config_file = if is_config_file(&path) { WEIGHT_CONFIG_FILE } else { 0 };

            let breakdown = ScoreBreakdown {
                entry_point,
                import_count,
                export_count,
                git_activity: git_activity_score,
                edge_cases,
                config_file,
            };

            let mut total = (breakdown.entry_point
                + breakdown.import_count
                + breakdown.export_count
                + breakdown.git_activity
                + breakdown.edge_cases
                + breakdown.config_file) as i32;

            if is_test_file(&path) {
                total -= TEST_FILE_PENALTY;
            }

            if boosted_paths.contains(&path) {
                total += BOOST_AMOUNT;
            }

            let score = total.clamp(0, 100) as u32;

            FilePriority { path, score, breakdown }
        })
        .collect();

    priorities.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
    priorities
}

fn is_lock_file(path: &str) -> bool {
    let basename = std::path::Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or(path);
    LOCK_FILE_NAMES.contains(&basename)
}

fn is_entry_point(path: &str) -> bool {
    let p = std::path::Path::new(path);
    let stem = p.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    if !ENTRY_POINT_STEMS.contains(&stem) {
        return false;
    }
    let parent = p.parent().map(|p| p.to_string_lossy().to_string()).unwrap_or_default();
    parent.is_empty() || parent == "src"
}

fn is_config_file(path: &str) -> bool {
    let basename = std::path::Path::new(path).file_name().and_then(|n| n.to_str()).unwrap_or(path);
    if CONFIG_FILE_NAMES.contains(&basename) {
        return true;
    }
    CONFIG_FILE_PATTERNS.iter().any(|ext| basename.ends_with(ext))
}

fn is_test_file(path: &str) -> bool {
    path.contains(".test.") || path.contains(".spec.") || path.contains("__tests__/")
}

fn build_reverse_import_map(analysis: &StaticAnalysisResult) -> HashMap<String, u32> {
    let known_paths: HashSet<&str> = analysis.ast.files.iter().map(|f| f.path.as_str()).collect();
    let mut counts: HashMap<String, u32> = HashMap::new();

    for file in &analysis.ast.files {
        let file_dir = std::path::Path::new(&file.path).parent();

        for import in &file.imports {
            if !(import.source.starts_with('.') || import.source.starts_with("..")) {
                continue;
            }

            if let Some(resolved) = resolve_relative_import(file_dir, &import.source, &known_paths) {
                *counts.entry(resolved).or_insert(0) += 1;
            }
        }
    }

    counts
}

fn resolve_relative_import(base_dir: Option<&std::path::Path>, specifier: &str, known: &HashSet<&str>) -> Option<String> {
    let base_dir = base_dir.unwrap_or_else(|| std::path::Path::new(""));
    let joined = base_dir.join(specifier);
    let joined_str = normalize_path(&joined);

    for suffix in RELATIVE_EXT_SUFFIXES {
        let candidate = format!("{joined_str}{suffix}");
        if known.contains(candidate.as_str()) {
            return Some(candidate);
        }
    }

    if known.contains(joined_str.as_str()) {
        return Some(joined_str);
    }

    None
}

fn normalize_path(path: &std::path::Path) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                parts.pop();
            }
            std::path::Component::Normal(s) => {
                if let Some(s) = s.to_str() {
                    parts.push(s);
                }
            }
            _ => {}
        }
    }
    parts.join("/")
}

fn build_export_count_map(analysis: &StaticAnalysisResult) -> HashMap<String, u32> {
    analysis
        .ast
        .files
        .iter()
        .map(|f| (f.path.clone(), f.exports.len() as u32))
        .collect()
}

fn build_git_activity_map(analysis: &StaticAnalysisResult) -> HashMap<String, u32> {
    analysis
        .git_history
        .most_changed_files
        .iter()
        .map(|f| (f.path.clone(), f.change_count as u32))
        .collect()
}

fn build_todo_file_set(analysis: &StaticAnalysisResult) -> HashSet<String> {
    analysis.todos.items.iter().map(|i| i.file.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::ParsedFile;

    fn file_entry(path: &str) -> FileEntry {
        FileEntry { relative_path: path.to_string(), absolute_path: path.to_string(), size: 100, extension: String::new() }
    }

    fn analysis_with_single_ast_file(path: &str) -> StaticAnalysisResult {
        let mut analysis = StaticAnalysisResult::default();
        analysis.ast = crate::analyzers::types::AstResult {
            files: vec![ParsedFile {
                path: path.to_string(),
                line_count: 1,
                imports: Vec::new(),
                exports: Vec::new(),
                functions: Vec::new(),
                classes: Vec::new(),
            }],
            summary: Default::default(),
        };
        analysis
    }

    /// Spec §8 scenario 1: a lockfile and `index.ts`, no AST/git/TODOs
    /// anywhere — the lockfile is excluded outright and `index.ts` scores
    /// purely on its entry-point match.
    #[test]
    fn lockfile_exclusion() {
        let files = vec![file_entry("package-lock.json"), file_entry("index.ts")];
        let analysis = StaticAnalysisResult::default();

        let scored = score_files(&files, &analysis, &HashSet::new());
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].path, "index.ts");
        assert_eq!(scored[0].score, 30);
        assert_eq!(scored[0].breakdown.entry_point, 30);
    }

    /// Spec §8 scenario 2: `b.ts`, `a.ts`, `index.ts`, none of them scoring
    /// on anything but the entry-point factor — ties break alphabetically.
    #[test]
    fn tie_break_ordering() {
        let files = vec![file_entry("b.ts"), file_entry("a.ts"), file_entry("index.ts")];
        let analysis = StaticAnalysisResult::default();

        let scored = score_files(&files, &analysis, &HashSet::new());
        let paths: Vec<&str> = scored.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["index.ts", "a.ts", "b.ts"]);
    }

    #[test]
    fn score_never_exceeds_bounds() {
        let files = vec![file_entry("src/index.ts")];
        let analysis = analysis_with_single_ast_file("src/index.ts");
        let scored = score_files(&files, &analysis, &HashSet::new());
        for p in scored {
            assert!(p.score <= 100);
        }
    }

    #[test]
    fn boost_adds_twenty_to_listed_paths() {
        let files = vec![file_entry("src/util.ts")];
        let analysis = StaticAnalysisResult::default();
        let mut boosted = HashSet::new();
        boosted.insert("src/util.ts".to_string());

        let scored = score_files(&files, &analysis, &boosted);
        assert_eq!(scored[0].score, 20);
    }

    #[test]
    fn files_absent_from_every_analyzer_still_score_zero_not_missing() {
        let files = vec![file_entry("src/quiet.ts")];
        let analysis = StaticAnalysisResult::default();
        let scored = score_files(&files, &analysis, &HashSet::new());
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].score, 0);
    }
}
