//! Tests analyzer (spec §4.3 item 7): detects test frameworks by
//! file/config patterns, counts test files, notes a coverage-data path.

use std::time::Instant;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult};
use crate::analyzers::types::{TestFile, TestsResult, TestsSummary};

struct FrameworkRule {
    name: &'static str,
    config_files: &'static [&'static str],
    file_suffixes: &'static [&'static str],
}

const FRAMEWORKS: &[FrameworkRule] = &[
    FrameworkRule { name: "jest", config_files: &["jest.config.js", "jest.config.ts"], file_suffixes: &[".test.js", ".test.ts", ".spec.js", ".spec.ts"] },
    FrameworkRule { name: "pytest", config_files: &["pytest.ini", "conftest.py"], file_suffixes: &["_test.py", "test_"] },
    FrameworkRule { name: "cargo-test", config_files: &[], file_suffixes: &[] },
    FrameworkRule { name: "go-test", config_files: &[], file_suffixes: &["_test.go"] },
    FrameworkRule { name: "vitest", config_files: &["vitest.config.ts", "vitest.config.js"], file_suffixes: &[] },
];

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerResult<TestsResult> {
    let started = Instant::now();

    let mut test_files = Vec::new();
    let mut config_files = Vec::new();
    let mut frameworks_found = std::collections::HashSet::new();
    let mut coverage_data_path = None;

    for entry in ctx.files.iter() {
        let basename = std::path::Path::new(&entry.relative_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        for rule in FRAMEWORKS {
            if rule.config_files.contains(&basename) {
                config_files.push(entry.relative_path.clone());
                frameworks_found.insert(rule.name.to_string());
            }
        }

        if entry.relative_path.contains("tests/") || entry.relative_path.contains("__tests__/") {
            let framework = detect_by_suffix(&entry.relative_path);
            if let Some(fw) = &framework {
                frameworks_found.insert(fw.clone());
            }
            test_files.push(TestFile { path: entry.relative_path.clone(), framework, test_count: None });
            continue;
        }

        if let Some(framework) = detect_by_suffix(&entry.relative_path) {
            frameworks_found.insert(framework.clone());
            test_files.push(TestFile { path: entry.relative_path.clone(), framework: Some(framework), test_count: None });
        } else if entry.extension == ".rs" {
            // Rust convention: #[cfg(test)] inline modules aren't separately
            // discoverable by path; skip unless inside a `tests/` directory.
        }

        if basename == "coverage.json" || basename == "lcov.info" || entry.relative_path.starts_with("coverage/") {
            coverage_data_path = Some(entry.relative_path.clone());
        }
    }

    if ctx.files.iter().any(|f| f.relative_path == "Cargo.toml") {
        frameworks_found.insert("cargo-test".to_string());
    }

    let mut frameworks: Vec<String> = frameworks_found.into_iter().collect();
    frameworks.sort();

    let summary = TestsSummary {
        total_test_files: test_files.len(),
        frameworks_detected: frameworks.len(),
    };

    AnalyzerResult::ok(
        TestsResult {
            test_files,
            frameworks,
            has_config: !config_files.is_empty(),
            config_files,
            coverage_data_path,
            summary,
        },
        started,
    )
}

fn detect_by_suffix(path: &str) -> Option<String> {
    for rule in FRAMEWORKS {
        for suffix in rule.file_suffixes {
            if path.ends_with(suffix) || path.contains(suffix) {
                return Some(rule.name.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    fn ctx_with_paths(dir: &TempDir, paths: &[&str]) -> AnalysisContext {
        let files = paths
            .iter()
            .map(|p| FileEntry {
                relative_path: p.to_string(),
                absolute_path: dir.path().join(p).to_string_lossy().into_owned(),
                size: 0,
                extension: format!(".{}", p.rsplit('.').next().unwrap_or("")),
            })
            .collect();
        AnalysisContext::new(dir.path().to_path_buf(), files, HandoverConfig::default(), AnalysisCache::load(dir.path()))
    }

    #[test]
    fn detects_jest_config_and_spec_files() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_paths(&dir, &["jest.config.js", "src/foo.test.js"]);

        let data = analyze(&ctx).data.unwrap();
        assert!(data.frameworks.contains(&"jest".to_string()));
        assert!(data.has_config);
        assert_eq!(data.test_files.len(), 1);
    }

    #[test]
    fn detects_go_test_suffix() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_paths(&dir, &["pkg/foo_test.go"]);

        let data = analyze(&ctx).data.unwrap();
        assert!(data.frameworks.contains(&"go-test".to_string()));
    }

    #[test]
    fn cargo_toml_presence_implies_cargo_test() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_paths(&dir, &["Cargo.toml", "src/lib.rs"]);

        let data = analyze(&ctx).data.unwrap();
        assert!(data.frameworks.contains(&"cargo-test".to_string()));
    }

    #[test]
    fn detects_coverage_data_path() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_paths(&dir, &["coverage/lcov.info"]);

        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.coverage_data_path, Some("coverage/lcov.info".to_string()));
    }

    #[test]
    fn no_test_signal_yields_empty_result() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_paths(&dir, &["src/lib.py"]);

        let data = analyze(&ctx).data.unwrap();
        assert!(data.test_files.is_empty());
        assert!(data.frameworks.is_empty());
    }
}
