//! Docs analyzer (spec §4.3 item 8). README/docs-folder detection borrowed
//! from the teacher's `doc_audit` crate (`README_CANDIDATES`); inline-doc
//! coverage uses a leading-comment-block heuristic in the same spirit as
//! that crate's incomplete-doc detection.

use std::time::Instant;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult};
use crate::analyzers::types::{DocsResult, DocsSummary, InlineDocCoverage};
use crate::core::file_utils::FileReader;

const README_CANDIDATES: &[&str] = &["README", "README.md", "README.rst", "README.txt", "readme.md", "Readme.md"];
const DOC_EXTENSIONS: &[&str] = &[".md", ".rst", ".txt"];
const CODE_EXTENSIONS: &[&str] = &[".rs", ".py", ".ts", ".tsx", ".js", ".jsx", ".go"];

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerResult<DocsResult> {
    let started = Instant::now();

    let mut readme_paths = Vec::new();
    let mut doc_files = Vec::new();
    let mut docs_folder = None;

    for entry in ctx.files.iter() {
        let basename = std::path::Path::new(&entry.relative_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if README_CANDIDATES.contains(&basename) {
            readme_paths.push(entry.relative_path.clone());
        }

        if DOC_EXTENSIONS.contains(&entry.extension.as_str()) {
            doc_files.push(entry.relative_path.clone());
        }

        if docs_folder.is_none() && entry.relative_path.starts_with("docs/") {
            docs_folder = Some("docs".to_string());
        }
    }

    let code_files: Vec<_> = ctx
        .files
        .iter()
        .filter(|f| CODE_EXTENSIONS.contains(&f.extension.as_str()))
        .collect();

    let mut files_with_docs = 0;
    for entry in &code_files {
        let path = ctx.absolute(&entry.relative_path);
        if let Ok(content) = FileReader::read_to_string(&path) {
            if has_leading_doc_comment(&content) {
                files_with_docs += 1;
            }
        }
    }

    let total_files = code_files.len();
    let percentage = if total_files == 0 {
        0.0
    } else {
        (files_with_docs as f64 / total_files as f64) * 100.0
    };

    let summary = DocsSummary {
        has_readme: !readme_paths.is_empty(),
        has_docs_folder: docs_folder.is_some(),
        doc_file_count: doc_files.len(),
    };

    AnalyzerResult::ok(
        DocsResult {
            readme_paths,
            docs_folder,
            doc_files,
            inline_doc_coverage: InlineDocCoverage { files_with_docs, total_files, percentage },
            summary,
        },
        started,
    )
}

/// A leading block of `//`, `///`, `//!`, `#`, or `"""` lines before the
/// first non-comment, non-blank line counts as documentation.
fn has_leading_doc_comment(content: &str) -> bool {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with("\"\"\"") || trimmed.starts_with("/*");
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    fn ctx_with_files(dir: &TempDir, files: &[(&str, &str)]) -> AnalysisContext {
        let mut entries = Vec::new();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(&path, content).unwrap();
            entries.push(FileEntry {
                relative_path: name.to_string(),
                absolute_path: path.to_string_lossy().into_owned(),
                size: content.len() as u64,
                extension: format!(".{}", name.rsplit('.').next().unwrap_or("")),
            });
        }
        AnalysisContext::new(dir.path().to_path_buf(), entries, HandoverConfig::default(), AnalysisCache::load(dir.path()))
    }

    #[test]
    fn detects_readme_and_docs_folder() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_files(
            &dir,
            &[("README.md", "# Title\n"), ("docs/guide.md", "guide\n"), ("src/lib.rs", "fn a() {}\n")],
        );

        let data = analyze(&ctx).data.unwrap();
        assert!(data.summary.has_readme);
        assert!(data.summary.has_docs_folder);
        assert_eq!(data.readme_paths, vec!["README.md".to_string()]);
    }

    #[test]
    fn inline_doc_coverage_counts_leading_comment_blocks() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_files(
            &dir,
            &[("a.rs", "/// docs\nfn a() {}\n"), ("b.rs", "fn b() {}\n")],
        );

        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.inline_doc_coverage.total_files, 2);
        assert_eq!(data.inline_doc_coverage.files_with_docs, 1);
        assert_eq!(data.inline_doc_coverage.percentage, 50.0);
    }

    #[test]
    fn no_code_files_yields_zero_percentage_not_nan() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_files(&dir, &[("README.md", "# hi\n")]);

        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.inline_doc_coverage.total_files, 0);
        assert_eq!(data.inline_doc_coverage.percentage, 0.0);
    }

    #[test]
    fn leading_doc_comment_detects_common_styles() {
        assert!(has_leading_doc_comment("// comment\nfn a(){}"));
        assert!(has_leading_doc_comment("\"\"\"docstring\"\"\"\ndef a(): pass"));
        assert!(!has_leading_doc_comment("fn a(){}\n// trailing comment\n"));
    }
}
