//! TodoScanner analyzer (spec §4.3 item 4). Marker vocabulary borrowed in
//! spirit from the teacher's `doc_audit` crate (`TODO_MARKERS` constant),
//! expanded to the full category set spec.md requires.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult, FILE_READ_BATCH_SIZE};
use crate::analyzers::types::{TodoCategory, TodoItem, TodoSummary, TodosResult};
use crate::core::file_utils::FileReader;

static ISSUE_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(#\d+|[A-Z]{2,}-\d+)").unwrap());

fn marker_category(marker: &str) -> Option<TodoCategory> {
    match marker {
        "FIXME" | "HACK" | "XXX" => Some(TodoCategory::Bugs),
        "TODO" => Some(TodoCategory::Tasks),
        "NOTE" | "WARN" => Some(TodoCategory::Notes),
        "DEPRECATED" | "TEMP" => Some(TodoCategory::Debt),
        "OPTIMIZE" | "REVIEW" => Some(TodoCategory::Optimization),
        _ => None,
    }
}

const MARKERS: &[&str] = &[
    "FIXME", "HACK", "XXX", "TODO", "NOTE", "WARN", "DEPRECATED", "TEMP", "OPTIMIZE", "REVIEW",
];

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerResult<TodosResult> {
    let started = Instant::now();

    let mut items = Vec::new();

    for chunk in ctx.files.chunks(FILE_READ_BATCH_SIZE) {
        for entry in chunk {
            let path = ctx.absolute(&entry.relative_path);
            let Ok(content) = FileReader::read_to_string(&path) else { continue };

            for (line_idx, line) in content.lines().enumerate() {
                for marker in MARKERS {
                    if let Some(pos) = line.find(marker) {
                        let Some(category) = marker_category(marker) else { continue };
                        let text = line[pos..].trim().to_string();
                        let issue_refs = ISSUE_REF_RE
                            .find_iter(line)
                            .map(|m| m.as_str().to_string())
                            .collect();

                        items.push(TodoItem {
                            marker: marker.to_string(),
                            category,
                            text,
                            file: entry.relative_path.clone(),
                            line: line_idx + 1,
                            issue_refs,
                        });
                        break;
                    }
                }
            }
        }
    }

    let mut by_category = std::collections::HashMap::new();
    for item in &items {
        let key = format!("{:?}", item.category).to_lowercase();
        *by_category.entry(key).or_insert(0) += 1;
    }

    let summary = TodoSummary { total: items.len(), by_category };

    AnalyzerResult::ok(TodosResult { items, summary }, started)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    fn ctx_with_file(dir: &TempDir, name: &str, content: &str) -> AnalysisContext {
        std::fs::write(dir.path().join(name), content).unwrap();
        let files = vec![FileEntry {
            relative_path: name.to_string(),
            absolute_path: dir.path().join(name).to_string_lossy().into_owned(),
            size: content.len() as u64,
            extension: format!(".{}", name.rsplit('.').next().unwrap_or("")),
        }];
        AnalysisContext::new(dir.path().to_path_buf(), files, HandoverConfig::default(), AnalysisCache::load(dir.path()))
    }

    #[test]
    fn categorizes_markers_and_extracts_issue_refs() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_file(
            &dir,
            "a.rs",
            "// FIXME(#123): broken\n// TODO(JIRA-456): do this\n// NOTE: fyi\n",
        );

        let result = analyze(&ctx);
        assert!(result.success);
        let data = result.data.unwrap();
        assert_eq!(data.items.len(), 3);
        assert_eq!(data.summary.total, 3);

        let fixme = data.items.iter().find(|i| i.marker == "FIXME").unwrap();
        assert_eq!(fixme.category, TodoCategory::Bugs);
        assert_eq!(fixme.issue_refs, vec!["#123".to_string()]);

        let todo = data.items.iter().find(|i| i.marker == "TODO").unwrap();
        assert_eq!(todo.category, TodoCategory::Tasks);
        assert_eq!(todo.issue_refs, vec!["JIRA-456".to_string()]);

        let note = data.items.iter().find(|i| i.marker == "NOTE").unwrap();
        assert_eq!(note.category, TodoCategory::Notes);
    }

    #[test]
    fn no_markers_produces_empty_result() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_file(&dir, "clean.rs", "fn main() {}\n");

        let result = analyze(&ctx);
        assert!(result.success);
        let data = result.data.unwrap();
        assert!(data.items.is_empty());
        assert_eq!(data.summary.total, 0);
    }

    #[test]
    fn line_numbers_are_one_indexed() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_file(&dir, "b.rs", "fn a() {}\n// TODO: second line\n");

        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.items[0].line, 2);
    }
}
