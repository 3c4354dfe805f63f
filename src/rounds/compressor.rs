//! RoundCompressor (spec §4.7, C8). The only inter-round information flow:
//! no LLM is used to compress. Grounded on the teacher's cross-round
//! condensation function `oracle::condense_analysis_results_with_budget`
//! (progressive truncation against a token budget), generalized to the
//! deterministic field-extraction contract below.

use crate::rounds::types::{Relationship, RoundContext, RoundOutcome};
use crate::tokens::budget::estimate_tokens;

/// Raw (untruncated) fields pulled out of a round's payload, before the
/// progressive-truncation pass is applied.
struct RawFields {
    modules: Vec<String>,
    findings: Vec<String>,
    relationships: Vec<Relationship>,
    open_questions: Vec<String>,
}

/// Compresses a round's result into a token-bounded `RoundContext`, dropping
/// content in the order the lowest-priority carry-over first: open
/// questions, then findings (at least one kept if any existed), then
/// relationships, then module names (dropped last).
pub fn compress(outcome: &RoundOutcome, round_number: u8, token_ceiling: usize) -> RoundContext {
    let raw = extract(outcome);
    let had_findings = !raw.findings.is_empty();

    let mut modules = raw.modules;
    let mut findings = raw.findings;
    let mut relationships = raw.relationships;
    let mut open_questions = raw.open_questions;

    loop {
        let block = render_block(&modules, &findings, &relationships, &open_questions);
        let tokens = estimate_tokens(&block);
        if tokens <= token_ceiling {
            return RoundContext { round_number, findings, modules, relationships, open_questions, token_count: tokens };
        }

        if !open_questions.is_empty() {
            open_questions.pop();
            continue;
        }
        if findings.len() > if had_findings { 1 } else { 0 } {
            findings.pop();
            continue;
        }
        if !relationships.is_empty() {
            relationships.pop();
            continue;
        }
        if !modules.is_empty() {
            modules.pop();
            continue;
        }

        // Nothing left to drop; return the minimal block even if it still
        // exceeds the ceiling.
        let tokens = estimate_tokens(&render_block(&modules, &findings, &relationships, &open_questions));
        return RoundContext { round_number, findings, modules, relationships, open_questions, token_count: tokens };
    }
}

/// The multi-line labeled-section block text (same content as the returned
/// `RoundContext`, formatted for inclusion in a subsequent round's prompt).
pub fn render_block(modules: &[String], findings: &[String], relationships: &[Relationship], open_questions: &[String]) -> String {
    let mut out = String::new();

    if !modules.is_empty() {
        out.push_str("## Modules\n");
        for m in modules {
            out.push_str("- ");
            out.push_str(m);
            out.push('\n');
        }
        out.push('\n');
    }

    if !relationships.is_empty() {
        out.push_str("## Relationships\n");
        for r in relationships {
            out.push_str("- ");
            out.push_str(&r.to_line());
            out.push('\n');
        }
        out.push('\n');
    }

    if !findings.is_empty() {
        out.push_str("## Findings\n");
        for f in findings {
            out.push_str("- ");
            out.push_str(f);
            out.push('\n');
        }
        out.push('\n');
    }

    if !open_questions.is_empty() {
        out.push_str("## Open Questions\n");
        for q in open_questions {
            out.push_str("- ");
            out.push_str(q);
            out.push('\n');
        }
    }

    out.truncate(out.trim_end().len());
    out
}

fn extract(outcome: &RoundOutcome) -> RawFields {
    match outcome {
        RoundOutcome::Modules(r) => RawFields {
            modules: r.data.modules.iter().map(|m| m.name.clone()).collect(),
            findings: if r.data.summary.is_empty() { Vec::new() } else { vec![r.data.summary.clone()] },
            relationships: Vec::new(),
            open_questions: Vec::new(),
        },
        RoundOutcome::Architecture(r) => RawFields {
            modules: r.data.entry_points.clone(),
            findings: if r.data.overview.is_empty() { Vec::new() } else { vec![r.data.overview.clone()] },
            relationships: r.data.relationships.clone(),
            open_questions: Vec::new(),
        },
        RoundOutcome::Features(r) => RawFields {
            modules: r.data.features.iter().map(|f| f.name.clone()).collect(),
            findings: r.data.features.iter().map(|f| f.description.clone()).collect(),
            relationships: Vec::new(),
            open_questions: Vec::new(),
        },
        RoundOutcome::Conventions(r) => RawFields {
            modules: Vec::new(),
            findings: r.data.conventions.clone(),
            relationships: Vec::new(),
            open_questions: r.data.open_questions.clone(),
        },
        RoundOutcome::ModuleDeepDives(r) => {
            let mut modules = Vec::new();
            let mut findings = Vec::new();
            let mut relationships = Vec::new();
            for dive in &r.data {
                modules.push(dive.module.clone());
                findings.extend(dive.responsibilities.iter().cloned());
                findings.extend(dive.risks.iter().cloned());
                for dep in &dive.dependencies {
                    relationships.push(Relationship { from: dive.module.clone(), to: dep.clone(), kind: "depends-on".to_string() });
                }
            }
            RawFields { modules, findings, relationships, open_questions: Vec::new() }
        }
        RoundOutcome::Operations(r) => RawFields {
            modules: Vec::new(),
            findings: r
                .data
                .deployment_notes
                .iter()
                .cloned()
                .chain(r.data.observability_notes.iter().cloned())
                .collect(),
            relationships: Vec::new(),
            open_questions: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rounds::types::{ModuleInventory, ModuleSummary, RoundExecutionResult, TokenUsage};

    fn modules_outcome(names: &[&str]) -> RoundOutcome {
        let modules = names
            .iter()
            .map(|n| ModuleSummary { name: n.to_string(), path: n.to_string(), purpose: String::new(), key_files: Vec::new() })
            .collect();
        RoundOutcome::Modules(RoundExecutionResult::success(
            ModuleInventory { modules, summary: "overview".to_string() },
            TokenUsage::default(),
            None,
            0,
        ))
    }

    #[test]
    fn keeps_everything_within_budget() {
        let outcome = modules_outcome(&["auth", "core"]);
        let ctx = compress(&outcome, 1, 10_000);
        assert_eq!(ctx.modules, vec!["auth".to_string(), "core".to_string()]);
        assert_eq!(ctx.findings, vec!["overview".to_string()]);
    }

    #[test]
    fn truncates_to_fit_tiny_budget_without_panicking() {
        let outcome = modules_outcome(&["a", "b", "c", "d", "e"]);
        let ctx = compress(&outcome, 1, 1);
        assert!(ctx.modules.len() <= 5);
    }
}
