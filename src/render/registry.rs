//! Document registry (spec §4.14/§4.15, C15): the fixed table of 14
//! documents, their aliases and group memberships, and the selection/round
//! resolution logic the pipeline uses to honor `--only`. Grounded on the
//! teacher's `bin/cli/output/mod.rs` report-selection table, which maps a
//! small set of CLI-facing names onto concrete renderer functions the same
//! way this registry maps document and group aliases onto `DocumentSpec`s.

use crate::core::errors::{HandoverError, Result};
use crate::render::documents::{
    render_architecture, render_contributing, render_conventions, render_dependencies, render_deployment, render_edge_cases, render_environment,
    render_features, render_index, render_modules, render_onboarding, render_operations, render_overview, render_testing, RenderedDocument,
};
use crate::render::types::RenderContext;
use crate::rounds::types::expand_round_deps;

/// Static description of one renderable document.
pub struct DocumentSpec {
    pub id: &'static str,
    pub filename: &'static str,
    pub aliases: &'static [&'static str],
    /// Direct (non-transitive) round numbers this document draws from.
    /// Expanded to their full dependency set via `expand_round_deps`.
    pub required_rounds: &'static [u8],
    pub render: fn(&RenderContext) -> RenderedDocument,
}

/// Named groups of documents, resolved the same way a single alias is (spec
/// §4.15 `--only core`, `--only ops`, ...).
pub struct DocumentGroup {
    pub name: &'static str,
    pub members: &'static [&'static str],
}

pub const GROUPS: &[DocumentGroup] = &[
    DocumentGroup { name: "core", members: &["02-modules", "03-architecture", "04-features"] },
    DocumentGroup { name: "ops", members: &["12-operations", "13-deployment"] },
    DocumentGroup { name: "onboard", members: &["01-overview", "10-onboarding"] },
    DocumentGroup { name: "quality", members: &["06-conventions", "07-edge-cases", "08-testing"] },
];

/// Every document the pipeline can render, excluding `00-INDEX` which is
/// always rendered last and is not itself selectable (spec §4.14).
pub const REGISTRY: &[DocumentSpec] = &[
    DocumentSpec { id: "01-overview", filename: "01-OVERVIEW.md", aliases: &["overview"], required_rounds: &[1], render: render_overview },
    DocumentSpec { id: "02-modules", filename: "02-MODULES.md", aliases: &["modules"], required_rounds: &[1, 5], render: render_modules },
    DocumentSpec { id: "03-architecture", filename: "03-ARCHITECTURE.md", aliases: &["arch", "architecture"], required_rounds: &[4], render: render_architecture },
    DocumentSpec { id: "04-features", filename: "04-FEATURES.md", aliases: &["features"], required_rounds: &[3], render: render_features },
    DocumentSpec { id: "05-dependencies", filename: "05-DEPENDENCIES.md", aliases: &["deps", "dependencies"], required_rounds: &[], render: render_dependencies },
    DocumentSpec { id: "06-conventions", filename: "06-CONVENTIONS.md", aliases: &["conventions"], required_rounds: &[4], render: render_conventions },
    DocumentSpec { id: "07-edge-cases", filename: "07-EDGE-CASES.md", aliases: &["edge-cases"], required_rounds: &[4], render: render_edge_cases },
    DocumentSpec { id: "08-testing", filename: "08-TESTING.md", aliases: &["testing"], required_rounds: &[], render: render_testing },
    DocumentSpec { id: "09-environment", filename: "09-ENVIRONMENT.md", aliases: &["environment", "env"], required_rounds: &[6], render: render_environment },
    DocumentSpec { id: "10-onboarding", filename: "10-ONBOARDING.md", aliases: &["onboarding"], required_rounds: &[1, 2, 3], render: render_onboarding },
    DocumentSpec { id: "11-contributing", filename: "11-CONTRIBUTING.md", aliases: &["contributing"], required_rounds: &[4], render: render_contributing },
    DocumentSpec { id: "12-operations", filename: "12-OPERATIONS.md", aliases: &["operations", "ops"], required_rounds: &[6], render: render_operations },
    DocumentSpec { id: "13-deployment", filename: "13-DEPLOYMENT.md", aliases: &["deployment"], required_rounds: &[6], render: render_deployment },
];

fn find_by_name<'a>(name: &str) -> Option<&'a DocumentSpec> {
    REGISTRY.iter().find(|doc| doc.id == name || doc.aliases.contains(&name))
}

fn find_group<'a>(name: &str) -> Option<&'a DocumentGroup> {
    GROUPS.iter().find(|group| group.name == name)
}

/// All valid alias/group/id names, for error messages.
fn known_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    for doc in REGISTRY {
        names.push(doc.id);
        names.extend(doc.aliases.iter().copied());
    }
    for group in GROUPS {
        names.push(group.name);
    }
    names
}

/// Resolves a `--only` selection into a deduplicated, registry-order list of
/// document ids. `None` selects every document (spec §4.15: "undefined
/// selects the complete set"). An unknown alias is an error naming the bad
/// token and listing the valid ones.
pub fn resolve_selected_docs(selection: Option<&[String]>) -> Result<Vec<&'static str>> {
    let Some(requested) = selection else {
        return Ok(REGISTRY.iter().map(|doc| doc.id).collect());
    };

    let mut selected_ids: Vec<&'static str> = Vec::new();
    for token in requested {
        if let Some(doc) = find_by_name(token) {
            if !selected_ids.contains(&doc.id) {
                selected_ids.push(doc.id);
            }
            continue;
        }
        if let Some(group) = find_group(token) {
            for member in group.members {
                let doc = find_by_name(member).expect("group members must name registered documents");
                if !selected_ids.contains(&doc.id) {
                    selected_ids.push(doc.id);
                }
            }
            continue;
        }

        return Err(HandoverError::config(format!("unknown document selector '{token}'; valid selectors are: {}", known_names().join(", "))));
    }

    // Preserve registry order regardless of the order tokens were requested in.
    let mut ordered: Vec<&'static str> = REGISTRY.iter().map(|doc| doc.id).filter(|id| selected_ids.contains(id)).collect();
    ordered.sort_by_key(|id| REGISTRY.iter().position(|doc| &doc.id == id).unwrap());
    Ok(ordered)
}

/// Computes the full set of rounds (including transitive dependencies) that
/// must run to satisfy `selection`'s documents (spec §4.13/§4.15).
pub fn compute_required_rounds(selected_ids: &[&'static str]) -> Vec<u8> {
    let mut direct: Vec<u8> = Vec::new();
    for id in selected_ids {
        if let Some(doc) = REGISTRY.iter().find(|doc| &doc.id == id) {
            direct.extend(doc.required_rounds.iter().copied());
        }
    }
    expand_round_deps(&direct)
}

/// Renders every selected document plus the always-present index (spec
/// §4.14: "the index is rendered last, after every other document,
/// incorporating each one's resolved status").
pub fn render_selected(ctx: &RenderContext, selected_ids: &[&'static str]) -> Vec<RenderedDocument> {
    let mut documents: Vec<RenderedDocument> = REGISTRY
        .iter()
        .filter(|doc| selected_ids.contains(&doc.id))
        .map(|doc| (doc.render)(ctx))
        .collect();

    let index = render_index(ctx, &documents);
    documents.push(index);
    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_selection_returns_every_document() {
        let ids = resolve_selected_docs(None).unwrap();
        assert_eq!(ids.len(), REGISTRY.len());
    }

    #[test]
    fn alias_resolves_to_canonical_id() {
        let ids = resolve_selected_docs(Some(&["arch".to_string()])).unwrap();
        assert_eq!(ids, vec!["03-architecture"]);
    }

    #[test]
    fn group_expands_to_its_members_in_registry_order() {
        let ids = resolve_selected_docs(Some(&["core".to_string()])).unwrap();
        assert_eq!(ids, vec!["02-modules", "03-architecture", "04-features"]);
    }

    #[test]
    fn unknown_selector_is_an_error_naming_the_bad_token() {
        let err = resolve_selected_docs(Some(&["bogus".to_string()])).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[test]
    fn round_four_selection_pulls_in_its_transitive_dependencies() {
        let rounds = compute_required_rounds(&["03-architecture"]);
        assert_eq!(rounds, vec![1, 2, 3, 4]);
    }

    #[test]
    fn dependencies_and_testing_require_no_rounds() {
        assert!(compute_required_rounds(&["05-dependencies", "08-testing"]).is_empty());
    }
}
