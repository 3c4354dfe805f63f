//! Shared render data model: `RenderContext`, front matter, and document
//! status (spec §3/§4.14). Grounded on the teacher's `markdown_report.rs`
//! string-building style; front matter is hand-written YAML via
//! `serde_yaml::to_string` rather than templated, matching the teacher's
//! preference for direct construction over its Handlebars path when an exact
//! output contract is required.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analyzers::types::StaticAnalysisResult;
use crate::core::config::{Audience, HandoverConfig};
use crate::rounds::types::RoundResultsByNumber;

/// Everything a renderer needs, read-only (spec §3 Ownership: "the renderer
/// consumes everything read-only").
pub struct RenderContext<'a> {
    pub rounds: &'a RoundResultsByNumber,
    pub analysis: &'a StaticAnalysisResult,
    pub config: &'a HandoverConfig,
    pub audience: Audience,
    pub generated_at: String,
    pub project_name: String,
}

impl<'a> RenderContext<'a> {
    pub fn is_ai_audience(&self) -> bool {
        matches!(self.audience, Audience::Ai)
    }
}

/// Per-document availability status (spec §4.14 front matter, §8 testable
/// property "every document's status matches its data availability").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentStatus {
    Complete,
    Partial,
    StaticOnly,
    NotGenerated,
}

/// YAML-delimited front matter block prepended to every rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub document_id: String,
    pub category: String,
    pub project: String,
    pub generated_at: String,
    pub audience: String,
    pub ai_rounds_used: Vec<u8>,
    pub status: DocumentStatus,
}

impl FrontMatter {
    /// Renders the `---`-delimited block, including the header and summary
    /// paragraph that every document begins with (spec §4.14).
    pub fn render(&self, summary: &str) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        format!("---\n{yaml}---\n\n# {}\n\n{summary}\n\n", self.title)
    }
}

/// A fenced `mermaid` diagram block. Node ids are sanitized to
/// `[A-Za-z0-9_]+`; human labels are placed in quoted label syntax (spec
/// §4.14).
pub fn render_mermaid_block(diagram_kind: &str, edges: &[(String, String, String)]) -> String {
    let mut out = String::new();
    out.push_str("## Diagrams\n\n");
    out.push_str(&format!("```mermaid\n{diagram_kind}\n"));
    for (from, to, label) in edges {
        let from_id = sanitize_node_id(from);
        let to_id = sanitize_node_id(to);
        out.push_str(&format!(
            "    {from_id}[\"{}\"] -->|{}| {to_id}[\"{}\"]\n",
            escape_label(from),
            escape_label(label),
            escape_label(to),
        ));
    }
    out.push_str("```\n");
    out
}

/// Mermaid node identifiers must match `[A-Za-z0-9_]+`; non-matching
/// characters collapse to underscores and a leading digit gets an `n`
/// prefix so the identifier stays syntactically valid.
pub fn sanitize_node_id(raw: &str) -> String {
    let mut id: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if id.is_empty() {
        id.push('_');
    }
    if id.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        id.insert(0, 'n');
    }
    id
}

fn escape_label(raw: &str) -> String {
    raw.replace('"', "'")
}

/// AI-audience machine-readable block, delimited by fixed HTML comment
/// markers, body formatted as YAML (spec §4.14 "Audience mode").
pub fn render_ai_block(entity: &str, fields: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = fields.keys().collect();
    keys.sort();

    let mut body = String::new();
    for key in keys {
        body.push_str(&format!("{key}: {}\n", fields[key]));
    }

    format!("<!-- AI-DATA:{entity} -->\n```yaml\n{body}```\n<!-- /AI-DATA:{entity} -->\n\n")
}

/// Anchor derivation for cross-reference links: lower-case, non-alphanumeric
/// runs replaced by a single hyphen, leading/trailing hyphens trimmed (spec
/// §4.14).
pub fn anchor_for(title: &str) -> String {
    let mut anchor = String::new();
    let mut last_was_hyphen = false;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            anchor.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            anchor.push('-');
            last_was_hyphen = true;
        }
    }
    anchor.trim_matches('-').to_string()
}

/// A relative cross-reference link of the form `[text](NN-NAME.md#anchor)`
/// (spec §4.14). Links to documents not generated in the current run are
/// kept as-is by design.
pub fn cross_reference(text: &str, filename: &str, anchor: &str) -> String {
    format!("[{text}]({filename}#{anchor})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_node_ids() {
        assert_eq!(sanitize_node_id("my module/core"), "my_module_core");
        assert_eq!(sanitize_node_id("1thing"), "n1thing");
        assert_eq!(sanitize_node_id(""), "_");
    }

    #[test]
    fn derives_anchor_from_title() {
        assert_eq!(anchor_for("Architecture Overview"), "architecture-overview");
        assert_eq!(anchor_for("  Edge Cases & Risks!  "), "edge-cases-risks");
    }

    #[test]
    fn front_matter_renders_with_delimiters() {
        let fm = FrontMatter {
            title: "Architecture".to_string(),
            document_id: "03-architecture".to_string(),
            category: "core".to_string(),
            project: "demo".to_string(),
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            audience: "human".to_string(),
            ai_rounds_used: vec![1, 2],
            status: DocumentStatus::Complete,
        };
        let rendered = fm.render("A summary.");
        assert!(rendered.starts_with("---\n"));
        assert!(rendered.contains("document_id: 03-architecture"));
        assert!(rendered.contains("# Architecture"));
        assert!(rendered.contains("A summary."));
    }
}
