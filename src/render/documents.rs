//! The 14 document renderers (spec §4.14, C15). Grounded directly on the
//! teacher's `bin/cli/output/markdown_report.rs`: plain string-building
//! functions appending to a `String` buffer, a helper-per-optional-field
//! pattern (`render_md_metric`), `chrono::Utc::now()` timestamps.
//!
//! Each renderer is `(RenderContext) -> (String, DocumentStatus)`. The empty
//! string marks `not-generated`; everything else is a complete document
//! (possibly carrying a "partial" banner for degraded/missing rounds).

use crate::render::types::{anchor_for, cross_reference, render_ai_block, render_mermaid_block, DocumentStatus, FrontMatter, RenderContext};
use crate::rounds::types::{ArchitectureAnalysis, ConventionsAnalysis, FeatureInventory, ModuleDeepDive, ModuleInventory, OperationsAnalysis, RoundOutcome, RoundStatus};

/// One rendered document plus the metadata the INDEX needs.
pub struct RenderedDocument {
    pub id: &'static str,
    pub filename: &'static str,
    pub title: &'static str,
    pub content: String,
    pub status: DocumentStatus,
}

fn front_matter(ctx: &RenderContext, document_id: &str, title: &str, category: &str, ai_rounds_used: Vec<u8>, status: DocumentStatus) -> FrontMatter {
    FrontMatter {
        title: title.to_string(),
        document_id: document_id.to_string(),
        category: category.to_string(),
        project: ctx.project_name.clone(),
        generated_at: ctx.generated_at.clone(),
        audience: if ctx.is_ai_audience() { "ai" } else { "human" }.to_string(),
        ai_rounds_used,
        status,
    }
}

fn module_inventory(ctx: &RenderContext) -> Option<&crate::rounds::types::RoundExecutionResult<ModuleInventory>> {
    match ctx.rounds.get(&1) {
        Some(RoundOutcome::Modules(r)) if r.status != RoundStatus::Failed => Some(r),
        _ => None,
    }
}

fn architecture(ctx: &RenderContext) -> Option<&crate::rounds::types::RoundExecutionResult<ArchitectureAnalysis>> {
    match ctx.rounds.get(&2) {
        Some(RoundOutcome::Architecture(r)) if r.status != RoundStatus::Failed => Some(r),
        _ => None,
    }
}

fn features(ctx: &RenderContext) -> Option<&crate::rounds::types::RoundExecutionResult<FeatureInventory>> {
    match ctx.rounds.get(&3) {
        Some(RoundOutcome::Features(r)) if r.status != RoundStatus::Failed => Some(r),
        _ => None,
    }
}

fn conventions(ctx: &RenderContext) -> Option<&crate::rounds::types::RoundExecutionResult<ConventionsAnalysis>> {
    match ctx.rounds.get(&4) {
        Some(RoundOutcome::Conventions(r)) if r.status != RoundStatus::Failed => Some(r),
        _ => None,
    }
}

fn module_deep_dives(ctx: &RenderContext) -> Option<&crate::rounds::types::RoundExecutionResult<Vec<ModuleDeepDive>>> {
    match ctx.rounds.get(&5) {
        Some(RoundOutcome::ModuleDeepDives(r)) if r.status != RoundStatus::Failed => Some(r),
        _ => None,
    }
}

fn operations(ctx: &RenderContext) -> Option<&crate::rounds::types::RoundExecutionResult<OperationsAnalysis>> {
    match ctx.rounds.get(&6) {
        Some(RoundOutcome::Operations(r)) if r.status != RoundStatus::Failed => Some(r),
        _ => None,
    }
}

fn status_of<T>(round: Option<&crate::rounds::types::RoundExecutionResult<T>>) -> DocumentStatus {
    match round.map(|r| r.status) {
        Some(RoundStatus::Success) | Some(RoundStatus::Retried) => DocumentStatus::Complete,
        Some(RoundStatus::Degraded) => DocumentStatus::Partial,
        _ => DocumentStatus::NotGenerated,
    }
}

fn partial_banner(content: &mut String) {
    content.push_str("> **Partial document.** One or more underlying analysis rounds degraded; this document reflects the best available data.\n\n");
}

// ---------------------------------------------------------------------
// 01-OVERVIEW
// ---------------------------------------------------------------------

pub fn render_overview(ctx: &RenderContext) -> RenderedDocument {
    let meta = &ctx.analysis.metadata;
    let status = DocumentStatus::StaticOnly;
    let fm = front_matter(ctx, "01-overview", "Overview", "onboard", Vec::new(), status);

    let summary = format!(
        "High-level snapshot of {} generated from {} files analyzed in {}ms.",
        ctx.project_name, meta.file_count, meta.elapsed_ms
    );

    let mut content = fm.render(&summary);
    content.push_str("## At a Glance\n\n");
    content.push_str(&format!("- **Files**: {}\n", ctx.analysis.file_tree.totals.files));
    content.push_str(&format!("- **Directories**: {}\n", ctx.analysis.file_tree.totals.dirs));
    content.push_str(&format!("- **Lines of code**: {}\n", ctx.analysis.file_tree.totals.lines));
    content.push_str(&format!("- **Dependency manifests**: {}\n", ctx.analysis.dependencies.manifests.len()));
    content.push_str(&format!("- **Test files**: {}\n", ctx.analysis.tests.summary.total_test_files));
    content.push('\n');

    if let Some(modules) = module_inventory(ctx) {
        content.push_str(&modules.data.summary);
        content.push_str("\n\n");
    }

    RenderedDocument { id: "01-overview", filename: "01-OVERVIEW.md", title: "Overview", content, status }
}

// ---------------------------------------------------------------------
// 03-ARCHITECTURE (alias "arch")
// ---------------------------------------------------------------------

/// Architecture draws its content from round 2 but is gated on the full
/// transitive chain {1,2,3,4} (spec §4.13/§8 scenario 6): a degradation in
/// round 3 must surface as `partial` here even though round 2 itself
/// succeeded, since round 4 consumed round 3's degraded data as input.
fn architecture_status(ctx: &RenderContext, arch: &crate::rounds::types::RoundExecutionResult<ArchitectureAnalysis>) -> DocumentStatus {
    let mut status = status_of(Some(arch));
    if status == DocumentStatus::Complete {
        for round in [1u8, 3, 4] {
            match ctx.rounds.get(&round).map(|r| r.status()) {
                Some(RoundStatus::Degraded) | None => status = DocumentStatus::Partial,
                _ => {}
            }
        }
    }
    status
}

pub fn render_architecture(ctx: &RenderContext) -> RenderedDocument {
    let arch = architecture(ctx);

    if arch.is_none() {
        return RenderedDocument { id: "03-architecture", filename: "03-ARCHITECTURE.md", title: "Architecture", content: String::new(), status: DocumentStatus::NotGenerated };
    }
    let arch = arch.unwrap();
    let status = architecture_status(ctx, arch);

    let fm = front_matter(ctx, "03-architecture", "Architecture", "core", vec![1, 2, 3, 4], status);
    let mut content = fm.render(if arch.data.overview.is_empty() { "Architectural summary." } else { &arch.data.overview });

    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if !arch.data.layers.is_empty() {
        content.push_str("## Layers\n\n");
        for layer in &arch.data.layers {
            content.push_str(&format!("- {layer}\n"));
        }
        content.push('\n');
    }

    if !arch.data.entry_points.is_empty() {
        content.push_str("## Entry Points\n\n");
        for entry in &arch.data.entry_points {
            content.push_str(&format!("- `{entry}`\n"));
        }
        content.push('\n');
    }

    if ctx.is_ai_audience() {
        for (i, rel) in arch.data.relationships.iter().enumerate() {
            let mut fields = std::collections::HashMap::new();
            fields.insert("from".to_string(), rel.from.clone());
            fields.insert("to".to_string(), rel.to.clone());
            fields.insert("kind".to_string(), rel.kind.clone());
            content.push_str(&render_ai_block(&format!("relationship-{i}"), &fields));
        }
    }

    if !arch.data.relationships.is_empty() {
        let edges: Vec<(String, String, String)> = arch.data.relationships.iter().map(|r| (r.from.clone(), r.to.clone(), r.kind.clone())).collect();
        content.push_str(&render_mermaid_block("graph LR", &edges));
    }

    RenderedDocument { id: "03-architecture", filename: "03-ARCHITECTURE.md", title: "Architecture", content, status }
}

// ---------------------------------------------------------------------
// 02-MODULES (alias "modules")
// ---------------------------------------------------------------------

pub fn render_modules(ctx: &RenderContext) -> RenderedDocument {
    let modules = module_inventory(ctx);
    let status = match modules {
        Some(r) if r.status == RoundStatus::Degraded => DocumentStatus::Partial,
        Some(_) => DocumentStatus::Complete,
        None => {
            if ctx.analysis.file_tree.totals.files > 0 {
                DocumentStatus::Partial
            } else {
                DocumentStatus::NotGenerated
            }
        }
    };

    let fm = front_matter(ctx, "02-modules", "Modules", "core", vec![1, 5], status);
    let mut content = fm.render("Module inventory derived from LLM analysis and static directory structure.");

    if status == DocumentStatus::Partial && modules.is_none() {
        content.push_str("> **Partial document.** No module round completed; falling back to the top-level directory tree.\n\n");
        content.push_str("## Top-Level Directories\n\n");
        for child in &ctx.analysis.file_tree.tree.children {
            content.push_str(&format!("- `{}`\n", child.name));
        }
        content.push('\n');
    } else if let Some(modules) = modules {
        if status == DocumentStatus::Partial {
            partial_banner(&mut content);
        }
        let deep_dives = module_deep_dives(ctx);

        for module in &modules.data.modules {
            content.push_str(&format!("## {}\n\n", module.name));
            content.push_str(&format!("**Path**: `{}`\n\n", module.path));
            if !module.purpose.is_empty() {
                content.push_str(&format!("{}\n\n", module.purpose));
            }
            if !module.key_files.is_empty() {
                content.push_str("**Key files**:\n\n");
                for file in &module.key_files {
                    content.push_str(&format!("- `{file}`\n"));
                }
                content.push('\n');
            }

            if let Some(deep_dives) = deep_dives {
                if let Some(dive) = deep_dives.data.iter().find(|d| d.module == module.name) {
                    if !dive.responsibilities.is_empty() {
                        content.push_str("**Responsibilities**:\n\n");
                        for item in &dive.responsibilities {
                            content.push_str(&format!("- {item}\n"));
                        }
                        content.push('\n');
                    }
                    if !dive.dependencies.is_empty() {
                        content.push_str("**Depends on**:\n\n");
                        for item in &dive.dependencies {
                            content.push_str(&format!("- {item}\n"));
                        }
                        content.push('\n');
                    }
                    if !dive.risks.is_empty() {
                        content.push_str("**Risks**:\n\n");
                        for item in &dive.risks {
                            content.push_str(&format!("- {item}\n"));
                        }
                        content.push('\n');
                    }
                }
            }
        }

        let edges: Vec<(String, String, String)> = modules
            .data
            .modules
            .windows(2)
            .map(|w| (w[0].name.clone(), w[1].name.clone(), "adjacent".to_string()))
            .collect();
        if !edges.is_empty() {
            content.push_str(&render_mermaid_block("graph TD", &edges));
        }
    }

    RenderedDocument { id: "02-modules", filename: "02-MODULES.md", title: "Modules", content, status }
}

// ---------------------------------------------------------------------
// 04-FEATURES
// ---------------------------------------------------------------------

pub fn render_features(ctx: &RenderContext) -> RenderedDocument {
    let feats = features(ctx);
    let status = status_of(feats);

    if feats.is_none() {
        return RenderedDocument { id: "04-features", filename: "04-FEATURES.md", title: "Features", content: String::new(), status: DocumentStatus::NotGenerated };
    }
    let feats = feats.unwrap();

    let fm = front_matter(ctx, "04-features", "Features", "core", vec![1, 2, 3], status);
    let mut content = fm.render("Feature inventory derived from codebase analysis.");
    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    for feature in &feats.data.features {
        content.push_str(&format!("## {}\n\n", feature.name));
        content.push_str(&format!("{}\n\n", feature.description));
        if !feature.entry_files.is_empty() {
            content.push_str("**Entry files**:\n\n");
            for file in &feature.entry_files {
                content.push_str(&format!("- `{file}`\n"));
            }
            content.push('\n');
        }
    }

    let edges: Vec<(String, String, String)> = feats.data.features.iter().map(|f| ("project".to_string(), f.name.clone(), "provides".to_string())).collect();
    if !edges.is_empty() {
        content.push_str(&render_mermaid_block("graph LR", &edges));
    }

    RenderedDocument { id: "04-features", filename: "04-FEATURES.md", title: "Features", content, status }
}

// ---------------------------------------------------------------------
// 05-DEPENDENCIES (alias "deps") — static-only
// ---------------------------------------------------------------------

pub fn render_dependencies(ctx: &RenderContext) -> RenderedDocument {
    let status = DocumentStatus::StaticOnly;
    let fm = front_matter(ctx, "05-dependencies", "Dependencies", "core", Vec::new(), status);
    let mut content = fm.render("Dependency manifests detected across the repository.");

    for manifest in &ctx.analysis.dependencies.manifests {
        content.push_str(&format!("## {} (`{}`)\n\n", manifest.ecosystem, manifest.file));
        content.push_str("| Name | Version | Kind |\n|---|---|---|\n");
        for dep in &manifest.dependencies {
            content.push_str(&format!("| {} | {} | {:?} |\n", dep.name, dep.version_spec, dep.kind));
        }
        content.push('\n');
    }

    if !ctx.analysis.dependencies.warnings.is_empty() {
        content.push_str("## Warnings\n\n");
        for warning in &ctx.analysis.dependencies.warnings {
            content.push_str(&format!("- {warning}\n"));
        }
        content.push('\n');
    }

    RenderedDocument { id: "05-dependencies", filename: "05-DEPENDENCIES.md", title: "Dependencies", content, status }
}

// ---------------------------------------------------------------------
// 06-CONVENTIONS
// ---------------------------------------------------------------------

pub fn render_conventions(ctx: &RenderContext) -> RenderedDocument {
    let conv = conventions(ctx);
    let status = status_of(conv);

    if conv.is_none() {
        return RenderedDocument { id: "06-conventions", filename: "06-CONVENTIONS.md", title: "Conventions", content: String::new(), status: DocumentStatus::NotGenerated };
    }
    let conv = conv.unwrap();

    let fm = front_matter(ctx, "06-conventions", "Conventions", "quality", vec![1, 2, 3, 4], status);
    let mut content = fm.render("Coding conventions and standards observed across the codebase.");
    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if !conv.data.conventions.is_empty() {
        content.push_str("## Observed Conventions\n\n");
        for c in &conv.data.conventions {
            content.push_str(&format!("- {c}\n"));
        }
        content.push('\n');
    }

    RenderedDocument { id: "06-conventions", filename: "06-CONVENTIONS.md", title: "Conventions", content, status }
}

// ---------------------------------------------------------------------
// 07-EDGE-CASES
// ---------------------------------------------------------------------

pub fn render_edge_cases(ctx: &RenderContext) -> RenderedDocument {
    let conv = conventions(ctx);
    let status = match conv {
        Some(r) if r.status == RoundStatus::Degraded => DocumentStatus::Partial,
        Some(r) if !r.data.edge_cases.is_empty() => DocumentStatus::Complete,
        Some(_) => DocumentStatus::Partial,
        None => {
            if ctx.analysis.todos.summary.total > 0 {
                DocumentStatus::Partial
            } else {
                DocumentStatus::NotGenerated
            }
        }
    };

    let fm = front_matter(ctx, "07-edge-cases", "Edge Cases & Risks", "quality", vec![1, 2, 3, 4], status);
    let mut content = fm.render("Known edge cases, risks, and outstanding concerns.");

    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if let Some(conv) = conv {
        if !conv.data.edge_cases.is_empty() {
            content.push_str("## Edge Cases\n\n");
            for case in &conv.data.edge_cases {
                content.push_str(&format!("- {case}\n"));
            }
            content.push('\n');
        }
        if !conv.data.open_questions.is_empty() {
            content.push_str("## Open Questions\n\n");
            for q in &conv.data.open_questions {
                content.push_str(&format!("- {q}\n"));
            }
            content.push('\n');
        }
    }

    let debt_items: Vec<_> = ctx
        .analysis
        .todos
        .items
        .iter()
        .filter(|item| matches!(item.category, crate::analyzers::types::TodoCategory::Debt | crate::analyzers::types::TodoCategory::Bugs))
        .collect();
    if !debt_items.is_empty() {
        content.push_str("## Flagged in Source\n\n");
        for item in debt_items.iter().take(50) {
            content.push_str(&format!("- `{}:{}` — {}\n", item.file, item.line, item.text));
        }
        content.push('\n');
    }

    RenderedDocument { id: "07-edge-cases", filename: "07-EDGE-CASES.md", title: "Edge Cases & Risks", content, status }
}

// ---------------------------------------------------------------------
// 08-TESTING — static-only
// ---------------------------------------------------------------------

pub fn render_testing(ctx: &RenderContext) -> RenderedDocument {
    let tests = &ctx.analysis.tests;
    let status = if tests.summary.total_test_files > 0 { DocumentStatus::StaticOnly } else { DocumentStatus::Partial };

    let fm = front_matter(ctx, "08-testing", "Testing", "quality", Vec::new(), status);
    let mut content = fm.render("Test frameworks, configuration, and coverage signal detected in the repository.");

    content.push_str(&format!("- **Test files**: {}\n", tests.summary.total_test_files));
    content.push_str(&format!("- **Frameworks detected**: {}\n", tests.frameworks.join(", ")));
    content.push_str(&format!("- **Config present**: {}\n", tests.has_config));
    if let Some(path) = &tests.coverage_data_path {
        content.push_str(&format!("- **Coverage data**: `{path}`\n"));
    }
    content.push('\n');

    if !tests.test_files.is_empty() {
        content.push_str("## Test Files\n\n");
        for file in tests.test_files.iter().take(100) {
            let framework = file.framework.clone().unwrap_or_else(|| "unknown".to_string());
            content.push_str(&format!("- `{}` ({framework})\n", file.path));
        }
        content.push('\n');
    }

    RenderedDocument { id: "08-testing", filename: "08-TESTING.md", title: "Testing", content, status }
}

// ---------------------------------------------------------------------
// 09-ENVIRONMENT
// ---------------------------------------------------------------------

pub fn render_environment(ctx: &RenderContext) -> RenderedDocument {
    let ops = operations(ctx);
    let env = &ctx.analysis.env;
    let has_static = !env.env_files.is_empty() || !env.references.is_empty();

    let status = match ops {
        Some(r) if r.status == RoundStatus::Degraded => DocumentStatus::Partial,
        Some(_) if !ops.unwrap().data.environment_requirements.is_empty() => DocumentStatus::Complete,
        _ if has_static => DocumentStatus::Partial,
        _ => DocumentStatus::NotGenerated,
    };

    let fm = front_matter(ctx, "09-environment", "Environment", "quality", vec![1, 2, 6], status);
    let mut content = fm.render("Required environment variables and configuration surfaces.");

    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if let Some(ops) = ops {
        if !ops.data.environment_requirements.is_empty() {
            content.push_str("## Requirements\n\n");
            for req in &ops.data.environment_requirements {
                content.push_str(&format!("- {req}\n"));
            }
            content.push('\n');
        }
    }

    if !env.env_files.is_empty() {
        content.push_str("## Env Files\n\n");
        for file in &env.env_files {
            content.push_str(&format!("### `{}`\n\n", file.path));
            for var in &file.variables {
                content.push_str(&format!("- `{var}`\n"));
            }
            content.push('\n');
        }
    }

    if !env.references.is_empty() {
        content.push_str("## Referenced In Source\n\n");
        for reference in env.references.iter().take(100) {
            content.push_str(&format!("- `{}` at `{}:{}`\n", reference.variable, reference.file, reference.line));
        }
        content.push('\n');
    }

    RenderedDocument { id: "09-environment", filename: "09-ENVIRONMENT.md", title: "Environment", content, status }
}

// ---------------------------------------------------------------------
// 10-ONBOARDING
// ---------------------------------------------------------------------

pub fn render_onboarding(ctx: &RenderContext) -> RenderedDocument {
    let modules = module_inventory(ctx);
    let feats = features(ctx);
    let status = match (modules.map(|r| r.status), feats.map(|r| r.status)) {
        (Some(RoundStatus::Success), Some(RoundStatus::Success)) | (Some(RoundStatus::Success), None) => DocumentStatus::Complete,
        (None, None) => DocumentStatus::NotGenerated,
        _ => DocumentStatus::Partial,
    };

    let fm = front_matter(ctx, "10-onboarding", "Onboarding", "onboard", vec![1, 2, 3], status);
    let mut content = fm.render("A first read for someone new to this codebase.");
    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    content.push_str("## Start Here\n\n");
    if let Some(modules) = modules {
        for module in modules.data.modules.iter().take(5) {
            let anchor = anchor_for(&module.name);
            content.push_str(&format!("- {}\n", cross_reference(&module.name, "02-MODULES.md", &anchor)));
        }
        content.push('\n');
    }

    if let Some(feats) = feats {
        content.push_str("## Notable Features\n\n");
        for feature in feats.data.features.iter().take(5) {
            let anchor = anchor_for(&feature.name);
            content.push_str(&format!("- {}\n", cross_reference(&feature.name, "04-FEATURES.md", &anchor)));
        }
        content.push('\n');
    }

    if !ctx.analysis.docs.readme_paths.is_empty() {
        content.push_str("## Existing Documentation\n\n");
        for readme in &ctx.analysis.docs.readme_paths {
            content.push_str(&format!("- `{readme}`\n"));
        }
        content.push('\n');
    }

    RenderedDocument { id: "10-onboarding", filename: "10-ONBOARDING.md", title: "Onboarding", content, status }
}

// ---------------------------------------------------------------------
// 11-CONTRIBUTING
// ---------------------------------------------------------------------

pub fn render_contributing(ctx: &RenderContext) -> RenderedDocument {
    let conv = conventions(ctx);
    let git = &ctx.analysis.git_history;
    let status = if conv.is_some() || git.is_git_repo { DocumentStatus::Partial } else { DocumentStatus::NotGenerated };
    let status = if conv.map(|r| r.status) == Some(RoundStatus::Success) { DocumentStatus::Complete } else { status };

    let fm = front_matter(ctx, "11-contributing", "Contributing", "quality", vec![1, 2, 3, 4], status);
    let mut content = fm.render("Branch strategy, active contributors, and conventions to follow when contributing.");

    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if git.is_git_repo {
        content.push_str("## Branch Strategy\n\n");
        content.push_str(&format!("Detected strategy: **{:?}**\n\n", git.branch_pattern.strategy));
        if !git.branch_pattern.evidence.is_empty() {
            for evidence in &git.branch_pattern.evidence {
                content.push_str(&format!("- {evidence}\n"));
            }
            content.push('\n');
        }

        if !git.contributors.is_empty() {
            content.push_str("## Active Contributors\n\n");
            for contributor in git.contributors.iter().take(10) {
                content.push_str(&format!("- {} ({} commits)\n", contributor.name, contributor.commit_count));
            }
            content.push('\n');
        }
    } else {
        content.push_str("_Not a git repository; branch and contributor history unavailable._\n\n");
    }

    if let Some(conv) = conv {
        if !conv.data.conventions.is_empty() {
            content.push_str(&format!("See {} for the full conventions list.\n\n", cross_reference("Conventions", "06-CONVENTIONS.md", "observed-conventions")));
        }
    }

    RenderedDocument { id: "11-contributing", filename: "11-CONTRIBUTING.md", title: "Contributing", content, status }
}

// ---------------------------------------------------------------------
// 12-OPERATIONS (alias group "ops")
// ---------------------------------------------------------------------

pub fn render_operations(ctx: &RenderContext) -> RenderedDocument {
    let ops = operations(ctx);
    let status = match ops {
        Some(r) if r.status == RoundStatus::Degraded => DocumentStatus::Partial,
        Some(_) => DocumentStatus::Complete,
        None => DocumentStatus::NotGenerated,
    };

    if ops.is_none() {
        return RenderedDocument { id: "12-operations", filename: "12-OPERATIONS.md", title: "Operations", content: String::new(), status };
    }
    let ops = ops.unwrap();

    let fm = front_matter(ctx, "12-operations", "Operations", "ops", vec![1, 2, 6], status);
    let mut content = fm.render("Observability and operational notes gathered from the codebase.");
    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if !ops.data.observability_notes.is_empty() {
        content.push_str("## Observability\n\n");
        for note in &ops.data.observability_notes {
            content.push_str(&format!("- {note}\n"));
        }
        content.push('\n');
    }

    RenderedDocument { id: "12-operations", filename: "12-OPERATIONS.md", title: "Operations", content, status }
}

// ---------------------------------------------------------------------
// 13-DEPLOYMENT
// ---------------------------------------------------------------------

pub fn render_deployment(ctx: &RenderContext) -> RenderedDocument {
    let ops = operations(ctx);
    let status = match ops {
        Some(r) if r.status == RoundStatus::Degraded => DocumentStatus::Partial,
        Some(r) if !r.data.deployment_notes.is_empty() => DocumentStatus::Complete,
        Some(_) => DocumentStatus::Partial,
        None => DocumentStatus::NotGenerated,
    };

    let fm = front_matter(ctx, "13-deployment", "Deployment", "ops", vec![1, 2, 6], status);
    let mut content = fm.render("Deployment notes inferred from repository structure and LLM analysis.");
    if status == DocumentStatus::Partial {
        partial_banner(&mut content);
    }

    if let Some(ops) = ops {
        if !ops.data.deployment_notes.is_empty() {
            content.push_str("## Deployment Notes\n\n");
            for note in &ops.data.deployment_notes {
                content.push_str(&format!("- {note}\n"));
            }
            content.push('\n');
        }
    }

    let manifest_files: Vec<&str> = ctx.analysis.dependencies.manifests.iter().map(|m| m.file.as_str()).collect();
    if !manifest_files.is_empty() {
        content.push_str("## Build Surfaces\n\n");
        for file in manifest_files {
            content.push_str(&format!("- `{file}`\n"));
        }
        content.push('\n');
    }

    RenderedDocument { id: "13-deployment", filename: "13-DEPLOYMENT.md", title: "Deployment", content, status }
}

// ---------------------------------------------------------------------
// 00-INDEX — always rendered last (spec §4.14), receives every other
// document's resolved status.
// ---------------------------------------------------------------------

pub fn render_index(ctx: &RenderContext, documents: &[RenderedDocument]) -> RenderedDocument {
    let statuses: Vec<(String, DocumentStatus)> = documents.iter().map(|d| (d.id.to_string(), d.status)).collect();
    let complete = statuses.iter().filter(|(_, s)| *s == DocumentStatus::Complete).count();

    let status = DocumentStatus::Complete;
    let fm = front_matter(ctx, "00-index", "Index", "core", Vec::new(), status);
    let mut content = fm.render(&format!("Handover documentation for {}. {} of {} documents generated complete.", ctx.project_name, complete, documents.len()));

    content.push_str("| Document | Status |\n|---|---|\n");
    for doc in documents {
        if doc.content.is_empty() {
            continue;
        }
        content.push_str(&format!("| [{}]({}) | `{:?}` |\n", doc.title, doc.filename, doc.status));
    }
    content.push('\n');

    RenderedDocument { id: "00-index", filename: "00-INDEX.md", title: "Index", content, status }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::StaticAnalysisResult;
    use crate::core::config::HandoverConfig;
    use crate::rounds::types::{RoundExecutionResult, RoundResultsByNumber, TokenUsage};
    use std::collections::HashMap;

    fn base_ctx(analysis: &StaticAnalysisResult, rounds: &RoundResultsByNumber, config: &HandoverConfig) -> RenderContext<'_> {
        RenderContext {
            rounds,
            analysis,
            config,
            audience: crate::core::config::Audience::Human,
            generated_at: "2026-01-01T00:00:00Z".to_string(),
            project_name: "demo".to_string(),
        }
    }

    #[test]
    fn architecture_not_generated_without_round_two() {
        let analysis = StaticAnalysisResult::default();
        let config = HandoverConfig::default();
        let rounds: RoundResultsByNumber = HashMap::new();
        let ctx = base_ctx(&analysis, &rounds, &config);

        let doc = render_architecture(&ctx);
        assert_eq!(doc.status, DocumentStatus::NotGenerated);
        assert!(doc.content.is_empty());
    }

    #[test]
    fn dependencies_is_always_static_only() {
        let analysis = StaticAnalysisResult::default();
        let config = HandoverConfig::default();
        let rounds: RoundResultsByNumber = HashMap::new();
        let ctx = base_ctx(&analysis, &rounds, &config);

        let doc = render_dependencies(&ctx);
        assert_eq!(doc.status, DocumentStatus::StaticOnly);
        assert!(!doc.content.is_empty());
    }

    #[test]
    fn degraded_architecture_round_yields_partial_document_with_banner() {
        let analysis = StaticAnalysisResult::default();
        let config = HandoverConfig::default();
        let mut rounds: RoundResultsByNumber = HashMap::new();
        rounds.insert(
            2,
            RoundOutcome::Architecture(RoundExecutionResult::degraded(ArchitectureAnalysis::default(), "timed out", Some(TokenUsage::default()), 10)),
        );
        let ctx = base_ctx(&analysis, &rounds, &config);

        let doc = render_architecture(&ctx);
        assert_eq!(doc.status, DocumentStatus::Partial);
        assert!(doc.content.contains("Partial document"));
    }

    #[test]
    fn architecture_is_partial_when_round_three_degraded_even_if_round_two_succeeded() {
        let analysis = StaticAnalysisResult::default();
        let config = HandoverConfig::default();
        let mut rounds: RoundResultsByNumber = HashMap::new();
        rounds.insert(1, RoundOutcome::Modules(RoundExecutionResult::success(ModuleInventory::default(), TokenUsage::default(), None, 10)));
        rounds.insert(2, RoundOutcome::Architecture(RoundExecutionResult::success(ArchitectureAnalysis::default(), TokenUsage::default(), None, 10)));
        rounds.insert(
            3,
            RoundOutcome::Features(RoundExecutionResult::degraded(FeatureInventory::default(), "timed out", Some(TokenUsage::default()), 10)),
        );
        rounds.insert(4, RoundOutcome::Conventions(RoundExecutionResult::success(ConventionsAnalysis::default(), TokenUsage::default(), None, 10)));
        let ctx = base_ctx(&analysis, &rounds, &config);

        let doc = render_architecture(&ctx);
        assert_eq!(doc.status, DocumentStatus::Partial);
        assert!(doc.content.contains("Partial document"));
    }
}
