//! Data model shared by all analyzers: `FileEntry` and the
//! `StaticAnalysisResult` envelope (spec §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single discovered file. Immutable after `FileDiscovery` creates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileEntry {
    /// Path relative to the repository root.
    pub relative_path: String,
    /// Absolute filesystem path.
    pub absolute_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Extension including the leading dot, lowercased.
    pub extension: String,
}

impl FileEntry {
    /// Extension without the leading dot, for matching against allow-lists.
    pub fn extension_bare(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

// ---------------------------------------------------------------------
// FileTree
// ---------------------------------------------------------------------

/// Output of the `FileTree` analyzer (spec §4.3.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileTreeResult {
    pub totals: FileTreeTotals,
    pub files_by_extension: HashMap<String, usize>,
    pub largest_files: Vec<LargestFile>,
    /// Directory tree truncated to depth 3, annotated with largest-file entries.
    pub tree: DirNode,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileTreeTotals {
    pub files: usize,
    pub dirs: usize,
    pub lines: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LargestFile {
    pub path: String,
    pub size: u64,
}

/// A node in the truncated directory tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirNode {
    pub name: String,
    pub children: Vec<DirNode>,
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------

/// Output of the `Dependencies` analyzer (spec §4.3.2).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependenciesResult {
    pub manifests: Vec<DependencyManifest>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyManifest {
    pub file: String,
    pub ecosystem: String,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version_spec: String,
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Production,
    Development,
    Peer,
    Optional,
}

// ---------------------------------------------------------------------
// GitHistory
// ---------------------------------------------------------------------

/// Output of the `GitHistory` analyzer (spec §4.3.3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHistoryResult {
    pub is_git_repo: bool,
    pub branch_pattern: BranchPattern,
    pub recent_commits: Vec<Commit>,
    pub most_changed_files: Vec<FileChangeCount>,
    pub activity_by_month: HashMap<String, usize>,
    pub contributors: Vec<Contributor>,
    pub file_ownership: HashMap<String, String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchPattern {
    pub strategy: BranchStrategy,
    pub evidence: Vec<String>,
    pub active_branches: Vec<String>,
    pub stale_branches: Vec<String>,
    pub default_branch: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BranchStrategy {
    GitFlow,
    TrunkBased,
    FeatureBranch,
    Unknown,
}

impl Default for BranchStrategy {
    fn default() -> Self {
        Self::Unknown
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChangeCount {
    pub path: String,
    pub change_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    pub commit_count: usize,
}

// ---------------------------------------------------------------------
// Todos
// ---------------------------------------------------------------------

/// Output of the `TodoScanner` analyzer (spec §4.3.4).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodosResult {
    pub items: Vec<TodoItem>,
    pub summary: TodoSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodoItem {
    pub marker: String,
    pub category: TodoCategory,
    pub text: String,
    pub file: String,
    pub line: usize,
    pub issue_refs: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoCategory {
    Bugs,
    Tasks,
    Notes,
    Debt,
    Optimization,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoSummary {
    pub total: usize,
    pub by_category: HashMap<String, usize>,
}

// ---------------------------------------------------------------------
// Env
// ---------------------------------------------------------------------

/// Output of the `EnvScanner` analyzer (spec §4.3.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvResult {
    pub env_files: Vec<EnvFile>,
    pub references: Vec<EnvReference>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvFile {
    pub path: String,
    pub variables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvReference {
    pub file: String,
    pub line: usize,
    pub variable: String,
}

// ---------------------------------------------------------------------
// AST
// ---------------------------------------------------------------------

/// Output of the `Ast` analyzer (spec §4.3.6). Sourced from a pluggable
/// per-language parser capability (`ParsedFileSource`); this analyzer only
/// aggregates whatever `ParsedFile`s that capability returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstResult {
    pub files: Vec<ParsedFile>,
    pub summary: AstSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedFile {
    pub path: String,
    pub line_count: usize,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub functions: Vec<FunctionSig>,
    pub classes: Vec<ClassSig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Import {
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Export {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSig {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_async: bool,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSig {
    pub name: String,
    pub methods: Vec<MethodSig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodSig {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AstSummary {
    pub total_files: usize,
    pub total_functions: usize,
    pub total_classes: usize,
    pub language_breakdown: HashMap<String, usize>,
}

// ---------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------

/// Output of the `Tests` analyzer (spec §4.3.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestsResult {
    pub test_files: Vec<TestFile>,
    pub frameworks: Vec<String>,
    pub has_config: bool,
    pub config_files: Vec<String>,
    pub coverage_data_path: Option<String>,
    pub summary: TestsSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFile {
    pub path: String,
    pub framework: Option<String>,
    pub test_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestsSummary {
    pub total_test_files: usize,
    pub frameworks_detected: usize,
}

// ---------------------------------------------------------------------
// Docs
// ---------------------------------------------------------------------

/// Output of the `Docs` analyzer (spec §4.3.8).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsResult {
    pub readme_paths: Vec<String>,
    pub docs_folder: Option<String>,
    pub doc_files: Vec<String>,
    pub inline_doc_coverage: InlineDocCoverage,
    pub summary: DocsSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InlineDocCoverage {
    pub files_with_docs: usize,
    pub total_files: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsSummary {
    pub has_readme: bool,
    pub has_docs_folder: bool,
    pub doc_file_count: usize,
}

// ---------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------

/// The immutable assembled output of all eight analyzers (spec §3).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticAnalysisResult {
    pub file_tree: FileTreeResult,
    pub dependencies: DependenciesResult,
    pub git_history: GitHistoryResult,
    pub todos: TodosResult,
    pub env: EnvResult,
    pub ast: AstResult,
    pub tests: TestsResult,
    pub docs: DocsResult,
    pub metadata: AnalysisMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub analyzed_at: String,
    pub root_dir: String,
    pub file_count: usize,
    pub elapsed_ms: u64,
}
