//! AST analyzer (spec §4.3 item 6). Iterates `ParsedFile`s produced by a
//! pluggable per-language parser capability and aggregates totals. The
//! per-language extractors themselves are out of scope (spec §1 Non-goals);
//! this module only defines and consumes the trait boundary they plug into,
//! modeled after the teacher's `LanguageAdapter` capability pattern.

use std::collections::HashMap;
use std::time::Instant;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult};
use crate::analyzers::types::{AstResult, AstSummary, ParsedFile};
use crate::core::errors::Result;

/// Capability interface a per-language extractor implements. Concrete
/// extractors (tree-sitter-backed or otherwise) are injected by the caller;
/// this crate ships no implementations, only the boundary and a no-op
/// default used when no extractor is configured for a language.
pub trait ParsedFileSource: Send + Sync {
    /// Languages this source can parse, keyed by file extension (with dot).
    fn supported_extensions(&self) -> &[&str];

    /// Parses a single file's content into a `ParsedFile`. Returns `None`
    /// when the content cannot be parsed; the analyzer treats this as "no
    /// contribution" rather than an error.
    fn parse(&self, relative_path: &str, content: &str) -> Option<ParsedFile>;
}

/// Aggregates language-keyed parser sources and dispatches by extension.
#[derive(Default)]
pub struct ParserRegistry {
    sources: Vec<Box<dyn ParsedFileSource>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Box<dyn ParsedFileSource>) {
        self.sources.push(source);
    }

    fn find_for(&self, extension: &str) -> Option<&dyn ParsedFileSource> {
        self.sources
            .iter()
            .find(|s| s.supported_extensions().contains(&extension))
            .map(|b| b.as_ref())
    }
}

pub fn analyze(ctx: &AnalysisContext, registry: &ParserRegistry) -> AnalyzerResult<AstResult> {
    let started = Instant::now();

    match run(ctx, registry) {
        Ok(result) => AnalyzerResult::ok(result, started),
        Err(err) => AnalyzerResult::failed(err.to_string(), started),
    }
}

fn run(ctx: &AnalysisContext, registry: &ParserRegistry) -> Result<AstResult> {
    let mut files = Vec::new();
    let mut language_breakdown: HashMap<String, usize> = HashMap::new();

    for entry in ctx.files.iter() {
        let Some(source) = registry.find_for(&entry.extension) else { continue };

        let path = ctx.absolute(&entry.relative_path);
        let Ok(content) = crate::core::file_utils::FileReader::read_to_string(&path) else { continue };

        if let Some(parsed) = source.parse(&entry.relative_path, &content) {
            *language_breakdown.entry(entry.extension.trim_start_matches('.').to_string()).or_insert(0) += 1;
            files.push(parsed);
        }
    }

    let summary = AstSummary {
        total_files: files.len(),
        total_functions: files.iter().map(|f| f.functions.len()).sum(),
        total_classes: files.iter().map(|f| f.classes.len()).sum(),
        language_breakdown,
    };

    Ok(AstResult { files, summary })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubSource;
    impl ParsedFileSource for StubSource {
        fn supported_extensions(&self) -> &[&str] {
            &[".rs"]
        }
        fn parse(&self, relative_path: &str, content: &str) -> Option<ParsedFile> {
            Some(ParsedFile {
                path: relative_path.to_string(),
                line_count: content.lines().count(),
                imports: Vec::new(),
                exports: Vec::new(),
                functions: Vec::new(),
                classes: Vec::new(),
            })
        }
    }

    #[test]
    fn registry_dispatches_by_extension() {
        let mut registry = ParserRegistry::new();
        registry.register(Box::new(StubSource));
        assert!(registry.find_for(".rs").is_some());
        assert!(registry.find_for(".py").is_none());
    }
}
