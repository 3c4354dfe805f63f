//! EnvScanner analyzer (spec §4.3 item 5): parses env files and scans
//! source for environment-variable references.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult, FILE_READ_BATCH_SIZE};
use crate::analyzers::types::{EnvFile, EnvReference, EnvResult};
use crate::core::file_utils::FileReader;

static PROCESS_ENV_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"process\.env\.([A-Z0-9_]+)"#).unwrap());
static OS_ENVIRON_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"os\.environ(?:\.get)?\(?['"]([A-Z0-9_]+)['"]"#).unwrap());
static ENV_VAR_MACRO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?:env::var|std::env::var)\(['"]([A-Z0-9_]+)['"]"#).unwrap());

const SOURCE_EXTENSIONS: &[&str] = &[".rs", ".py", ".ts", ".tsx", ".js", ".jsx", ".go"];

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerResult<EnvResult> {
    let started = Instant::now();

    let mut env_files = Vec::new();
    let mut references = Vec::new();
    let mut warnings = Vec::new();

    for entry in ctx.files.iter() {
        let basename = std::path::Path::new(&entry.relative_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        if basename == ".env" || basename.starts_with(".env.") {
            let path = ctx.absolute(&entry.relative_path);
            match FileReader::read_to_string(&path) {
                Ok(content) => env_files.push(EnvFile {
                    path: entry.relative_path.clone(),
                    variables: parse_env_file(&content),
                }),
                Err(err) => warnings.push(format!("unreadable env file {}: {err}", entry.relative_path)),
            }
        }
    }

    for chunk in ctx.files.chunks(FILE_READ_BATCH_SIZE) {
        for entry in chunk {
            if !SOURCE_EXTENSIONS.contains(&entry.extension.as_str()) {
                continue;
            }
            let path = ctx.absolute(&entry.relative_path);
            let Ok(content) = FileReader::read_to_string(&path) else { continue };

            for (line_idx, line) in content.lines().enumerate() {
                for re in [&*PROCESS_ENV_RE, &*OS_ENVIRON_RE, &*ENV_VAR_MACRO_RE] {
                    for cap in re.captures_iter(line) {
                        if let Some(var) = cap.get(1) {
                            references.push(EnvReference {
                                file: entry.relative_path.clone(),
                                line: line_idx + 1,
                                variable: var.as_str().to_string(),
                            });
                        }
                    }
                }
            }
        }
    }

    AnalyzerResult::ok(EnvResult { env_files, references, warnings }, started)
}

fn parse_env_file(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split('=').next())
        .map(|key| key.trim().to_string())
        .collect()
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
    fn parses_env_file_variables_ignoring_comments_and_blanks() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_files(&dir, &[(".env", "# comment\nFOO=bar\n\nBAZ=qux\n")]);

        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.env_files.len(), 1);
        assert_eq!(data.env_files[0].variables, vec!["FOO".to_string(), "BAZ".to_string()]);
    }

    #[test]
    fn finds_references_across_language_idioms() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_files(
            &dir,
            &[
                ("a.js", "const x = process.env.API_KEY;\n"),
                ("b.py", "key = os.environ.get('DB_URL')\n"),
                ("c.rs", "let k = env::var(\"PORT\").unwrap();\n"),
            ],
        );

        let data = analyze(&ctx).data.unwrap();
        let vars: Vec<&str> = data.references.iter().map(|r| r.variable.as_str()).collect();
        assert!(vars.contains(&"API_KEY"));
        assert!(vars.contains(&"DB_URL"));
        assert!(vars.contains(&"PORT"));
    }

    #[test]
    fn non_source_extensions_are_not_scanned_for_references() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_files(&dir, &[("notes.md", "process.env.SHOULD_NOT_MATCH\n")]);

        let data = analyze(&ctx).data.unwrap();
        assert!(data.references.is_empty());
    }
}
