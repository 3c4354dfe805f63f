//! Dependencies analyzer (spec §4.3 item 2): detects package manifests by
//! basename and parses npm/Cargo/PEP 621/requirements.txt/go.mod shapes.

use std::time::Instant;

use serde_json::Value as JsonValue;

use crate::analyzers::context::{AnalysisContext, AnalyzerResult};
use crate::analyzers::types::{Dependency, DependencyKind, DependencyManifest, DependenciesResult};
use crate::core::file_utils::FileReader;

pub fn analyze(ctx: &AnalysisContext) -> AnalyzerResult<DependenciesResult> {
    let started = Instant::now();

    let mut manifests = Vec::new();
    let mut warnings = Vec::new();

    for entry in ctx.files.iter() {
        let basename = std::path::Path::new(&entry.relative_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();

        let ecosystem = match basename {
            "package.json" => Some("npm"),
            "Cargo.toml" => Some("cargo"),
            "pyproject.toml" => Some("pep621"),
            "requirements.txt" => Some("pip"),
            "go.mod" => Some("go"),
            _ => None,
        };

        let Some(ecosystem) = ecosystem else { continue };

        let path = ctx.absolute(&entry.relative_path);
        let content = match FileReader::read_to_string(&path) {
            Ok(c) => c,
            Err(err) => {
                warnings.push(format!("unreadable manifest {}: {err}", entry.relative_path));
                continue;
            }
        };

        let parsed = match ecosystem {
            "npm" => parse_npm(&content),
            "cargo" => parse_cargo(&content),
            "pep621" => parse_pep621(&content),
            "pip" => parse_requirements(&content),
            "go" => parse_go_mod(&content),
            _ => unreachable!(),
        };

        match parsed {
            Ok(dependencies) => manifests.push(DependencyManifest {
                file: entry.relative_path.clone(),
                ecosystem: ecosystem.to_string(),
                dependencies,
            }),
            Err(err) => warnings.push(format!("failed to parse {}: {err}", entry.relative_path)),
        }
    }

    AnalyzerResult::ok(DependenciesResult { manifests, warnings }, started)
}

fn parse_npm(content: &str) -> Result<Vec<Dependency>, String> {
    let value: JsonValue = serde_json::from_str(content).map_err(|e| e.to_string())?;
    let mut deps = Vec::new();

    let sections: [(&str, DependencyKind); 4] = [
        ("dependencies", DependencyKind::Production),
        ("devDependencies", DependencyKind::Development),
        ("peerDependencies", DependencyKind::Peer),
        ("optionalDependencies", DependencyKind::Optional),
    ];

    for (key, kind) in sections {
        if let Some(map) = value.get(key).and_then(|v| v.as_object()) {
            for (name, version) in map {
                deps.push(Dependency {
                    name: name.clone(),
                    version_spec: version.as_str().unwrap_or_default().to_string(),
                    kind,
                });
            }
        }
    }

    Ok(deps)
}

fn parse_cargo(content: &str) -> Result<Vec<Dependency>, String> {
    let value: toml::Value = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
    let mut deps = Vec::new();

    let sections: [(&str, DependencyKind); 3] = [
        ("dependencies", DependencyKind::Production),
        ("dev-dependencies", DependencyKind::Development),
        ("build-dependencies", DependencyKind::Development),
    ];

    for (key, kind) in sections {
        if let Some(table) = value.get(key).and_then(|v| v.as_table()) {
            for (name, spec) in table {
                let version_spec = match spec {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Table(t) => t
                        .get("version")
                        .and_then(|v| v.as_str())
                        .unwrap_or("*")
                        .to_string(),
                    _ => "*".to_string(),
                };
                deps.push(Dependency { name: name.clone(), version_spec, kind });
            }
        }
    }

    Ok(deps)
}

fn parse_pep621(content: &str) -> Result<Vec<Dependency>, String> {
    let value: toml::Value = content.parse().map_err(|e: toml::de::Error| e.to_string())?;
    let mut deps = Vec::new();

    if let Some(list) = value.get("project").and_then(|p| p.get("dependencies")).and_then(|d| d.as_array()) {
        for item in list {
            if let Some(spec) = item.as_str() {
                let (name, version_spec) = split_requirement(spec);
                deps.push(Dependency { name, version_spec, kind: DependencyKind::Production });
            }
        }
    }

    if let Some(groups) = value
        .get("project")
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(|o| o.as_table())
    {
        for (_, list) in groups {
            if let Some(list) = list.as_array() {
                for item in list {
                    if let Some(spec) = item.as_str() {
                        let (name, version_spec) = split_requirement(spec);
                        deps.push(Dependency { name, version_spec, kind: DependencyKind::Optional });
                    }
                }
            }
        }
    }

    Ok(deps)
}

fn parse_requirements(content: &str) -> Result<Vec<Dependency>, String> {
    let deps = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (name, version_spec) = split_requirement(line);
            Dependency { name, version_spec, kind: DependencyKind::Production }
        })
        .collect();
    Ok(deps)
}

fn parse_go_mod(content: &str) -> Result<Vec<Dependency>, String> {
    let mut deps = Vec::new();
    let mut in_require_block = false;

    for line in content.lines() {
        let line = line.trim();
        if line.starts_with("require (") {
            in_require_block = true;
            continue;
        }
        if in_require_block {
            if line == ")" {
                in_require_block = false;
                continue;
            }
            if let Some((name, version)) = split_go_line(line) {
                deps.push(Dependency { name, version_spec: version, kind: DependencyKind::Production });
            }
        } else if let Some(rest) = line.strip_prefix("require ") {
            if let Some((name, version)) = split_go_line(rest) {
                deps.push(Dependency { name, version_spec: version, kind: DependencyKind::Production });
            }
        }
    }

    Ok(deps)
}

fn split_go_line(line: &str) -> Option<(String, String)> {
    let line = line.split("//").next().unwrap_or(line).trim();
    let mut parts = line.split_whitespace();
    let name = parts.next()?.to_string();
    let version = parts.next().unwrap_or("").to_string();
    if name.is_empty() {
        None
    } else {
        Some((name, version))
    }
}

fn split_requirement(spec: &str) -> (String, String) {
    let idx = spec.find(|c: char| "=<>!~".contains(c));
    match idx {
        Some(i) => (spec[..i].trim().to_string(), spec[i..].trim().to_string()),
        None => (spec.trim().to_string(), "*".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::FileEntry;
    use crate::cache::analysis_cache::AnalysisCache;
    use crate::core::config::HandoverConfig;
    use tempfile::TempDir;

    fn ctx_with_manifest(dir: &TempDir, name: &str, content: &str) -> AnalysisContext {
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
    fn parses_npm_manifest_by_kind() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_manifest(
            &dir,
            "package.json",
            r#"{"dependencies":{"react":"^18.0.0"},"devDependencies":{"vitest":"^1.0.0"}}"#,
        );

        let data = analyze(&ctx).data.unwrap();
        assert_eq!(data.manifests.len(), 1);
        let m = &data.manifests[0];
        assert_eq!(m.ecosystem, "npm");
        assert!(m.dependencies.iter().any(|d| d.name == "react" && d.kind == DependencyKind::Production));
        assert!(m.dependencies.iter().any(|d| d.name == "vitest" && d.kind == DependencyKind::Development));
    }

    #[test]
    fn parses_cargo_manifest_table_and_string_forms() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_manifest(
            &dir,
            "Cargo.toml",
            "[dependencies]\nserde = \"1.0\"\ntokio = { version = \"1.35\", features = [\"full\"] }\n",
        );

        let data = analyze(&ctx).data.unwrap();
        let deps = &data.manifests[0].dependencies;
        assert!(deps.iter().any(|d| d.name == "serde" && d.version_spec == "1.0"));
        assert!(deps.iter().any(|d| d.name == "tokio" && d.version_spec == "1.35"));
    }

    #[test]
    fn parses_requirements_txt_splitting_name_and_version() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_manifest(&dir, "requirements.txt", "# comment\nflask>=2.0\nrequests\n");

        let data = analyze(&ctx).data.unwrap();
        let deps = &data.manifests[0].dependencies;
        assert_eq!(deps.len(), 2);
        assert!(deps.iter().any(|d| d.name == "flask" && d.version_spec == ">=2.0"));
        assert!(deps.iter().any(|d| d.name == "requests" && d.version_spec == "*"));
    }

    #[test]
    fn parses_go_mod_require_block() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_manifest(
            &dir,
            "go.mod",
            "module example.com/m\n\nrequire (\n\tgithub.com/foo/bar v1.2.3\n)\n",
        );

        let data = analyze(&ctx).data.unwrap();
        let deps = &data.manifests[0].dependencies;
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].name, "github.com/foo/bar");
        assert_eq!(deps[0].version_spec, "v1.2.3");
    }

    #[test]
    fn unparseable_manifest_produces_warning_not_failure() {
        let dir = TempDir::new().unwrap();
        let ctx = ctx_with_manifest(&dir, "package.json", "{ not valid json");

        let result = analyze(&ctx);
        assert!(result.success);
        let data = result.data.unwrap();
        assert!(data.manifests.is_empty());
        assert_eq!(data.warnings.len(), 1);
    }
}
