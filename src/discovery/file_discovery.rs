//! Repository file discovery (spec §4.1, C1).
//!
//! Enumerates candidate files for analysis by walking the repository root,
//! applying the root-level `.gitignore` as a secondary filter (this is a
//! plain filesystem walk, not a git-index read — git metadata belongs to the
//! `GitHistory` analyzer, C3.3). A fixed binary-extension set and a 2 MiB
//! size cutoff are applied at traversal time so later stages never have to
//! reason about binary or oversized files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use tracing::{debug, info, warn};

use crate::core::errors::{HandoverError, Result};
use crate::analyzers::types::FileEntry;

/// Files larger than this are skipped outright (spec §4.1).
pub const MAX_FILE_SIZE_BYTES: u64 = 2 * 1024 * 1024;

/// Fixed binary-extension set; matching files are dropped entirely rather
/// than sampled for content (spec §4.1).
const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "webp", "svg",
    "mp3", "mp4", "avi", "wav", "mov", "mkv", "flv",
    "zip", "tar", "gz", "bz2", "xz", "7z", "rar",
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    "exe", "dll", "so", "dylib", "bin", "class", "jar", "wasm",
    "woff", "woff2", "ttf", "eot", "sqlite", "db",
];

/// Directories always excluded regardless of `.gitignore` contents.
const DEFAULT_EXCLUDES: &[&str] = &[
    "**/.git/**",
    "**/node_modules/**",
    "**/target/**",
    "**/__pycache__/**",
    "**/dist/**",
    "**/build/**",
    "**/.venv/**",
    "**/vendor/**",
    "**/.handover/**",
];

/// Discovers every eligible file under `root`, applying `include`/`exclude`
/// globs from configuration on top of the default ignore rules.
pub struct FileDiscovery {
    root: PathBuf,
    include: Vec<String>,
    exclude: Vec<String>,
}

/// Result of a discovery pass: the ordered file list eligible for analysis.
/// Per-file content hashing for cache invalidation (C2) happens downstream in
/// `AnalysisCache`, which reads file contents directly rather than off a
/// repository-wide fingerprint computed here.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    pub files: Vec<FileEntry>,
}

impl FileDiscovery {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }

    pub fn with_include(mut self, include: Vec<String>) -> Self {
        self.include = include;
        self
    }

    pub fn with_exclude(mut self, exclude: Vec<String>) -> Self {
        self.exclude = exclude;
        self
    }

    /// Runs discovery. Errors only on malformed glob patterns; filesystem
    /// surprises (unreadable entries) are logged and skipped.
    pub fn discover(&self) -> Result<DiscoveryResult> {
        let root = fs::canonicalize(&self.root).unwrap_or_else(|_| self.root.clone());

        let mut exclude_patterns: Vec<String> = DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect();
        exclude_patterns.extend(self.exclude.iter().cloned());

        let include_glob = if self.include.is_empty() {
            None
        } else {
            compile_globset(&self.include)?
        };
        let exclude_glob = compile_globset(&exclude_patterns)?;

        let walked = walk_filesystem(&root);

        let mut entries = Vec::new();

        for path in walked {
            if !should_keep(&path, &root, include_glob.as_ref(), exclude_glob.as_ref()) {
                continue;
            }

            let extension_bare = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default();

            if BINARY_EXTENSIONS.contains(&extension_bare.as_str()) {
                continue;
            }

            let metadata = match fs::metadata(&path) {
                Ok(m) => m,
                Err(err) => {
                    debug!(path = %path.display(), error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if metadata.len() > MAX_FILE_SIZE_BYTES {
                warn!(path = %path.display(), size = metadata.len(), "skipping oversized file");
                continue;
            }

            let relative = path
                .strip_prefix(&root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");

            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| format!(".{}", e.to_ascii_lowercase()))
                .unwrap_or_default();

            entries.push(FileEntry {
                relative_path: relative,
                absolute_path: path.to_string_lossy().into_owned(),
                size: metadata.len(),
                extension,
            });
        }

        entries.sort();

        info!(count = entries.len(), "file discovery completed");

        Ok(DiscoveryResult { files: entries })
    }
}

fn compile_globset(patterns: &[String]) -> Result<Option<GlobSet>> {
    let mut builder = GlobSetBuilder::new();
    let mut added = false;

    for pattern in patterns {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            continue;
        }
        let glob = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|err| HandoverError::config(format!("invalid glob pattern '{pattern}': {err}")))?;
        builder.add(glob);
        added = true;
    }

    if added {
        builder
            .build()
            .map(Some)
            .map_err(|err| HandoverError::config(format!("failed to build glob set: {err}")))
    } else {
        Ok(None)
    }
}

fn walk_filesystem(root: &Path) -> Vec<PathBuf> {
    let mut collected = Vec::new();
    let mut seen = HashSet::new();

    if root.is_file() {
        collected.push(root.to_path_buf());
        return collected;
    }

    let walker = WalkBuilder::new(root)
        .standard_filters(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .hidden(false)
        .build();

    for entry in walker {
        match entry {
            Ok(dir_entry) => {
                if !dir_entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
                    continue;
                }
                let path = dir_entry.path().to_path_buf();
                if seen.insert(path.clone()) {
                    collected.push(path);
                }
            }
            Err(err) => warn!(error = %err, "failed to walk directory entry"),
        }
    }

    collected
}

fn should_keep(path: &Path, base: &Path, include: Option<&GlobSet>, exclude: Option<&GlobSet>) -> bool {
    let relative = path.strip_prefix(base).unwrap_or(path);

    if let Some(exclude) = exclude {
        if exclude.is_match(relative) {
            return false;
        }
    }

    if let Some(include) = include {
        include.is_match(relative)
    } else {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovers_plain_files_without_git() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target").join("ignored.rs"), "junk").unwrap();

        let result = FileDiscovery::new(dir.path()).discover().unwrap();
        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].relative_path, "main.rs");
    }

    #[test]
    fn excludes_oversized_files() {
        let dir = TempDir::new().unwrap();
        let big = vec![b'a'; (MAX_FILE_SIZE_BYTES + 1) as usize];
        fs::write(dir.path().join("big.txt"), big).unwrap();

        let result = FileDiscovery::new(dir.path()).discover().unwrap();
        assert!(result.files.is_empty());
    }

    #[test]
    fn exclude_glob_removes_matching_paths() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("docs")).unwrap();
        fs::write(dir.path().join("docs").join("readme.md"), "hi").unwrap();
        fs::write(dir.path().join("keep.rs"), "fn f(){}").unwrap();

        let result = FileDiscovery::new(dir.path())
            .with_exclude(vec!["**/docs/**".to_string()])
            .discover()
            .unwrap();

        assert_eq!(result.files.len(), 1);
        assert_eq!(result.files[0].relative_path, "keep.rs");
    }
}
