//! AnalysisCache (spec §3/§4.2, C2). Persists a `relative path -> {hash,
//! analyzedAtMs}` map between runs under `<root>/.handover/.cache.json`, used
//! both to skip re-reading unchanged files within a run and to drive
//! incremental-run display markers. Mirrors the versioned, signature-
//! invalidated cache record shape used for the teacher's stop-motif cache,
//! minus anything specific to that domain.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::errors::{HandoverError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub analyzed_at_ms: u64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    #[serde(flatten)]
    entries: HashMap<String, CacheEntry>,
}

/// No locking: single-process assumption (spec §4.2).
pub struct AnalysisCache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
    dirty: bool,
}

impl AnalysisCache {
    /// Loads the cache from disk. Malformed JSON is tolerated by starting
    /// fresh rather than erroring.
    pub fn load(root: impl AsRef<Path>) -> Self {
        let path = root.as_ref().join(".handover").join(".cache.json");

        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|content| match serde_json::from_str::<CacheFile>(&content) {
                Ok(file) => Some(file.entries),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "analysis cache is corrupt, starting fresh");
                    None
                }
            })
            .unwrap_or_default();

        Self { path, entries, dirty: false }
    }

    /// True when `path`'s recorded hash equals `hash`.
    pub fn is_unchanged(&self, path: &str, hash: &str) -> bool {
        self.entries.get(path).map(|e| e.hash == hash).unwrap_or(false)
    }

    /// Records or refreshes a file's hash. A write that matches the already
    /// recorded hash does not mark the cache dirty.
    pub fn update(&mut self, path: &str, hash: &str) {
        if self.is_unchanged(path, hash) {
            return;
        }

        let analyzed_at_ms = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0);
        self.entries.insert(path.to_string(), CacheEntry { hash: hash.to_string(), analyzed_at_ms });
        self.dirty = true;
    }

    /// Subset of `current_hashes`' keys whose hash differs from (or is
    /// absent from) the cached map.
    pub fn get_changed_files(&self, current_hashes: &HashMap<String, String>) -> HashSet<String> {
        current_hashes
            .iter()
            .filter(|(path, hash)| !self.is_unchanged(path, hash))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Writes the cache to disk; a no-op when no entry has been added or
    /// updated since `load()`.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| HandoverError::io(format!("failed to create cache directory: {}", parent.display()), e))?;
        }

        let file = CacheFile { entries: self.entries.clone() };
        let serialized = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, serialized)
            .map_err(|e| HandoverError::io(format!("failed to write analysis cache: {}", self.path.display()), e))?;

        self.dirty = false;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fresh_cache_reports_everything_changed() {
        let dir = TempDir::new().unwrap();
        let cache = AnalysisCache::load(dir.path());
        assert!(!cache.is_unchanged("a.rs", "hash-a"));
    }

    #[test]
    fn update_then_reload_persists_hash() {
        let dir = TempDir::new().unwrap();
        let mut cache = AnalysisCache::load(dir.path());
        cache.update("a.rs", "hash-a");
        cache.save().unwrap();

        let reloaded = AnalysisCache::load(dir.path());
        assert!(reloaded.is_unchanged("a.rs", "hash-a"));
        assert!(!reloaded.is_unchanged("a.rs", "hash-b"));
    }

    #[test]
    fn corrupt_cache_file_starts_fresh() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(".handover")).unwrap();
        fs::write(dir.path().join(".handover").join(".cache.json"), "not json").unwrap();

        let cache = AnalysisCache::load(dir.path());
        assert!(cache.is_empty());
    }

    #[test]
    fn save_is_noop_when_not_dirty() {
        let dir = TempDir::new().unwrap();
        let mut cache = AnalysisCache::load(dir.path());
        cache.save().unwrap();
        assert!(!dir.path().join(".handover").join(".cache.json").exists());
    }

    #[test]
    fn get_changed_files_reports_only_differing_entries() {
        let dir = TempDir::new().unwrap();
        let mut cache = AnalysisCache::load(dir.path());
        cache.update("a.rs", "hash-a");
        cache.update("b.rs", "hash-b");

        let mut current = HashMap::new();
        current.insert("a.rs".to_string(), "hash-a".to_string());
        current.insert("b.rs".to_string(), "hash-b2".to_string());
        current.insert("c.rs".to_string(), "hash-c".to_string());

        let changed = cache.get_changed_files(&current);
        assert_eq!(changed, vec!["b.rs".to_string(), "c.rs".to_string()].into_iter().collect());
    }
}
