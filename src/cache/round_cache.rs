//! Content-hash-keyed on-disk round cache for crash recovery (spec §4.8, C9).
//!
//! Mirrors `AnalysisCache`'s persistence style (serde round-tripped JSON,
//! tolerant-of-corruption load) but is keyed by a round fingerprint rather
//! than a repository-wide content hash, and stores one file per round under
//! `<root>/.handover/cache/rounds/`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::analyzers::types::FileEntry;
use crate::core::errors::{HandoverError, Result};

/// On-disk record for a single cached round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundCacheEntry<T> {
    pub hash: String,
    pub round_number: u8,
    pub model: String,
    pub result: T,
    pub created_at: String,
}

/// Reads and writes `<root>/.handover/cache/rounds/round-{N}.json`.
pub struct RoundCache {
    dir: PathBuf,
}

impl RoundCache {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(".handover").join("cache").join("rounds"),
        }
    }

    /// `SHA-256(roundNumber || model || analysisFingerprint)`, hex-encoded.
    pub fn compute_hash(round_number: u8, model: &str, analysis_fingerprint: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(round_number.to_le_bytes());
        hasher.update(model.as_bytes());
        hasher.update(analysis_fingerprint.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// SHA-256 over the sorted `"{path}:{size}"` list across all discovered
    /// files. Pure function of the (path, size) multiset: shuffled input
    /// order produces the same output because the list is sorted here.
    pub fn compute_analysis_fingerprint(files: &[FileEntry]) -> String {
        let mut tuples: Vec<String> = files
            .iter()
            .map(|f| format!("{}:{}", f.relative_path, f.size))
            .collect();
        tuples.sort();

        let mut hasher = Sha256::new();
        for tuple in tuples {
            hasher.update(tuple.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }

    fn path_for(&self, round_number: u8) -> PathBuf {
        self.dir.join(format!("round-{round_number}.json"))
    }

    /// Returns the cached result only if the stored hash matches
    /// `expected_hash`. Any read/parse failure or hash mismatch is treated as
    /// a miss, never an error.
    pub fn get<T: DeserializeOwned>(&self, round_number: u8, expected_hash: &str) -> Option<T> {
        let path = self.path_for(round_number);
        let content = fs::read_to_string(&path).ok()?;

        let entry: RoundCacheEntry<T> = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(err) => {
                warn!(round = round_number, error = %err, "round cache entry is corrupt, ignoring");
                return None;
            }
        };

        if entry.hash != expected_hash {
            debug!(round = round_number, "round cache stale: hash mismatch");
            return None;
        }

        Some(entry.result)
    }

    /// Writes a round result. A temp-file-then-rename sequence is used for
    /// atomicity, though the spec does not mandate it.
    pub fn set<T: Serialize>(&self, round_number: u8, hash: &str, model: &str, result: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| HandoverError::io(format!("failed to create round cache directory: {}", self.dir.display()), e))?;

        let entry = RoundCacheEntry {
            hash: hash.to_string(),
            round_number,
            model: model.to_string(),
            result,
            created_at: Utc::now().to_rfc3339(),
        };

        let serialized = serde_json::to_string_pretty(&entry)?;
        let final_path = self.path_for(round_number);
        let tmp_path = final_path.with_extension("json.tmp");

        fs::write(&tmp_path, serialized)
            .map_err(|e| HandoverError::io(format!("failed to write round cache temp file: {}", tmp_path.display()), e))?;
        fs::rename(&tmp_path, &final_path)
            .map_err(|e| HandoverError::io(format!("failed to finalize round cache file: {}", final_path.display()), e))?;

        Ok(())
    }

    /// Recursively removes the round cache directory (`--no-cache`).
    pub fn clear(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)
                .map_err(|e| HandoverError::io(format!("failed to clear round cache: {}", self.dir.display()), e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn fingerprint_is_order_independent() {
        let a = vec![
            FileEntry { relative_path: "a.rs".into(), absolute_path: "/a.rs".into(), size: 10, extension: ".rs".into() },
            FileEntry { relative_path: "b.rs".into(), absolute_path: "/b.rs".into(), size: 20, extension: ".rs".into() },
        ];
        let mut b = a.clone();
        b.reverse();

        assert_eq!(
            RoundCache::compute_analysis_fingerprint(&a),
            RoundCache::compute_analysis_fingerprint(&b)
        );
    }

    #[test]
    fn get_returns_none_when_hash_differs() {
        let dir = TempDir::new().unwrap();
        let cache = RoundCache::new(dir.path());
        cache.set(1, "hash-a", "model-x", &serde_json::json!({"ok": true})).unwrap();

        let hit: Option<serde_json::Value> = cache.get(1, "hash-a");
        assert!(hit.is_some());

        let miss: Option<serde_json::Value> = cache.get(1, "hash-b");
        assert!(miss.is_none());
    }

    #[test]
    fn clear_removes_directory() {
        let dir = TempDir::new().unwrap();
        let cache = RoundCache::new(dir.path());
        cache.set(2, "h", "m", &serde_json::json!(null)).unwrap();
        cache.clear().unwrap();

        let miss: Option<serde_json::Value> = cache.get(2, "h");
        assert!(miss.is_none());
    }
}
