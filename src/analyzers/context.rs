//! Shared analyzer envelope: `AnalysisContext` and `AnalyzerResult<T>`
//! (spec §4.3).

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::analyzers::types::FileEntry;
use crate::cache::analysis_cache::AnalysisCache;
use crate::core::config::{GitDepth, HandoverConfig};

/// Immutable input shared by all eight analyzers. Analyzers never mutate
/// this; it is constructed once per run by the coordinator.
#[derive(Clone)]
pub struct AnalysisContext {
    pub root: PathBuf,
    pub files: Arc<Vec<FileEntry>>,
    pub config: Arc<HandoverConfig>,
    pub cache: Arc<AnalysisCache>,
    pub git_depth: GitDepth,
}

impl AnalysisContext {
    pub fn new(root: PathBuf, files: Vec<FileEntry>, config: HandoverConfig, cache: AnalysisCache) -> Self {
        let git_depth = config.analysis.git_depth;
        Self {
            root,
            files: Arc::new(files),
            config: Arc::new(config),
            cache: Arc::new(cache),
            git_depth,
        }
    }

    pub fn absolute(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

/// Uniform outcome envelope every analyzer returns. A failed analyzer still
/// returns `Ok` of an `AnalyzerResult` with `success = false`; analyzers
/// should never propagate a hard error to the coordinator (spec §4.3: "a
/// single analyzer failure never discards others").
#[derive(Debug, Clone)]
pub struct AnalyzerResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl<T> AnalyzerResult<T> {
    pub fn ok(data: T, started: Instant) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    pub fn failed(error: impl Into<String>, started: Instant) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: Some(T::default()),
            error: Some(error.into()),
            elapsed_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Unwraps into the success payload, falling back to the default
    /// sentinel shape when the analyzer failed.
    pub fn into_data(self) -> T
    where
        T: Default,
    {
        self.data.unwrap_or_default()
    }
}

/// Batch size for file-content reads across analyzers (spec §4.3/§5).
pub const FILE_READ_BATCH_SIZE: usize = 50;

/// Reads a batch of files, tolerating per-file failures by substituting
/// empty content and logging at debug level (spec §4.3, §7).
pub fn read_batch(paths: &[PathBuf]) -> Vec<(PathBuf, String)> {
    paths
        .iter()
        .map(|path| {
            let content = crate::core::file_utils::FileReader::read_to_string(path).unwrap_or_else(|err| {
                tracing::debug!(path = %path.display(), error = %err, "file read failed, treating as empty");
                String::new()
            });
            (path.clone(), content)
        })
        .collect()
}
