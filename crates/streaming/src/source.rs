use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

#[derive(Debug)]
pub enum SourceError {
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::NotFound(path) => write!(f, "{} not found", path.display()),
            SourceError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// Where feature files are fetched from.
pub trait DataSource: Clone + Send + Sync + 'static {
    fn fetch(&self, path: &Path) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Reads feature files from the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsSource;

impl DataSource for FsSource {
    async fn fetch(&self, path: &Path) -> Result<String, SourceError> {
        debug!("reading {}", path.display());
        tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SourceError::NotFound(path.to_path_buf())
            } else {
                SourceError::Io {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })
    }
}

/// In-memory payloads keyed by path, for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: Arc<BTreeMap<PathBuf, String>>,
}

impl MemorySource {
    pub fn new(files: impl IntoIterator<Item = (PathBuf, String)>) -> Self {
        Self {
            files: Arc::new(files.into_iter().collect()),
        }
    }
}

impl DataSource for MemorySource {
    async fn fetch(&self, path: &Path) -> Result<String, SourceError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(path.to_path_buf()))
    }
}
