//! Transient scan targets.
//!
//! The daemon reads the content from disk, so every session materializes
//! it first as `<spool_dir>/<digest>.tmp` and removes it afterwards. The
//! same digest always maps to the same path.

use crate::core::error::ScanError;
use crate::core::input::ScanContent;
use crate::core::types::ContentDigest;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of spooled scan targets.
pub const SPOOL_EXTENSION: &str = "tmp";

/// Directory holding transient scan targets.
#[derive(Debug, Clone)]
pub struct SpoolDir {
    dir: PathBuf,
}

impl SpoolDir {
    /// Uses `dir` for scan targets. Nothing is touched until a write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the scan target path for a digest.
    pub fn target_path(&self, digest: &ContentDigest) -> PathBuf {
        self.dir
            .join(format!("{}.{}", digest.as_str(), SPOOL_EXTENSION))
    }

    /// Writes the content to its scan target, replacing any stale file.
    ///
    /// Concurrent sessions over identical content share the path; the
    /// replacement is best-effort, not atomic.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Artifact` if the directory cannot be created or
    /// the file cannot be removed or written. A partially written file is
    /// removed before the error is returned.
    pub async fn materialize(&self, content: &ScanContent) -> Result<PathBuf, ScanError> {
        let path = self.target_path(content.digest());
        let artifact_err = |source: std::io::Error| ScanError::Artifact {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(artifact_err)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(path = %path.display(), "Removed stale scan target"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(artifact_err(e)),
        }

        let written = tokio::fs::write(&path, content.data()).await;
        self.settle_write(&path, written).await?;

        debug!(path = %path.display(), size = content.size(), "Scan target written");
        Ok(path)
    }

    /// Turns a failed write into `ScanError::Artifact`, first removing
    /// whatever part of the file made it to disk.
    async fn settle_write(
        &self,
        path: &Path,
        written: std::io::Result<()>,
    ) -> Result<(), ScanError> {
        let source = match written {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed partial scan target"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove partial scan target"
            ),
        }

        Err(ScanError::Artifact {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Removes a scan target. Failures are logged, never returned.
    pub async fn remove(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Scan target removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove scan target"),
        }
    }
}
