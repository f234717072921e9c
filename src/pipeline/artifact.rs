//! Per-request temporary upload
//!
//! An [`UploadedArtifact`] owns the file the upload layer wrote for one
//! request. Deletion is idempotent, and a value dropped without an explicit
//! [`cleanup`](UploadedArtifact::cleanup) still removes its file, which covers
//! handler futures cancelled by a disconnecting client.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug)]
pub struct UploadedArtifact {
    path: PathBuf,
    mime_type: String,
    size_bytes: u64,
    original_name: String,
    removed: bool,
}

impl UploadedArtifact {
    pub fn new(
        path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
        size_bytes: u64,
        original_name: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            mime_type: mime_type.into(),
            size_bytes,
            original_name: original_name.into(),
            removed: false,
        }
    }

    /// Records the final size once the upload layer has finished writing
    pub(crate) fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    /// True until the file has been deleted, by us or by someone else
    pub fn exists(&self) -> bool {
        !self.removed && self.path.exists()
    }

    /// Reads the whole file
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }

    /// Deletes the file if it is still on disk
    ///
    /// Returns `Ok(true)` if this call removed it and `Ok(false)` if it was
    /// already gone. Calling it again after success is a no-op.
    pub async fn cleanup(&mut self) -> io::Result<bool> {
        if self.removed {
            return Ok(false);
        }
        let result = tokio::fs::remove_file(&self.path).await;
        self.record_removal(result)
    }

    /// Blocking removal for `Drop`, where no executor is available
    fn cleanup_blocking(&mut self) -> io::Result<bool> {
        if self.removed {
            return Ok(false);
        }
        let result = std::fs::remove_file(&self.path);
        self.record_removal(result)
    }

    fn record_removal(&mut self, result: io::Result<()>) -> io::Result<bool> {
        match result {
            Ok(()) => {
                self.removed = true;
                debug!(path = %self.path.display(), "Removed uploaded artifact");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.removed = true;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

impl Drop for UploadedArtifact {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        match self.cleanup_blocking() {
            Ok(true) => warn!(
                path = %self.path.display(),
                "Uploaded artifact removed on drop; request ended before cleanup"
            ),
            Ok(false) => {}
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove uploaded artifact on drop"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn artifact_in(dir: &TempDir, name: &str) -> UploadedArtifact {
        let path = dir.path().join(name);
        fs::write(&path, b"\x89PNG\r\n\x1a\n").unwrap();
        UploadedArtifact::new(path, "image/png", 8, "shot.png")
    }

    #[test]
    fn test_accessors() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact_in(&dir, "a.png");
        assert_eq!(artifact.mime_type(), "image/png");
        assert_eq!(artifact.size_bytes(), 8);
        assert_eq!(artifact.original_name(), "shot.png");
        assert!(artifact.exists());
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut artifact = artifact_in(&dir, "a.png");
        let path = artifact.path().to_path_buf();

        assert!(artifact.cleanup().await.unwrap());
        assert!(!path.exists());
        assert!(!artifact.exists());
        assert!(!artifact.cleanup().await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_tolerates_external_deletion() {
        let dir = TempDir::new().unwrap();
        let mut artifact = artifact_in(&dir, "a.png");
        fs::remove_file(artifact.path()).unwrap();

        assert!(!artifact.cleanup().await.unwrap());
    }

    #[tokio::test]
    async fn test_drop_after_async_cleanup_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut artifact = artifact_in(&dir, "a.png");
        assert!(artifact.cleanup().await.unwrap());

        fs::write(artifact.path(), b"replacement").unwrap();
        let path = artifact.path().to_path_buf();
        drop(artifact);
        assert!(path.exists(), "a cleaned artifact must not delete again on drop");
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact_in(&dir, "a.png");
        let path = artifact.path().to_path_buf();

        drop(artifact);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_read() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact_in(&dir, "a.png");
        let bytes = artifact.read().await.unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }
}
