//! Multipart intake: stores the `screenshot` part as a per-request file

use crate::pipeline::UploadedArtifact;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Form field carrying the screenshot
pub const UPLOAD_FIELD: &str = "screenshot";

const DEFAULT_MIME: &str = "application/octet-stream";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File too large. Maximum size is {limit} bytes.")]
    TooLarge { limit: usize },

    #[error("Malformed upload: {0}")]
    Malformed(String),

    #[error("Failed to store upload: {0}")]
    Storage(#[from] io::Error),
}

impl UploadError {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Malformed(_) => StatusCode::BAD_REQUEST,
            UploadError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await
    }

    /// Collision-free destination keeping the original extension
    pub fn artifact_path(&self, original_name: &str) -> PathBuf {
        let millis = chrono::Utc::now().timestamp_millis();
        let nonce = uuid::Uuid::new_v4().simple().to_string();

        let extension = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
            .map(|e| format!(".{}", e))
            .unwrap_or_default();

        self.dir
            .join(format!("screenshot-{}-{}{}", millis, &nonce[..12], extension))
    }

    /// Writes the first `screenshot` part to disk; other parts are skipped
    ///
    /// A partially written file is removed if reading or writing fails.
    pub async fn receive(
        &self,
        multipart: &mut Multipart,
    ) -> Result<Option<UploadedArtifact>, UploadError> {
        let mut stored: Option<UploadedArtifact> = None;

        while let Some(mut field) = multipart.next_field().await.map_err(|e| self.map_err(e))? {
            if stored.is_some() || field.name() != Some(UPLOAD_FIELD) {
                continue;
            }

            let original_name = field.file_name().unwrap_or_default().to_string();
            let mime_type = field.content_type().unwrap_or(DEFAULT_MIME).to_string();
            let path = self.artifact_path(&original_name);

            self.ensure_dir().await?;
            // owns the file from here on, so early returns delete it
            let guard = UploadedArtifact::new(path, mime_type, 0, original_name);
            let mut file = tokio::fs::File::create(guard.path()).await?;

            let mut written: usize = 0;
            while let Some(chunk) = field.chunk().await.map_err(|e| self.map_err(e))? {
                written += chunk.len();
                if written > self.max_bytes {
                    return Err(UploadError::TooLarge {
                        limit: self.max_bytes,
                    });
                }
                file.write_all(&chunk).await?;
            }
            file.flush().await?;

            debug!(
                path = %guard.path().display(),
                mime = %guard.mime_type(),
                size = written,
                "Stored upload"
            );
            stored = Some(guard.with_size(written as u64));
        }

        Ok(stored)
    }

    fn map_err(&self, e: MultipartError) -> UploadError {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge {
                limit: self.max_bytes,
            }
        } else {
            UploadError::Malformed(e.body_text())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_artifact_path_keeps_extension() {
        let store = UploadStore::new("/tmp/uploads", 1024);
        let path = store.artifact_path("My Screen.PNG");

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("screenshot-"));
        assert!(name.ends_with(".PNG"));
        assert_eq!(path.parent().unwrap(), Path::new("/tmp/uploads"));
    }

    #[test]
    fn test_artifact_path_drops_odd_extensions() {
        let store = UploadStore::new("/tmp/uploads", 1024);
        assert!(store.artifact_path("noext").extension().is_none());
        assert!(store.artifact_path("../../etc/passwd.sh;rm").extension().is_none());
    }

    #[test]
    fn test_artifact_paths_do_not_collide() {
        let store = UploadStore::new("/tmp/uploads", 1024);
        let a = store.artifact_path("a.png");
        let b = store.artifact_path("a.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            UploadError::TooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            UploadError::Malformed("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            UploadError::Storage(io::Error::new(io::ErrorKind::Other, "disk")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_ensure_dir_creates_nested() {
        let dir = TempDir::new().unwrap();
        let store = UploadStore::new(dir.path().join("a/b/uploads"), 1024);
        store.ensure_dir().await.unwrap();
        assert!(store.dir().is_dir());
        assert_eq!(store.max_bytes(), 1024);
    }
}
