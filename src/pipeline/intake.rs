//! Intake validation for uploaded screenshots

use super::artifact::UploadedArtifact;
use thiserror::Error;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file type. Please upload an image.")]
    InvalidType { mime_type: String },

    #[error("Uploaded file is empty. Please upload an image.")]
    EmptyFile,
}

/// Classifies an upload without touching the filesystem
///
/// The result depends only on presence, declared mimetype and size.
pub fn classify(upload: Option<&UploadedArtifact>) -> Result<(), IntakeError> {
    let artifact = upload.ok_or(IntakeError::MissingFile)?;

    if !artifact.mime_type().starts_with("image/") {
        return Err(IntakeError::InvalidType {
            mime_type: artifact.mime_type().to_string(),
        });
    }

    if artifact.size_bytes() == 0 {
        return Err(IntakeError::EmptyFile);
    }

    Ok(())
}

/// Accepts an image upload or rejects it, deleting rejected files
///
/// A rejected artifact is removed here because no later step will see it.
pub async fn validate(upload: Option<UploadedArtifact>) -> Result<UploadedArtifact, IntakeError> {
    match classify(upload.as_ref()) {
        Ok(()) => {
            let artifact = upload.ok_or(IntakeError::MissingFile)?;
            debug!(
                name = %artifact.original_name(),
                mime = %artifact.mime_type(),
                size = artifact.size_bytes(),
                "Upload accepted"
            );
            Ok(artifact)
        }
        Err(err) => {
            if let Some(mut artifact) = upload {
                if let Err(e) = artifact.cleanup().await {
                    error!(
                        path = %artifact.path().display(),
                        error = %e,
                        "Failed to remove rejected upload"
                    );
                }
            }
            debug!(reason = %err, "Upload rejected");
            Err(err)
        }
    }
}
