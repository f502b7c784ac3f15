//! Object store error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum StorageError {
    #[error("object not found: {key}")]
    ObjectNotFound { key: String },

    #[error("invalid object key: {key}")]
    InvalidKey { key: String },

    #[error("multipart upload not found: {upload_id}")]
    UploadNotFound { upload_id: String },

    #[error("invalid part number {part_number} for upload {upload_id}")]
    InvalidPart { upload_id: String, part_number: u32 },

    #[error("unsupported access policy: {policy}")]
    UnsupportedPolicy { policy: String },

    #[error("permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("path not found: {path}")]
    PathNotFound { path: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("backend error: {message}")]
    Backend { message: String },

    #[error("{backend} store does not support {operation}")]
    Unsupported { backend: String, operation: String },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            message: err.to_string(),
        }
    }
}

impl StorageError {
    /// Convert an `io::Error` into a `StorageError` with an associated path
    #[must_use]
    pub fn from_io_with_path(err: &std::io::Error, path: &std::path::Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.display().to_string(),
            },
            std::io::ErrorKind::NotFound => Self::PathNotFound {
                path: path.display().to_string(),
            },
            _ => Self::IoError {
                message: format!("{}: {}", path.display(), err),
            },
        }
    }
}

impl UserFacingError for StorageError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::PermissionDenied { .. } => {
                Some("Check the permissions of the store root directory.")
            }
            Self::UnsupportedPolicy { .. } => Some(
                "Use a canned policy such as private, public-read or bucket-owner-full-control.",
            ),
            Self::PathNotFound { .. } => Some("Check the `store.root` setting."),
            Self::Unsupported { .. } => Some("Use an S3 bucket for this operation."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::IoError { .. } | Self::Backend { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ObjectNotFound { .. } => "storage.object_not_found",
            Self::InvalidKey { .. } => "storage.invalid_key",
            Self::UploadNotFound { .. } => "storage.upload_not_found",
            Self::InvalidPart { .. } => "storage.invalid_part",
            Self::UnsupportedPolicy { .. } => "storage.unsupported_policy",
            Self::PermissionDenied { .. } => "storage.permission_denied",
            Self::PathNotFound { .. } => "storage.path_not_found",
            Self::IoError { .. } => "storage.io_error",
            Self::Backend { .. } => "storage.backend",
            Self::Unsupported { .. } => "storage.unsupported",
        };
        Some(code)
    }
}
