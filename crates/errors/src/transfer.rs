//! Multi-part transfer error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum TransferError {
    #[error("source file is empty: {path}")]
    EmptySource { path: String },

    #[error("cannot derive a project prefix from file name: {name}")]
    InvalidFilename { name: String },

    #[error("part {part_number} failed after {attempts} attempts: {message}")]
    ChunkUploadFailed {
        part_number: u32,
        attempts: u32,
        message: String,
    },

    #[error("upload of {key} incomplete: {actual} of {expected} parts registered")]
    CommitMismatch {
        key: String,
        expected: u32,
        actual: u32,
    },

    #[error("failed to commit {key}: {message}")]
    CommitFailed { key: String, message: String },

    #[error("failed to apply access policy {policy} to {key}: {message}")]
    AclFailed {
        key: String,
        policy: String,
        message: String,
    },

    #[error("worker pool error: {message}")]
    WorkerPool { message: String },
}

impl UserFacingError for TransferError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptySource { .. } => Some("Check that the artifact was built completely."),
            Self::InvalidFilename { .. } => {
                Some("Artifact file names must start with the project name, e.g. name-1.0.tar.gz.")
            }
            Self::ChunkUploadFailed { .. } | Self::CommitMismatch { .. } => {
                Some("The partial upload was discarded; retry the publish.")
            }
            Self::AclFailed { .. } => {
                Some("The object was stored; set its access policy manually or publish again.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ChunkUploadFailed { .. } | Self::CommitMismatch { .. } | Self::CommitFailed { .. }
        )
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::EmptySource { .. } => "transfer.empty_source",
            Self::InvalidFilename { .. } => "transfer.invalid_filename",
            Self::ChunkUploadFailed { .. } => "transfer.chunk_upload_failed",
            Self::CommitMismatch { .. } => "transfer.commit_mismatch",
            Self::CommitFailed { .. } => "transfer.commit_failed",
            Self::AclFailed { .. } => "transfer.acl_failed",
            Self::WorkerPool { .. } => "transfer.worker_pool",
        };
        Some(code)
    }
}
