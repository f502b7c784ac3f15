//! Operation orchestration error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum OpsError {
    #[error("component not found: {component}")]
    MissingComponent { component: String },

    #[error("nothing to {operation}")]
    NoInputs { operation: String },

    #[error("serialization error: {message}")]
    SerializationError { message: String },

    #[error("failed to download {requirement}: {message}")]
    DownloadFailed {
        requirement: String,
        message: String,
    },
}

impl UserFacingError for OpsError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NoInputs { .. } => Some("Pass at least one requirement or file."),
            Self::DownloadFailed { .. } => {
                Some("Check that the package exists on the index and `rehost.pip` points to pip.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::DownloadFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::MissingComponent { .. } => "ops.missing_component",
            Self::NoInputs { .. } => "ops.no_inputs",
            Self::SerializationError { .. } => "ops.serialization",
            Self::DownloadFailed { .. } => "ops.download_failed",
        };
        Some(code)
    }
}
