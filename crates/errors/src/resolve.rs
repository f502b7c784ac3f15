//! Artifact resolution error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum ResolveError {
    #[error("package {requirement} not found")]
    NotFound { requirement: String },

    #[error("found too many results for {requirement}:\n  {}", .candidates.join("\n  "))]
    Ambiguous {
        requirement: String,
        candidates: Vec<String>,
    },
}

impl UserFacingError for ResolveError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Run `wheelhouse list` to see which projects and releases are stored.")
            }
            Self::Ambiguous { .. } => Some(
                "Pin an exact version, or pass --src / --egg to pick a source archive or egg.",
            ),
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::NotFound { .. } => "resolve.not_found",
            Self::Ambiguous { .. } => "resolve.ambiguous",
        };
        Some(code)
    }
}
