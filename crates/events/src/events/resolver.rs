use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Requirement resolution events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResolverEvent {
    /// Resolution of one requirement started against a key listing
    ResolutionStarted { requirement: String, keys: usize },

    /// A single artifact was chosen
    CandidateSelected {
        requirement: String,
        key: String,
        version: String,
        format: String,
    },

    /// Resolution ended without a single artifact
    ResolutionFailed {
        requirement: String,
        failure: FailureContext,
    },
}
