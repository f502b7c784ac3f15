use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Index server rebuild notification events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IndexEvent {
    RebuildRequested { url: String },

    RebuildCompleted { url: String, status: u16 },

    RebuildFailed { url: String, failure: FailureContext },

    /// Notification suppressed, e.g. after a failed upload in the batch
    RebuildSkipped { reason: String },
}
