use serde::{Deserialize, Serialize};

use super::FailureContext;

/// Multi-part transfer events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransferEvent {
    /// A multi-part session was opened for `key`
    SessionOpened {
        key: String,
        upload_id: String,
        total_size: u64,
        chunk_size: u64,
        chunk_count: u32,
    },

    /// One part landed in the store
    ChunkUploaded {
        key: String,
        part_number: u32,
        bytes: u64,
    },

    /// A part failed and will be attempted again
    ChunkRetrying {
        key: String,
        part_number: u32,
        attempt: u32,
        max_attempts: u32,
        error: String,
    },

    /// Every part landed and the object was committed
    Committed { key: String, parts: u32 },

    /// Access policy applied to the committed object
    AclApplied { key: String, policy: String },

    /// The session was discarded
    Aborted {
        key: String,
        expected_parts: u32,
        committed_parts: u32,
        failure: FailureContext,
    },
}

impl TransferEvent {
    /// Object key this event refers to
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::SessionOpened { key, .. }
            | Self::ChunkUploaded { key, .. }
            | Self::ChunkRetrying { key, .. }
            | Self::Committed { key, .. }
            | Self::AclApplied { key, .. }
            | Self::Aborted { key, .. } => key,
        }
    }
}
