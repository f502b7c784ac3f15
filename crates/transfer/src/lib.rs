#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Multi-part artifact transfer for wheelhouse
//!
//! A local file is planned into chunks, uploaded by a bounded pool of
//! workers with per-chunk retries, and committed only when the store holds
//! every part. Incomplete sessions are aborted.

mod engine;
mod plan;
mod retry;

pub use engine::{
    TransferConfig, TransferEngine, TransferReport, TransferSession, DEFAULT_CONTENT_TYPE,
};
pub use plan::{destination_key, project_prefix, Chunk, ChunkPlan, BASE_CHUNK_SIZE};
pub use retry::{calculate_backoff_delay, RetryConfig};
