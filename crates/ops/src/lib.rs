#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! High-level operations orchestration for wheelhouse
//!
//! This crate sits between the CLI and the specialized crates. Each
//! operation takes an [`OpsCtx`], reports progress through its event
//! sender and returns a serializable report.

mod context;
mod fetch;
mod publish;
mod query;
mod rehost;
mod types;

pub use context::{OpsContextBuilder, OpsCtx};
pub use fetch::fetch;
pub use publish::publish;
pub use query::{list_projects, list_releases};
pub use rehost::{rehost, PackageDownloader, PipDownloader, RehostOptions};
pub use types::{
    FetchOptions, FetchReport, FetchTarget, FetchedArtifact, IndexNotification, PublishOptions,
    PublishReport, ReleaseInfo,
};

use wheelhouse_errors::{Error, OpsError};

/// Operation result that can be serialized for CLI output
#[derive(Clone, Debug, serde::Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OperationResult {
    /// Project names in the bucket
    ProjectList(Vec<String>),
    /// Releases of the requested projects
    ReleaseList(Vec<ReleaseInfo>),
    FetchReport(FetchReport),
    PublishReport(PublishReport),
    /// Generic success message
    Success(String),
}

impl OperationResult {
    /// Convert to JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(|e| {
            OpsError::SerializationError {
                message: e.to_string(),
            }
            .into()
        })
    }
}
