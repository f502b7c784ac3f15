//! Operation inputs and reports

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use wheelhouse_resolver::{FormatPreference, Release};
use wheelhouse_transfer::TransferReport;
use wheelhouse_types::ArtifactFormat;

/// One stored release, as listed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub project: String,
    pub key: String,
    pub filename: String,
    pub version: String,
    pub format: ArtifactFormat,
    /// `project==version`
    pub pin: String,
}

impl ReleaseInfo {
    pub(crate) fn from_release(project: &str, release: &Release) -> Self {
        Self {
            project: project.to_string(),
            key: release.key.clone(),
            filename: release.filename.clone(),
            version: release.version.to_string(),
            format: release.format,
            pin: release.pin(project),
        }
    }
}

/// Where fetched artifacts go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// Write `{dir}/{filename}`, creating the directory if needed
    Directory(PathBuf),
    /// Hand the bytes back to the caller
    Stdout,
    /// Leave the object in place and return a download link
    Url { expires_in: Duration },
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub preference: FormatPreference,
    pub target: FetchTarget,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            preference: FormatPreference::default(),
            target: FetchTarget::Directory(PathBuf::from(".")),
        }
    }
}

/// One resolved and downloaded artifact
#[derive(Debug, Clone, Serialize)]
pub struct FetchedArtifact {
    /// Requirement as rendered after parsing
    pub requirement: String,
    pub key: String,
    pub filename: String,
    pub version: String,
    pub format: ArtifactFormat,
    /// Bytes downloaded; unknown for [`FetchTarget::Url`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// File written, `None` unless fetching into a directory
    pub destination: Option<PathBuf>,
    /// Presigned link for [`FetchTarget::Url`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Object bytes for [`FetchTarget::Stdout`]
    #[serde(skip)]
    pub data: Option<Bytes>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchReport {
    pub fetched: Vec<FetchedArtifact>,
}

#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Access policy for every uploaded object; falls back to `store.acl`
    pub acl: Option<String>,
}

/// What happened to the index rebuild after a publish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexNotification {
    Notified {
        server: String,
        url: String,
        http_status: u16,
    },
    Skipped { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    /// Committed uploads, in input order
    pub uploads: Vec<TransferReport>,
    pub index: IndexNotification,
}
