//! Stored object keys viewed as release candidates

use crate::filename::parse_artifact;
use serde::{Deserialize, Serialize};
use wheelhouse_types::{normalize_project_name, ArtifactFormat, Version};

/// One stored object key, split and inspected for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Full storage path, `{prefix}/{filename}`
    pub path: String,
    pub prefix: String,
    pub filename: String,
    pub format: ArtifactFormat,
    /// `None` when the filename could not be read as a release
    pub version: Option<Version>,
}

/// Split a storage path at its first `/`; `None` if there is no filename part
#[must_use]
pub fn split_key(path: &str) -> Option<(&str, &str)> {
    path.split_once('/')
        .filter(|(_, filename)| !filename.is_empty())
}

impl ArtifactKey {
    /// Inspect `path` as a candidate for the normalized `project`
    ///
    /// Returns `None` when the key has no filename part or its prefix
    /// belongs to another project.
    #[must_use]
    pub fn inspect(path: &str, project: &str) -> Option<Self> {
        let (prefix, filename) = split_key(path)?;
        if normalize_project_name(prefix) != project {
            return None;
        }
        let parsed = parse_artifact(filename, project).filter(|p| p.project == project);
        let format = parsed.as_ref().map_or_else(
            || ArtifactFormat::detect(filename).unwrap_or(ArtifactFormat::Source),
            |p| p.format,
        );
        Some(Self {
            path: path.to_string(),
            prefix: prefix.to_string(),
            filename: filename.to_string(),
            format,
            version: parsed.map(|p| p.version),
        })
    }
}
