//! Bucket listings for humans

use crate::candidate::split_key;
use crate::resolver::candidates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use wheelhouse_types::{normalize_project_name, ArtifactFormat, Requirement, Version};

/// One stored release of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub key: String,
    pub filename: String,
    pub version: Version,
    pub format: ArtifactFormat,
}

impl Release {
    /// `project==version` as typed on the command line
    #[must_use]
    pub fn pin(&self, project: &str) -> String {
        format!("{project}=={}", self.version)
    }
}

/// Distinct normalized project prefixes, sorted
#[must_use]
pub fn list_projects<S: AsRef<str>>(keys: &[S]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| split_key(key.as_ref()))
        .map(|(prefix, _)| normalize_project_name(prefix))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Releases of the requirement's project satisfying its constraints, newest first
///
/// Releases sharing a version keep their listing order.
#[must_use]
pub fn list_releases<S: AsRef<str>>(requirement: &Requirement, keys: &[S]) -> Vec<Release> {
    let mut releases: Vec<Release> = candidates(requirement, keys)
        .into_iter()
        .filter_map(|c| {
            let version = c.version?;
            Some(Release {
                key: c.path,
                filename: c.filename,
                version,
                format: c.format,
            })
        })
        .collect();
    releases.sort_by(|a, b| b.version.cmp(&a.version));
    releases
}
