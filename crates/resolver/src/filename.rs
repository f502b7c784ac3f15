//! Version and format inference from artifact filenames
//!
//! Filenames carry no structured metadata. Wheels follow a positional
//! `{name}-{version}[-{build}]-{python}-{abi}-{platform}.whl` layout; every
//! other format is split by peeling hyphen-delimited segments off the right
//! until what follows the project name reads as a version.

use serde::{Deserialize, Serialize};
use wheelhouse_types::artifact::{split_extension, WHEEL_EXTENSION};
use wheelhouse_types::{normalize_project_name, ArtifactFormat, Version};

/// Project, version and format read from a filename
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedArtifact {
    /// Normalized project name
    pub project: String,
    pub version: Version,
    pub format: ArtifactFormat,
}

/// Positional pieces of a wheel filename
#[derive(Debug, Clone, PartialEq, Eq)]
struct WheelName<'a> {
    name: String,
    version: String,
    python_tag: &'a str,
}

/// Parse `filename` as an artifact of the normalized `project`
///
/// Returns `None` when the filename cannot be read as a release of the
/// project. A `None` is an exclusion, never an error.
#[must_use]
pub fn parse_artifact(filename: &str, project: &str) -> Option<ParsedArtifact> {
    if filename.is_empty() || !normalize_project_name(filename).contains(project) {
        return None;
    }
    let (stem, extension) = split_extension(filename)?;
    let format = ArtifactFormat::from_extension(extension);

    if extension == WHEEL_EXTENSION {
        let wheel = split_wheel_name(stem)?;
        let version = wheel_version(&wheel)?;
        Some(ParsedArtifact {
            project: normalize_project_name(&wheel.name),
            version,
            format,
        })
    } else {
        let version = trailing_version(stem, project)?;
        Some(ParsedArtifact {
            project: project.to_string(),
            version,
            format,
        })
    }
}

/// Split a wheel stem into name, version and python tag
///
/// Name and version are the shortest leading segments that leave room for
/// the tag triple; the version must start with a digit. A build tag is
/// recognised when the segment after the version starts with a digit and
/// four or more segments remain.
fn split_wheel_name(stem: &str) -> Option<WheelName<'_>> {
    let segments: Vec<&str> = stem.split('-').collect();
    let starts_with_digit = |s: &str| s.starts_with(|c: char| c.is_ascii_digit());

    for name_end in 1..segments.len() {
        if !starts_with_digit(segments[name_end]) {
            continue;
        }
        for version_end in name_end + 1..=segments.len() {
            let rest = &segments[version_end..];
            let tags = if rest.len() >= 4 && starts_with_digit(rest[0]) {
                &rest[1..]
            } else {
                rest
            };
            if tags.len() >= 3 {
                return Some(WheelName {
                    name: segments[..name_end].join("-").replace('_', "-"),
                    version: segments[name_end..version_end].join("-").replace('_', "-"),
                    python_tag: tags[0],
                });
            }
        }
    }
    None
}

/// Wheel version with qualifiers hidden in the python tag folded back in
///
/// `pkg-1.2.3-alpha1-py2.py3-none-any.whl` splits as version `1.2.3` with
/// python tag `alpha1`; appending tag pieces while the result still parses
/// recovers `1.2.3a1`.
fn wheel_version(wheel: &WheelName<'_>) -> Option<Version> {
    let mut version = Version::parse(&wheel.version).ok()?;
    for piece in wheel.python_tag.split('.') {
        match Version::parse(&format!("{version}-{piece}")) {
            Ok(extended) => version = extended,
            Err(_) => break,
        }
    }
    Some(version)
}

/// Version following the project name in a non-wheel stem
///
/// Tries the whole stem first, then drops one trailing `-segment` at a time.
fn trailing_version(stem: &str, project: &str) -> Option<Version> {
    let mut current = stem;
    loop {
        if let Some(version) = version_after_project(current, project) {
            return Some(version);
        }
        let (head, _) = current.rsplit_once('-')?;
        current = head;
    }
}

fn version_after_project(candidate: &str, project: &str) -> Option<Version> {
    candidate
        .match_indices('-')
        .find(|(idx, _)| normalize_project_name(&candidate[..*idx]) == project)
        .and_then(|(idx, _)| Version::parse(&candidate[idx + 1..]).ok())
}
