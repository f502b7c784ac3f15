//! Requirement resolution against a flat key listing
//!
//! Pipeline:
//! 1. keep keys whose prefix normalizes to the requirement's project
//! 2. keep keys whose filename parses to that project and a version
//! 3. keep candidates satisfying every constraint
//! 4. keep only the group sharing the highest version
//! 5. break ties by format: wheel, then egg, then source, with overrides

use crate::candidate::ArtifactKey;
use serde::{Deserialize, Serialize};
use wheelhouse_errors::{Error, ResolveError};
use wheelhouse_types::{ArtifactFormat, Requirement, Version};

/// Caller overrides for the format tie-break
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatPreference {
    /// Take the single source archive when one exists
    pub prefer_source: bool,
    /// Take the single egg even when a wheel exists
    pub prefer_egg: bool,
}

/// A resolved artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub key: String,
    pub filename: String,
    pub version: Version,
    pub format: ArtifactFormat,
}

impl Resolution {
    fn from_candidate(candidate: &ArtifactKey, version: &Version) -> Self {
        Self {
            key: candidate.path.clone(),
            filename: candidate.filename.clone(),
            version: version.clone(),
            format: candidate.format,
        }
    }
}

/// Every key that is a release of the requirement's project and satisfies
/// all of its constraints, in listing order
///
/// Returned candidates always carry a version.
#[must_use]
pub fn candidates<S: AsRef<str>>(requirement: &Requirement, keys: &[S]) -> Vec<ArtifactKey> {
    keys.iter()
        .filter_map(|key| ArtifactKey::inspect(key.as_ref(), &requirement.project))
        .filter(|candidate| {
            candidate
                .version
                .as_ref()
                .is_some_and(|version| requirement.matches(version))
        })
        .collect()
}

/// Resolve `requirement` to exactly one stored key
///
/// # Errors
///
/// Returns `ResolveError::NotFound` when no key survives filtering and
/// `ResolveError::Ambiguous` when the format tie-break cannot pick one.
pub fn resolve<S: AsRef<str>>(
    requirement: &Requirement,
    keys: &[S],
    preference: FormatPreference,
) -> Result<Resolution, Error> {
    let eligible = candidates(requirement, keys);
    tracing::debug!(
        requirement = %requirement,
        keys = keys.len(),
        eligible = eligible.len(),
        "filtered candidates"
    );

    let Some(newest) = eligible.iter().filter_map(|c| c.version.as_ref()).max().cloned() else {
        return Err(ResolveError::NotFound {
            requirement: requirement.to_string(),
        }
        .into());
    };

    let group: Vec<&ArtifactKey> = eligible
        .iter()
        .filter(|c| c.version.as_ref() == Some(&newest))
        .collect();

    if let [only] = group.as_slice() {
        return Ok(Resolution::from_candidate(only, &newest));
    }

    match break_tie(&group, preference) {
        Some(chosen) => Ok(Resolution::from_candidate(chosen, &newest)),
        None => Err(ResolveError::Ambiguous {
            requirement: requirement.to_string(),
            candidates: group.iter().map(|c| c.path.clone()).collect(),
        }
        .into()),
    }
}

fn break_tie<'a>(group: &[&'a ArtifactKey], preference: FormatPreference) -> Option<&'a ArtifactKey> {
    let of_format = |format: ArtifactFormat| -> Vec<&'a ArtifactKey> {
        group.iter().copied().filter(|c| c.format == format).collect()
    };
    let wheels = of_format(ArtifactFormat::Wheel);
    let eggs = of_format(ArtifactFormat::Egg);
    let sources = of_format(ArtifactFormat::Source);

    if preference.prefer_source && sources.len() == 1 {
        Some(sources[0])
    } else if (wheels.is_empty() || preference.prefer_egg) && eggs.len() == 1 {
        Some(eggs[0])
    } else if wheels.len() == 1 {
        Some(wheels[0])
    } else {
        None
    }
}
