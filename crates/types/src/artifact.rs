//! Artifact formats and file extensions

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recognised artifact extensions, longest first so `.tar.gz` wins over `.tar`
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    ".tar.gz", ".tar.bz2", ".tar.xz", ".tar", ".tgz", ".tbz", ".txz", ".zip", ".whl", ".egg",
    ".exe", ".msi",
];

pub const WHEEL_EXTENSION: &str = ".whl";
pub const EGG_EXTENSION: &str = ".egg";

/// Kind of stored artifact, in tie-break preference order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactFormat {
    /// Prebuilt binary wheel
    Wheel,
    /// Platform egg
    Egg,
    /// Source archive or legacy installer
    Source,
}

impl ArtifactFormat {
    /// Classify a file by its extension
    #[must_use]
    pub fn from_extension(extension: &str) -> Self {
        match extension {
            WHEEL_EXTENSION => Self::Wheel,
            EGG_EXTENSION => Self::Egg,
            _ => Self::Source,
        }
    }

    /// Classify a filename, `None` if its extension is not supported
    #[must_use]
    pub fn detect(filename: &str) -> Option<Self> {
        split_extension(filename).map(|(_, ext)| Self::from_extension(ext))
    }

    /// Render a canonical filename for `project` at `version`
    ///
    /// `extension` must be one of [`SUPPORTED_EXTENSIONS`]; wheels and eggs
    /// get generic tags.
    #[must_use]
    pub fn filename(project: &str, version: &Version, extension: &str) -> String {
        let stem = project.replace(['-', '.'], "_");
        match Self::from_extension(extension) {
            Self::Wheel => format!("{stem}-{version}-py2.py3-none-any{extension}"),
            Self::Egg => format!("{stem}-{version}-py3.12{extension}"),
            Self::Source => format!("{stem}-{version}{extension}"),
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wheel => write!(f, "wheel"),
            Self::Egg => write!(f, "egg"),
            Self::Source => write!(f, "source"),
        }
    }
}

/// Split a filename into its stem and supported extension
#[must_use]
pub fn split_extension(filename: &str) -> Option<(&str, &'static str)> {
    SUPPORTED_EXTENSIONS.iter().find_map(|ext| {
        filename
            .strip_suffix(ext)
            .filter(|stem| !stem.is_empty())
            .map(|stem| (stem, *ext))
    })
}
