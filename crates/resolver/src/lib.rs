#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Artifact resolution for wheelhouse
//!
//! Turns a requirement and a raw listing of object keys into a single
//! stored artifact, or a listing of releases. Everything here is a pure
//! function of its inputs.

mod candidate;
mod filename;
mod listing;
mod resolver;

pub use candidate::{split_key, ArtifactKey};
pub use filename::{parse_artifact, ParsedArtifact};
pub use listing::{list_projects, list_releases, Release};
pub use resolver::{candidates, resolve, FormatPreference, Resolution};
