#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for wheelhouse
//!
//! An HTTP client with timeouts and connection retries, and the index
//! server rebuild notification sent after a successful publish.

mod client;
mod rebuild;

pub use client::{NetClient, NetConfig};
pub use rebuild::{admin_rebuild_url, HttpRebuildNotifier, RebuildNotifier, RebuildOutcome};

use url::Url;
use wheelhouse_errors::{Error, NetworkError};

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| NetworkError::InvalidUrl(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert!(parse_url("https://example.com").is_ok());
        assert!(parse_url("not a url").is_err());
    }
}
