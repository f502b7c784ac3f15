//! Index server rebuild notification

use async_trait::async_trait;
use url::Url;
use wheelhouse_errors::{Error, NetworkError};

use crate::client::NetClient;

/// Admin rebuild endpoint for an index server URL
///
/// A trailing `/pypi` or `/simple` segment names the package index, not the
/// server, so it is dropped before appending `/admin/rebuild`.
///
/// # Errors
///
/// Returns `NetworkError::InvalidUrl` if the result is not a valid URL.
pub fn admin_rebuild_url(server: &str) -> Result<Url, Error> {
    let mut base = server.strip_suffix('/').unwrap_or(server);
    if base.ends_with("pypi") || base.ends_with("simple") {
        base = base.rsplit_once('/').map_or(base, |(head, _)| head);
    }
    Url::parse(&format!("{base}/admin/rebuild"))
        .map_err(|e| NetworkError::InvalidUrl(format!("{server}: {e}")).into())
}

/// Status of a completed rebuild request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildOutcome {
    pub url: String,
    pub status: u16,
}

/// Asks an index server to rescan the object store
#[async_trait]
pub trait RebuildNotifier: Send + Sync {
    /// Trigger a rebuild
    ///
    /// # Errors
    ///
    /// Fails when the request cannot be sent or the server does not answer
    /// with a success status.
    async fn notify_rebuild(
        &self,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<RebuildOutcome, Error>;
}

/// Rebuild notifier over HTTP basic authentication
#[derive(Debug, Clone)]
pub struct HttpRebuildNotifier {
    client: NetClient,
}

impl HttpRebuildNotifier {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RebuildNotifier for HttpRebuildNotifier {
    async fn notify_rebuild(
        &self,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<RebuildOutcome, Error> {
        let url = admin_rebuild_url(server)?;
        tracing::debug!(url = %url, username, "requesting index rebuild");

        let response = self
            .client
            .get_with_basic_auth(url.as_str(), username, password)
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkError::HttpError {
                status: status.as_u16(),
                message: status.to_string(),
            }
            .into());
        }

        Ok(RebuildOutcome {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_url_drops_index_segment() {
        for server in [
            "http://fake/pypi/",
            "http://fake/pypi",
            "http://fake/simple/",
            "http://fake/",
            "http://fake",
        ] {
            assert_eq!(
                admin_rebuild_url(server).unwrap().as_str(),
                "http://fake/admin/rebuild",
                "{server}"
            );
        }
    }

    #[test]
    fn test_admin_url_keeps_other_paths() {
        assert_eq!(
            admin_rebuild_url("https://host/team/pypi/").unwrap().as_str(),
            "https://host/team/admin/rebuild"
        );
        assert_eq!(
            admin_rebuild_url("https://host/team").unwrap().as_str(),
            "https://host/team/admin/rebuild"
        );
    }

    #[test]
    fn test_admin_url_rejects_garbage() {
        assert!(matches!(
            admin_rebuild_url("not a url"),
            Err(Error::Network(NetworkError::InvalidUrl(_)))
        ));
    }
}
