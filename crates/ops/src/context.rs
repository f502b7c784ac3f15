//! Operations context for dependency injection

use std::sync::Arc;

use wheelhouse_config::Config;
use wheelhouse_errors::{Error, OpsError};
use wheelhouse_events::{EventEmitter, EventSender};
use wheelhouse_net::RebuildNotifier;
use wheelhouse_store::ObjectStore;
use wheelhouse_transfer::{TransferConfig, TransferEngine};

use crate::PackageDownloader;

/// Operations context providing access to all system components
pub struct OpsCtx {
    /// Bucket holding the artifacts
    pub store: Arc<dyn ObjectStore>,
    /// Index server notifier; publishing skips the rebuild without one
    pub notifier: Option<Arc<dyn RebuildNotifier>>,
    /// Fetches packages for rehosting
    pub downloader: Option<Arc<dyn PackageDownloader>>,
    /// Event sender for progress reporting
    pub tx: EventSender,
    pub config: Config,
}

impl std::fmt::Debug for OpsCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpsCtx")
            .field("store", &self.store.backend_name())
            .field("notifier", &self.notifier.is_some())
            .field("downloader", &self.downloader.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl OpsCtx {
    /// Transfer engine over this context's store, tuned by `[transfer]`
    #[must_use]
    pub fn transfer_engine(&self) -> TransferEngine {
        TransferEngine::new(
            Arc::clone(&self.store),
            TransferConfig::from_settings(&self.config.transfer),
        )
        .with_event_sender(self.tx.clone())
    }
}

/// Builder for operations context
#[derive(Default)]
pub struct OpsContextBuilder {
    store: Option<Arc<dyn ObjectStore>>,
    notifier: Option<Arc<dyn RebuildNotifier>>,
    downloader: Option<Arc<dyn PackageDownloader>>,
    tx: Option<EventSender>,
    config: Option<Config>,
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn RebuildNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[must_use]
    pub fn with_downloader(mut self, downloader: Arc<dyn PackageDownloader>) -> Self {
        self.downloader = Some(downloader);
        self
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Set configuration
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if the store, event sender or configuration is missing.
    pub fn build(self) -> Result<OpsCtx, Error> {
        let store = self.store.ok_or_else(|| OpsError::MissingComponent {
            component: "store".to_string(),
        })?;

        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;

        let config = self.config.ok_or_else(|| OpsError::MissingComponent {
            component: "config".to_string(),
        })?;

        Ok(OpsCtx {
            store,
            notifier: self.notifier,
            downloader: self.downloader,
            tx,
            config,
        })
    }
}
