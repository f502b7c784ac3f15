use serde::{Deserialize, Serialize};

use wheelhouse_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod index;
pub mod resolver;
pub mod transfer;

pub use general::*;
pub use index::*;
pub use resolver::*;
pub use transfer::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Requirement resolution
    Resolver(ResolverEvent),

    /// Multi-part uploads
    Transfer(TransferEvent),

    /// Index rebuild notification
    Index(IndexEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::Error { .. } | GeneralEvent::OperationFailed { .. })
            | Self::Resolver(ResolverEvent::ResolutionFailed { .. })
            | Self::Transfer(TransferEvent::Aborted { .. })
            | Self::Index(IndexEvent::RebuildFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. })
            | Self::Transfer(TransferEvent::ChunkRetrying { .. })
            | Self::Index(IndexEvent::RebuildSkipped { .. }) => Level::WARN,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Resolver(ResolverEvent::ResolutionStarted { .. })
            | Self::Transfer(TransferEvent::ChunkUploaded { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "wheelhouse::events::general",
            Self::Resolver(_) => "wheelhouse::events::resolver",
            Self::Transfer(_) => "wheelhouse::events::transfer",
            Self::Index(_) => "wheelhouse::events::index",
        }
    }
}
