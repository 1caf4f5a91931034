//! Error types for the Unfurl framework.

use thiserror::Error;
use unfurl_core::{BoxError, TurnError};

/// Errors raised while evaluating trigger patterns.
#[derive(Debug, Clone, Error)]
pub enum TriggerError {
    /// A literal trigger is not a valid regular expression.
    #[error("invalid trigger pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The offending pattern text.
        pattern: String,
        /// The compilation failure.
        #[source]
        source: regex::Error,
    },
}

/// Errors raised by the link-unfurling middleware.
#[derive(Debug, Error)]
pub enum LinkUnfurlError {
    /// A trigger pattern failed to compile while matching.
    #[error("handler '{handler}' has an unusable trigger: {source}")]
    Trigger {
        /// Name of the handler owning the trigger.
        handler: String,
        #[source]
        source: TriggerError,
    },

    /// The matched handler failed.
    #[error("link handler '{handler}' failed: {source}")]
    Handler {
        /// Name of the failing handler.
        handler: String,
        #[source]
        source: BoxError,
    },

    /// Sending the reply or continuing the turn failed.
    #[error(transparent)]
    Turn(#[from] TurnError),
}

impl LinkUnfurlError {
    /// Creates a handler failure.
    pub fn handler(handler: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Handler {
            handler: handler.into(),
            source: source.into(),
        }
    }
}

impl From<LinkUnfurlError> for TurnError {
    fn from(err: LinkUnfurlError) -> Self {
        match err {
            LinkUnfurlError::Turn(inner) => inner,
            other => TurnError::middleware("link_unfurling", other),
        }
    }
}

/// Result type for trigger evaluation.
pub type TriggerResult<T> = Result<T, TriggerError>;
