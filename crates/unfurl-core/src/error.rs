//! Unified error types for the Unfurl core.
//!
//! Framework-level errors (trigger compilation, handler failures) are defined
//! in `unfurl-framework` and convert into [`TurnError`] at the middleware seam.

use thiserror::Error;

/// A boxed, thread-safe error used at trait-object boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur while delivering outbound activities.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Delivering the activity failed.
    #[error("failed to send activity: {0}")]
    SendFailed(String),

    /// The transport has been closed.
    #[error("transport closed: {reason}")]
    Closed {
        /// Reason for closure.
        reason: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl TransportError {
    /// Creates a send failure.
    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }
}

// =============================================================================
// Turn Errors
// =============================================================================

/// Errors that abort a single turn.
///
/// A turn error never crashes the process; the adapter hands it to its
/// turn-error handler, which decides what the user sees.
#[derive(Debug, Error)]
pub enum TurnError {
    /// Outbound delivery failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The inbound payload could not be decoded into an activity.
    #[error("invalid activity: {reason}")]
    InvalidActivity {
        /// Reason for failure.
        reason: String,
    },

    /// A middleware stage failed.
    #[error("middleware '{middleware}' failed: {source}")]
    Middleware {
        /// Name of the failing stage.
        middleware: &'static str,
        /// The underlying failure.
        #[source]
        source: BoxError,
    },

    /// The bot's turn logic failed.
    #[error("turn logic failed: {0}")]
    Logic(#[source] BoxError),
}

impl TurnError {
    /// Creates an invalid activity error.
    pub fn invalid_activity(reason: impl Into<String>) -> Self {
        Self::InvalidActivity {
            reason: reason.into(),
        }
    }

    /// Wraps a failure raised by the named middleware stage.
    pub fn middleware(middleware: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Middleware {
            middleware,
            source: source.into(),
        }
    }

    /// Wraps a failure raised by the turn logic.
    pub fn logic(source: impl Into<BoxError>) -> Self {
        Self::Logic(source.into())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for turn processing.
pub type TurnResult<T> = Result<T, TurnError>;
