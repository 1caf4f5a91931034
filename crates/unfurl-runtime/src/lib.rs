//! Unfurl Runtime - configuration, logging and turn processing.
//!
//! This crate provides:
//! - Layered configuration (`ConfigLoader`, `UnfurlConfig`)
//! - Logging setup (`LoggingBuilder`)
//! - The turn-processing adapter (`BotAdapter`) with its turn-error handler
//! - The message-extension facade (`MessageExtension`)
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use unfurl_runtime::UnfurlRuntime;
//!
//! let runtime = UnfurlRuntime::new();
//! let app = runtime.message_extension(Arc::new(transport), [handler])?;
//!
//! let outcome = app.request_body(&body, None).await?;
//! if let Some(response) = outcome.invoke_response {
//!     reply(response.status, response.body);
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod extension;
pub mod logging;
pub mod runtime;

pub use adapter::{BotAdapter, DefaultTurnErrorHandler, TurnErrorHandler, TurnOutcome};
pub use config::{
    BotConfig, ConfigError, ConfigLoader, ConfigResult, LinkUnfurlingConfig, LoggingConfig,
    Profile, TurnErrorConfig, UnfurlConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use extension::{LinkUnfurling, LinkUnfurlingOptions, MessageExtension, MessageExtensionOptions};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RuntimeBuilder, UnfurlRuntime};

// Re-export tracing for use by other crates
pub use tracing;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
