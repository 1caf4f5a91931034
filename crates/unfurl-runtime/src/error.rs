//! Runtime error types.

use thiserror::Error;
use unfurl_core::TurnError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Loading or validating configuration failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A turn failed and the turn-error handler could not recover it.
    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
