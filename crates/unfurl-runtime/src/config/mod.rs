//! Configuration module for the Unfurl runtime.
//!
//! Layered loading with figment (files, `UNFURL_*` variables, bot
//! credential variables) and validation of the merged result.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LinkUnfurlingConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig, TurnErrorConfig, UnfurlConfig,
};
pub use validation::validate_config;
