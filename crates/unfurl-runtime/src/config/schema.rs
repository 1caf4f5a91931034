//! Configuration schema definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnfurlConfig {
    /// Bot identity and credential settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Link-unfurling settings.
    #[serde(default)]
    pub link_unfurling: LinkUnfurlingConfig,

    /// What the default turn-error handler sends.
    #[serde(default)]
    pub turn_error: TurnErrorConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// App types accepted for [`BotConfig::app_type`].
pub const APP_TYPES: [&str; 3] = ["MultiTenant", "SingleTenant", "UserAssignedMSI"];

/// Bot identity, handed to the adapter as-is.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    /// The registered app id.
    #[serde(default)]
    pub app_id: Option<String>,

    /// The app secret.
    #[serde(default)]
    pub app_password: Option<String>,

    /// One of [`APP_TYPES`].
    #[serde(default = "default_app_type")]
    pub app_type: String,

    /// Tenant of a single-tenant app.
    #[serde(default)]
    pub tenant_id: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            app_password: None,
            app_type: default_app_type(),
            tenant_id: None,
        }
    }
}

impl BotConfig {
    /// Reads the credentials from `BOT_ID` and `BOT_PASSWORD` as a
    /// multi-tenant app.
    pub fn from_env() -> Self {
        Self {
            app_id: std::env::var("BOT_ID").ok(),
            app_password: std::env::var("BOT_PASSWORD").ok(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("app_id", &self.app_id)
            .field("app_password", &self.app_password.as_ref().map(|_| "<redacted>"))
            .field("app_type", &self.app_type)
            .field("tenant_id", &self.tenant_id)
            .finish()
    }
}

fn default_app_type() -> String {
    "MultiTenant".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Where log lines go.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Span lifecycle events to log.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include file and line of each event.
    #[serde(default)]
    pub file_location: bool,

    /// Per-module levels, e.g. `unfurl_framework = "trace"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            file_path: None,
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            filters: BTreeMap::new(),
        }
    }
}

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON (`json-log` feature).
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

// =============================================================================
// Link unfurling and turn errors
// =============================================================================

/// Link-unfurling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkUnfurlingConfig {
    /// When `false` the dispatch middleware is not installed.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for LinkUnfurlingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Placeholder replaced with the error text in [`TurnErrorConfig::user_message`].
pub const ERROR_PLACEHOLDER: &str = "{error}";

/// What the default turn-error handler sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnErrorConfig {
    /// Send the `OnTurnError Trace` activity.
    #[serde(default = "default_true")]
    pub send_trace: bool,

    /// First user-visible message; [`ERROR_PLACEHOLDER`] is substituted.
    #[serde(default = "default_user_message")]
    pub user_message: String,

    /// Second user-visible message. Empty to skip.
    #[serde(default = "default_follow_up")]
    pub follow_up: String,
}

impl Default for TurnErrorConfig {
    fn default() -> Self {
        Self {
            send_trace: true,
            user_message: default_user_message(),
            follow_up: default_follow_up(),
        }
    }
}

impl TurnErrorConfig {
    /// Renders the first user message for `error`.
    pub fn render_user_message(&self, error: &str) -> String {
        self.user_message.replace(ERROR_PLACEHOLDER, error)
    }
}

fn default_true() -> bool {
    true
}

fn default_user_message() -> String {
    "The bot encountered unhandled error: {error}".to_string()
}

fn default_follow_up() -> String {
    "To continue to run this bot, please fix the bot source code.".to_string()
}
