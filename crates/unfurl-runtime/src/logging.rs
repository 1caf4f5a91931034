//! Logging setup.
//!
//! Two spans carry most of the pipeline's context: `turn` (one per inbound
//! activity, opened by the adapter) and `link_unfurling` (one per query-link
//! dispatch). [`SpanEvents::Turns`] logs when each of them opens and closes,
//! which is usually all that is needed to follow a conversation.
//!
//! ```rust,ignore
//! // From the `[logging]` table:
//! logging::init_from_config(&config.logging);
//!
//! // Or by hand:
//! LoggingBuilder::new()
//!     .directive("unfurl_framework=trace")
//!     .span_events(SpanEvents::Turns)
//!     .try_init()?;
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogOutput, LoggingConfig, SpanEventConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Default file name when `file_path` names only a directory.
const DEFAULT_LOG_FILE: &str = "unfurl.log";

/// Which span transitions are written as log lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpanEvents {
    /// No span lines; events still carry their span context.
    #[default]
    Quiet,
    /// Open and close of every span, one pair per turn and per dispatch.
    Turns,
    /// Every transition, including each re-entry after an await.
    Full,
    /// Exactly the configured transitions.
    Custom(SpanEventConfig),
}

impl SpanEvents {
    fn fmt_span(self) -> FmtSpan {
        match self {
            Self::Quiet => FmtSpan::NONE,
            Self::Turns => FmtSpan::NEW | FmtSpan::CLOSE,
            Self::Full => FmtSpan::FULL,
            Self::Custom(config) => [
                (config.new, FmtSpan::NEW),
                (config.enter, FmtSpan::ENTER),
                (config.exit, FmtSpan::EXIT),
                (config.close, FmtSpan::CLOSE),
            ]
            .into_iter()
            .filter(|(enabled, _)| *enabled)
            .fold(FmtSpan::NONE, |acc, (_, span)| acc | span),
        }
    }
}

impl From<&SpanEventConfig> for SpanEvents {
    fn from(config: &SpanEventConfig) -> Self {
        match (config.new, config.enter, config.exit, config.close) {
            (false, false, false, false) => Self::Quiet,
            (true, false, false, true) => Self::Turns,
            (true, true, true, true) => Self::Full,
            _ => Self::Custom(*config),
        }
    }
}

/// Installs the global subscriber described by `config`.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_from_config(config: &LoggingConfig) -> bool {
    LoggingBuilder::from_config(config).try_init().is_ok()
}

// =============================================================================
// LoggingBuilder
// =============================================================================

/// Builder for the global subscriber.
#[derive(Debug, Default)]
pub struct LoggingBuilder {
    level: Option<tracing::Level>,
    directives: Vec<String>,
    span_events: SpanEvents,
    format: LogFormat,
    output: LogOutput,
    file_path: Option<PathBuf>,
    thread_ids: bool,
    file_location: bool,
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            level: Some(config.level.to_tracing_level()),
            directives: config
                .filters
                .iter()
                .map(|(target, level)| format!("{target}={level}"))
                .collect(),
            span_events: SpanEvents::from(&config.span_events),
            format: config.format,
            output: config.output,
            file_path: config.file_path.clone(),
            thread_ids: config.thread_ids,
            file_location: config.file_location,
        }
    }

    /// Base level for targets without a directive. `INFO` if unset.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds a directive such as `unfurl_framework=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    pub fn span_events(mut self, events: SpanEvents) -> Self {
        self.span_events = events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    /// Log file for [`LogOutput::File`].
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    /// `RUST_LOG` when set, otherwise the base level. Directives are added
    /// on top either way.
    fn filter(&self) -> EnvFilter {
        let base = self.level.unwrap_or(tracing::Level::INFO);
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(base.as_str().to_ascii_lowercase()));

        self.directives
            .iter()
            .fold(filter, |filter, directive| match directive.parse() {
                Ok(parsed) => filter.add_directive(parsed),
                Err(e) => {
                    warn!(directive = %directive, error = %e, "Ignoring invalid log directive");
                    filter
                }
            })
    }

    /// Where lines go. File output without a path falls back to stderr.
    fn writer(&self) -> BoxMakeWriter {
        match (self.output, &self.file_path) {
            (LogOutput::Stdout, _) => BoxMakeWriter::new(std::io::stdout),
            (LogOutput::Stderr, _) | (LogOutput::File, None) => {
                BoxMakeWriter::new(std::io::stderr)
            }
            (LogOutput::File, Some(path)) => {
                let directory = path.parent().unwrap_or_else(|| Path::new("."));
                let file_name = path
                    .file_name()
                    .map_or_else(|| DEFAULT_LOG_FILE.into(), |name| name.to_os_string());
                BoxMakeWriter::new(tracing_appender::rolling::never(directory, file_name))
            }
        }
    }

    fn layer(&self) -> BoxedLayer {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(self.span_events.fmt_span())
            .with_thread_ids(self.thread_ids)
            .with_file(self.file_location)
            .with_line_number(self.file_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the subscriber, failing if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_presets_map_to_fmt_spans() {
        assert_eq!(SpanEvents::Quiet.fmt_span(), FmtSpan::NONE);
        assert_eq!(SpanEvents::Turns.fmt_span(), FmtSpan::NEW | FmtSpan::CLOSE);
        assert_eq!(SpanEvents::Full.fmt_span(), FmtSpan::FULL);
    }

    #[test]
    fn test_config_selects_preset_or_custom() {
        let turns = SpanEventConfig {
            new: true,
            close: true,
            ..Default::default()
        };
        assert_eq!(SpanEvents::from(&turns), SpanEvents::Turns);
        assert_eq!(
            SpanEvents::from(&SpanEventConfig::default()),
            SpanEvents::Quiet
        );

        let enter_only = SpanEventConfig {
            enter: true,
            ..Default::default()
        };
        let events = SpanEvents::from(&enter_only);
        assert_eq!(events, SpanEvents::Custom(enter_only));
        assert_eq!(events.fmt_span(), FmtSpan::ENTER);
    }

    #[test]
    fn test_from_config() {
        let mut config = LoggingConfig {
            level: LogLevel::Debug,
            output: LogOutput::Stderr,
            file_location: true,
            ..Default::default()
        };
        config
            .filters
            .insert("unfurl_framework".to_string(), LogLevel::Trace);

        let builder = LoggingBuilder::from_config(&config);

        assert_eq!(builder.level, Some(tracing::Level::DEBUG));
        assert_eq!(builder.output, LogOutput::Stderr);
        assert!(builder.file_location && !builder.thread_ids);
        assert_eq!(builder.span_events, SpanEvents::Quiet);
        assert_eq!(builder.directives, vec!["unfurl_framework=trace"]);
    }

    #[test]
    fn test_builder_chain() {
        let builder = LoggingBuilder::new()
            .with_level(tracing::Level::WARN)
            .directive("unfurl_runtime=debug")
            .span_events(SpanEvents::Turns)
            .format(LogFormat::Pretty)
            .output(LogOutput::File)
            .file_path("logs/bot.log");

        assert_eq!(builder.level, Some(tracing::Level::WARN));
        assert_eq!(builder.directives, vec!["unfurl_runtime=debug"]);
        assert_eq!(builder.span_events, SpanEvents::Turns);
        assert_eq!(builder.format, LogFormat::Pretty);
        assert_eq!(builder.file_path.as_deref(), Some(Path::new("logs/bot.log")));
    }
}
