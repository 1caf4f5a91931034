//! Process-level setup: configuration, logging and adapter construction.
//!
//! ```rust,ignore
//! use unfurl_runtime::UnfurlRuntime;
//!
//! // Loads unfurl.toml from the current directory, if any.
//! let runtime = UnfurlRuntime::new();
//!
//! let runtime = UnfurlRuntime::builder()
//!     .config_file("config/unfurl.toml")
//!     .profile("production")
//!     .build()?;
//!
//! let app = runtime.message_extension(transport, [main_handler, dev_handler])?;
//! ```

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};
use unfurl_core::BoxedTransport;
use unfurl_framework::BoxedLinkHandler;

use crate::adapter::BotAdapter;
use crate::config::{ConfigLoader, UnfurlConfig, validate_config};
use crate::error::RuntimeResult;
use crate::extension::{LinkUnfurlingOptions, MessageExtension, MessageExtensionOptions};
use crate::logging;

/// Loaded configuration with logging installed.
#[derive(Debug, Clone)]
pub struct UnfurlRuntime {
    config: UnfurlConfig,
}

impl UnfurlRuntime {
    /// Loads configuration from the current directory and the environment.
    ///
    /// Falls back to defaults when loading or validation fails.
    pub fn new() -> Self {
        let loaded = ConfigLoader::new()
            .with_current_dir()
            .load()
            .and_then(|config| validate_config(&config).map(|()| config));

        match loaded {
            Ok(config) => Self::from_config(&config),
            Err(e) => {
                let runtime = Self::from_config(&UnfurlConfig::default());
                warn!(error = %e, "Failed to load configuration, using defaults");
                runtime
            }
        }
    }

    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from an already loaded configuration.
    ///
    /// The global subscriber is installed only if none exists yet.
    pub fn from_config(config: &UnfurlConfig) -> Self {
        logging::init_from_config(&config.logging);

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            link_unfurling = config.link_unfurling.enabled,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &UnfurlConfig {
        &self.config
    }

    /// An adapter over `transport` using the configured bot identity and
    /// turn-error messages.
    pub fn adapter(&self, transport: BoxedTransport) -> BotAdapter {
        BotAdapter::with_config(
            transport,
            self.config.bot.clone(),
            self.config.turn_error.clone(),
        )
    }

    /// A message extension over `transport` with `links` registered in
    /// order. Link unfurling follows `link_unfurling.enabled`.
    pub fn message_extension<I>(
        &self,
        transport: BoxedTransport,
        links: I,
    ) -> RuntimeResult<MessageExtension>
    where
        I: IntoIterator,
        I::Item: Into<Option<BoxedLinkHandler>>,
    {
        let mut link_options = LinkUnfurlingOptions {
            enabled: self.config.link_unfurling.enabled,
            links: Vec::new(),
        };
        link_options.register_links(links);

        MessageExtension::new(
            MessageExtensionOptions::with_adapter(self.adapter(transport))
                .link_unfurling(link_options),
        )
    }
}

impl Default for UnfurlRuntime {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for an [`UnfurlRuntime`] with custom configuration sources.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Loads exactly this file instead of searching.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    pub fn merge(mut self, config: UnfurlConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides a single value by dotted key.
    pub fn set<T: Serialize>(mut self, key: &str, value: T) -> Self {
        self.config_loader = self.config_loader.set(key, value);
        self
    }

    /// Loads, validates and builds.
    pub fn build(self) -> RuntimeResult<UnfurlRuntime> {
        let config = self.config_loader.load()?;
        validate_config(&config)?;
        Ok(UnfurlRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigError, LogLevel, TurnErrorConfig};
    use crate::error::RuntimeError;
    use serde_json::json;
    use std::sync::Arc;
    use unfurl_core::{Activity, BoxError, InvokeResponse, MemoryTransport};
    use unfurl_framework::{QUERY_LINK_INVOKE, link_handler};

    fn builder() -> RuntimeBuilder {
        RuntimeBuilder {
            config_loader: ConfigLoader::new().without_env().search_path("/nonexistent"),
        }
    }

    #[test]
    fn test_builder_applies_overrides() {
        let runtime = builder()
            .set("logging.level", "debug")
            .set("bot.app_id", "bot-id")
            .build()
            .unwrap();

        assert_eq!(runtime.config().logging.level, LogLevel::Debug);
        assert_eq!(runtime.config().bot.app_id.as_deref(), Some("bot-id"));
    }

    #[test]
    fn test_builder_validates() {
        let result = builder().set("bot.app_type", "SingleTenant").build();
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::MissingField { .. }))
        ));
    }

    #[test]
    fn test_builder_missing_file() {
        let result = builder().config_file("/nonexistent/unfurl.toml").build();
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::FileNotFound(_)))
        ));
    }

    #[test]
    fn test_adapter_uses_configured_identity() {
        let runtime = builder().set("bot.app_id", "bot-id").build().unwrap();
        let adapter = runtime.adapter(Arc::new(MemoryTransport::new()));

        assert_eq!(adapter.bot_config().app_id.as_deref(), Some("bot-id"));
        assert_eq!(adapter.bot_config().app_type, "MultiTenant");
    }

    #[tokio::test]
    async fn test_message_extension_follows_config() {
        let handler = link_handler(".*", |_ctx, link| async move {
            Ok::<_, BoxError>(json!({ "url": link.as_str() }))
        })
        .boxed();

        let disabled = builder()
            .set("link_unfurling.enabled", false)
            .build()
            .unwrap()
            .message_extension(Arc::new(MemoryTransport::new()), [handler.clone()])
            .unwrap();
        assert!(disabled.link_unfurling().is_none());

        let enabled = builder()
            .build()
            .unwrap()
            .message_extension(Arc::new(MemoryTransport::new()), [Some(handler), None])
            .unwrap();
        assert_eq!(
            enabled.link_unfurling().map(|l| l.registry().len()),
            Some(1)
        );

        let outcome = enabled
            .request_handler(
                Activity::invoke(QUERY_LINK_INVOKE, json!({ "url": "https://contoso.com" })),
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            outcome.invoke_response,
            Some(InvokeResponse::ok(Some(json!({ "url": "https://contoso.com" }))))
        );
    }

    #[test]
    fn test_merge_replaces_turn_error_messages() {
        let config = UnfurlConfig {
            turn_error: TurnErrorConfig {
                user_message: "Oops: {error}".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let runtime = builder().merge(config).build().unwrap();

        assert_eq!(
            runtime.config().turn_error.render_user_message("boom"),
            "Oops: boom"
        );
    }
}
