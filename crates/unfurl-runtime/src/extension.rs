//! Message-extension facade.
//!
//! [`MessageExtension`] owns a [`BotAdapter`] and, when link unfurling is
//! enabled, installs a [`LinkUnfurlingMiddleware`] over the handlers given in
//! [`LinkUnfurlingOptions`]:
//!
//! ```rust,ignore
//! let app = MessageExtension::new(
//!     MessageExtensionOptions::with_transport(transport).link_unfurling(
//!         LinkUnfurlingOptions::enabled()
//!             .link(MainLinkUnfurlingHandler::new().boxed())
//!             .link(DevLinkUnfurlingHandler::new().boxed()),
//!     ),
//! )?;
//!
//! let outcome = app.request_handler(activity, None).await?;
//! ```
//!
//! Handlers are fixed once the extension is built.

use std::sync::Arc;

use tracing::info;
use unfurl_core::{Activity, BoxedTransport, TurnLogic};
use unfurl_framework::{BoxedLinkHandler, HandlerRegistry, LinkUnfurlingMiddleware};

use crate::adapter::{BotAdapter, TurnOutcome};
use crate::config::{BotConfig, ConfigError, TurnErrorConfig};
use crate::error::RuntimeResult;

// ============================================================================
// Options
// ============================================================================

/// Link-unfurling settings and the handlers to register.
#[derive(Clone, Default)]
pub struct LinkUnfurlingOptions {
    /// Install the dispatch middleware.
    pub enabled: bool,
    /// Handlers in priority order.
    pub links: Vec<BoxedLinkHandler>,
}

impl LinkUnfurlingOptions {
    /// Enabled options with no handlers yet.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            links: Vec::new(),
        }
    }

    /// Appends a handler. `None` is ignored.
    pub fn register_link(&mut self, link: impl Into<Option<BoxedLinkHandler>>) {
        if let Some(link) = link.into() {
            self.links.push(link);
        }
    }

    /// Appends every present handler in order.
    pub fn register_links<I, L>(&mut self, links: I)
    where
        I: IntoIterator<Item = L>,
        L: Into<Option<BoxedLinkHandler>>,
    {
        for link in links {
            self.register_link(link);
        }
    }

    /// Appends a handler (builder pattern).
    pub fn link(mut self, link: impl Into<Option<BoxedLinkHandler>>) -> Self {
        self.register_link(link);
        self
    }
}

impl std::fmt::Debug for LinkUnfurlingOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkUnfurlingOptions")
            .field("enabled", &self.enabled)
            .field(
                "links",
                &self.links.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// How a [`MessageExtension`] gets its adapter and what it installs.
#[derive(Default)]
pub struct MessageExtensionOptions {
    /// Use this adapter; its middleware is extended, not replaced.
    ///
    /// Adapters copy their middleware on write, so clones of this adapter
    /// taken beforehand do not see the link-unfurling stage. Serve requests
    /// through [`MessageExtension::adapter`] or
    /// [`MessageExtension::request_handler`].
    pub adapter: Option<BotAdapter>,
    /// Transport for a default adapter when `adapter` is absent.
    pub transport: Option<BoxedTransport>,
    /// Identity for a default adapter. Read from `BOT_ID` and `BOT_PASSWORD`
    /// when absent.
    pub adapter_config: Option<BotConfig>,
    /// Messages of a default adapter's turn-error handler.
    pub turn_error: TurnErrorConfig,
    pub link_unfurling: Option<LinkUnfurlingOptions>,
}

impl MessageExtensionOptions {
    /// Options reusing an existing adapter. See [`Self::adapter`] for which
    /// handle serves the installed stages.
    pub fn with_adapter(adapter: BotAdapter) -> Self {
        Self {
            adapter: Some(adapter),
            ..Default::default()
        }
    }

    /// Options creating a default adapter over `transport`.
    pub fn with_transport(transport: BoxedTransport) -> Self {
        Self {
            transport: Some(transport),
            ..Default::default()
        }
    }

    pub fn adapter_config(mut self, config: BotConfig) -> Self {
        self.adapter_config = Some(config);
        self
    }

    pub fn turn_error(mut self, config: TurnErrorConfig) -> Self {
        self.turn_error = config;
        self
    }

    pub fn link_unfurling(mut self, options: LinkUnfurlingOptions) -> Self {
        self.link_unfurling = Some(options);
        self
    }
}

impl std::fmt::Debug for MessageExtensionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageExtensionOptions")
            .field("adapter", &self.adapter)
            .field("has_transport", &self.transport.is_some())
            .field("adapter_config", &self.adapter_config)
            .field("link_unfurling", &self.link_unfurling)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// LinkUnfurling
// ============================================================================

/// The installed link-unfurling stage.
#[derive(Debug, Clone)]
pub struct LinkUnfurling {
    middleware: Arc<LinkUnfurlingMiddleware>,
}

impl LinkUnfurling {
    /// Builds the registry from `options` and installs the middleware into
    /// `adapter`.
    pub fn new(adapter: &mut BotAdapter, options: LinkUnfurlingOptions) -> Self {
        let registry: HandlerRegistry = options.links.into_iter().collect();
        info!(handlers = ?registry.names(), "Installing link unfurling");

        let middleware = Arc::new(LinkUnfurlingMiddleware::new(registry));
        adapter.use_middleware(middleware.clone());
        Self { middleware }
    }

    pub fn middleware(&self) -> &LinkUnfurlingMiddleware {
        &self.middleware
    }

    pub fn registry(&self) -> &HandlerRegistry {
        self.middleware.registry()
    }
}

// ============================================================================
// MessageExtension
// ============================================================================

/// A bot adapter with the message-extension features installed.
#[derive(Debug, Clone)]
pub struct MessageExtension {
    adapter: BotAdapter,
    link_unfurling: Option<LinkUnfurling>,
}

impl MessageExtension {
    /// Builds the extension.
    ///
    /// Fails only when neither an adapter nor a transport is given.
    pub fn new(options: MessageExtensionOptions) -> RuntimeResult<Self> {
        let mut adapter = match (options.adapter, options.transport) {
            (Some(adapter), _) => adapter,
            (None, Some(transport)) => BotAdapter::with_config(
                transport,
                options.adapter_config.unwrap_or_else(BotConfig::from_env),
                options.turn_error,
            ),
            (None, None) => return Err(ConfigError::missing_field("transport").into()),
        };

        let link_unfurling = options
            .link_unfurling
            .filter(|link_options| link_options.enabled)
            .map(|link_options| LinkUnfurling::new(&mut adapter, link_options));

        Ok(Self {
            adapter,
            link_unfurling,
        })
    }

    /// The adapter with every stage installed. Serve requests through this
    /// one, not through a clone taken before [`MessageExtension::new`].
    pub fn adapter(&self) -> &BotAdapter {
        &self.adapter
    }

    /// The link-unfurling stage, if enabled.
    pub fn link_unfurling(&self) -> Option<&LinkUnfurling> {
        self.link_unfurling.as_ref()
    }

    /// Processes one inbound activity. Without `logic`, only the middleware
    /// chain runs.
    pub async fn request_handler(
        &self,
        activity: Activity,
        logic: Option<&dyn TurnLogic>,
    ) -> RuntimeResult<TurnOutcome> {
        self.adapter.process_activity(activity, logic).await
    }

    /// Decodes a JSON request body and processes it.
    pub async fn request_body(
        &self,
        body: &[u8],
        logic: Option<&dyn TurnLogic>,
    ) -> RuntimeResult<TurnOutcome> {
        self.adapter.process_body(body, logic).await
    }
}
