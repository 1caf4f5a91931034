//! # Unfurl
//!
//! Link unfurling for Bot Framework message extensions.
//!
//! When a user pastes a link, the channel sends a `composeExtension/queryLink`
//! invoke. Unfurl runs it through a middleware chain where the first
//! registered handler whose trigger matches the URL produces the preview:
//!
//! ```text
//! invoke ─▶ BotAdapter ─▶ LinkUnfurlingMiddleware ─▶ next middleware ─▶ turn logic
//!                                 │
//!                         first matching handler
//!                                 ▼
//!                        invokeResponse { 200, body }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use unfurl::prelude::*;
//!
//! let runtime = UnfurlRuntime::new();
//! let app = runtime.message_extension(
//!     transport,
//!     [link_handler(r".*\.contoso\.com/.*", |_ctx, link: Link| async move {
//!         let card = Attachment::thumbnail_card(json!({ "title": link.as_str() }));
//!         Ok::<_, BoxError>(MessagingExtensionResponse::result_list(vec![card]))
//!     })
//!     .boxed()],
//! )?;
//!
//! let outcome = app.request_body(&body, None).await?;
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `unfurl.toml` files (default)
//! - `yaml-config`: load `unfurl.yaml` files
//! - `json-log`: JSON log output

pub use unfurl_core as core;
pub use unfurl_framework as framework;
pub use unfurl_runtime as runtime;

/// Commonly used types for building a link-unfurling bot.
///
/// ```rust,ignore
/// use unfurl::prelude::*;
/// ```
pub mod prelude {
    // Runtime and facade
    pub use unfurl_runtime::{
        BotAdapter, LinkUnfurlingOptions, MessageExtension, MessageExtensionOptions, TurnOutcome,
        UnfurlRuntime,
    };

    // Handlers and triggers
    pub use unfurl_framework::{
        BoxedLinkHandler, HandlerResult, Link, LinkUnfurlingHandler, TriggerSpec, link_handler,
    };

    // Responses
    pub use unfurl_framework::{
        Attachment, AttachmentLayout, MessagingExtensionResponse, Reply, process_response,
    };

    // Turn plumbing
    pub use unfurl_core::{
        Activity, BoxError, InvokeResponse, Middleware, Next, TurnContext, TurnError, TurnResult,
        TurnTransport,
    };
}
