//! Link-unfurling handlers.
//!
//! A handler owns a [`TriggerSpec`] and produces the body of the invoke
//! response for links it claims. Implement [`LinkUnfurlingHandler`] for a
//! type, or wrap an async closure with [`link_handler`]:
//!
//! ```rust,ignore
//! struct DocsHandler {
//!     trigger: TriggerSpec,
//! }
//!
//! #[async_trait]
//! impl LinkUnfurlingHandler for DocsHandler {
//!     fn trigger(&self) -> &TriggerSpec {
//!         &self.trigger
//!     }
//!
//!     async fn handle_link_received(&self, _ctx: Arc<TurnContext>, link: Link) -> HandlerResult {
//!         Ok(Some(json!({ "url": link.link })))
//!     }
//! }
//!
//! // Or, closure style:
//! let handler = link_handler(".*\\.contoso\\.com/.*", |_ctx, link: Link| async move {
//!     Ok::<_, BoxError>(json!({ "url": link.link }))
//! });
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use unfurl_core::{BoxError, TurnContext};

use crate::link::Link;
use crate::trigger::TriggerSpec;

/// What a handler produces: the invoke-response body, or `None` for no body.
pub type HandlerResult = Result<Option<Value>, BoxError>;

// ============================================================================
// Handler Trait
// ============================================================================

/// A unit that claims URLs through its trigger and answers them.
#[async_trait]
pub trait LinkUnfurlingHandler: Send + Sync {
    /// Name used in logs and errors. Defaults to the type name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The patterns that route a URL to this handler.
    fn trigger(&self) -> &TriggerSpec;

    /// Produces the invoke-response body for `link`.
    async fn handle_link_received(&self, ctx: Arc<TurnContext>, link: Link) -> HandlerResult;
}

/// A type-erased handler that can be stored in a registry.
pub type BoxedLinkHandler = Arc<dyn LinkUnfurlingHandler>;

// ============================================================================
// Response conversion
// ============================================================================

/// Conversion from a handler's return value into an invoke-response body.
pub trait IntoUnfurlResponse {
    /// Converts `self` into the body, or `None` for an empty body.
    fn into_unfurl_response(self) -> HandlerResult;
}

impl IntoUnfurlResponse for () {
    fn into_unfurl_response(self) -> HandlerResult {
        Ok(None)
    }
}

impl IntoUnfurlResponse for Value {
    fn into_unfurl_response(self) -> HandlerResult {
        Ok(Some(self))
    }
}

impl IntoUnfurlResponse for Option<Value> {
    fn into_unfurl_response(self) -> HandlerResult {
        Ok(self)
    }
}

// ============================================================================
// Closure handlers
// ============================================================================

/// A [`LinkUnfurlingHandler`] backed by an async closure.
pub struct LinkHandlerFn<F, R, E> {
    name: String,
    trigger: TriggerSpec,
    f: F,
    _marker: PhantomData<fn() -> (R, E)>,
}

impl<F, R, E> LinkHandlerFn<F, R, E> {
    /// Sets the name reported in logs.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Boxes this handler for registration.
    pub fn boxed(self) -> BoxedLinkHandler
    where
        Self: LinkUnfurlingHandler + 'static,
    {
        Arc::new(self)
    }
}

/// Wraps an async closure as a link handler.
pub fn link_handler<F, Fut, R, E>(trigger: impl Into<TriggerSpec>, f: F) -> LinkHandlerFn<F, R, E>
where
    F: Fn(Arc<TurnContext>, Link) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoUnfurlResponse + 'static,
    E: Into<BoxError> + 'static,
{
    LinkHandlerFn {
        name: "link_handler".to_string(),
        trigger: trigger.into(),
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, R, E> LinkUnfurlingHandler for LinkHandlerFn<F, R, E>
where
    F: Fn(Arc<TurnContext>, Link) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoUnfurlResponse + 'static,
    E: Into<BoxError> + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn trigger(&self) -> &TriggerSpec {
        &self.trigger
    }

    async fn handle_link_received(&self, ctx: Arc<TurnContext>, link: Link) -> HandlerResult {
        (self.f)(ctx, link)
            .await
            .map_err(Into::into)?
            .into_unfurl_response()
    }
}
