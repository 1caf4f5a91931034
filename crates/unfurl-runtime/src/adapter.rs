//! The turn pipeline.
//!
//! [`BotAdapter`] turns one inbound activity into one processed turn:
//!
//! ```text
//! Activity ─▶ TurnContext ─▶ MiddlewareSet ─▶ turn logic
//!                                  │
//!                               on error
//!                                  ▼
//!                          TurnErrorHandler
//! ```
//!
//! The result is a [`TurnOutcome`] carrying the synchronous invoke response.
//! Invokes that nobody answered get `501`; invokes whose turn failed get
//! `500`.
//!
//! The adapter is cheap to clone. Configuration methods copy the shared
//! state on write, so clones taken earlier keep their own middleware.

use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use serde_json::Value;
use tower::Service;
use tracing::{Instrument, Level, debug, error, span};
use unfurl_core::{
    Activity, ActivityType, BoxedMiddleware, BoxedTransport, InvokeResponse, MiddlewareSet,
    TurnContext, TurnError, TurnLogic, TurnResult,
};

use crate::config::{BotConfig, TurnErrorConfig};
use crate::error::{RuntimeError, RuntimeResult};

/// Name of the trace activity sent by the default turn-error handler.
pub const ERROR_TRACE_NAME: &str = "OnTurnError Trace";
/// Value type of that trace activity.
pub const ERROR_TRACE_VALUE_TYPE: &str = "https://www.botframework.com/schemas/error";
/// Label of that trace activity.
pub const ERROR_TRACE_LABEL: &str = "TurnError";

// ============================================================================
// Turn errors
// ============================================================================

/// Last-chance handling for a failed turn.
///
/// Implemented for async closures:
///
/// ```rust,ignore
/// adapter.on_turn_error(|ctx: Arc<TurnContext>, err: TurnError| async move {
///     ctx.send_text(format!("Sorry: {err}")).await?;
///     Ok(())
/// });
/// ```
pub trait TurnErrorHandler: Send + Sync {
    /// Reports `error` for the turn in `ctx`.
    fn on_turn_error(
        &self,
        ctx: Arc<TurnContext>,
        error: TurnError,
    ) -> BoxFuture<'static, TurnResult<()>>;
}

impl<F, Fut> TurnErrorHandler for F
where
    F: Fn(Arc<TurnContext>, TurnError) -> Fut + Send + Sync,
    Fut: Future<Output = TurnResult<()>> + Send + 'static,
{
    fn on_turn_error(
        &self,
        ctx: Arc<TurnContext>,
        error: TurnError,
    ) -> BoxFuture<'static, TurnResult<()>> {
        Box::pin((self)(ctx, error))
    }
}

/// Logs the error, sends a trace activity for the emulator, then tells the
/// user what went wrong.
#[derive(Debug, Clone, Default)]
pub struct DefaultTurnErrorHandler {
    config: TurnErrorConfig,
}

impl DefaultTurnErrorHandler {
    pub fn new(config: TurnErrorConfig) -> Self {
        Self { config }
    }
}

impl TurnErrorHandler for DefaultTurnErrorHandler {
    fn on_turn_error(
        &self,
        ctx: Arc<TurnContext>,
        error: TurnError,
    ) -> BoxFuture<'static, TurnResult<()>> {
        let config = self.config.clone();
        Box::pin(async move {
            let message = error.to_string();
            error!(error = %message, "Unhandled error during turn");

            if config.send_trace {
                ctx.send_trace_activity(
                    ERROR_TRACE_NAME,
                    Some(Value::String(message.clone())),
                    Some(ERROR_TRACE_VALUE_TYPE.to_string()),
                    Some(ERROR_TRACE_LABEL.to_string()),
                )
                .await?;
            }

            ctx.send_text(config.render_user_message(&message)).await?;
            if !config.follow_up.is_empty() {
                ctx.send_text(config.follow_up).await?;
            }
            Ok(())
        })
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// What a processed turn hands back to the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// The synchronous reply. Always present for invokes.
    pub invoke_response: Option<InvokeResponse>,
    /// Whether the turn failed and went through the turn-error handler.
    pub failed: bool,
}

#[derive(Clone)]
struct AdapterInner {
    transport: BoxedTransport,
    middleware: MiddlewareSet,
    bot: BotConfig,
    turn_error: Arc<dyn TurnErrorHandler>,
}

/// Runs inbound activities through the middleware chain and turn logic.
#[derive(Clone)]
pub struct BotAdapter {
    inner: Arc<AdapterInner>,
}

impl BotAdapter {
    /// Creates an adapter with default settings replying through `transport`.
    pub fn new(transport: BoxedTransport) -> Self {
        Self::with_config(transport, BotConfig::default(), TurnErrorConfig::default())
    }

    /// Creates an adapter for `bot` whose default turn-error handler follows
    /// `turn_error`.
    pub fn with_config(
        transport: BoxedTransport,
        bot: BotConfig,
        turn_error: TurnErrorConfig,
    ) -> Self {
        Self {
            inner: Arc::new(AdapterInner {
                transport,
                middleware: MiddlewareSet::new(),
                bot,
                turn_error: Arc::new(DefaultTurnErrorHandler::new(turn_error)),
            }),
        }
    }

    fn inner_mut(&mut self) -> &mut AdapterInner {
        Arc::make_mut(&mut self.inner)
    }

    /// Appends a middleware stage.
    pub fn use_middleware(&mut self, middleware: BoxedMiddleware) -> &mut Self {
        self.inner_mut().middleware.use_middleware(middleware);
        self
    }

    /// Appends a middleware stage (builder pattern).
    pub fn with_middleware(mut self, middleware: BoxedMiddleware) -> Self {
        self.use_middleware(middleware);
        self
    }

    /// Replaces the turn-error handler.
    pub fn on_turn_error(&mut self, handler: impl TurnErrorHandler + 'static) -> &mut Self {
        self.inner_mut().turn_error = Arc::new(handler);
        self
    }

    pub fn bot_config(&self) -> &BotConfig {
        &self.inner.bot
    }

    pub fn middleware(&self) -> &MiddlewareSet {
        &self.inner.middleware
    }

    pub fn transport(&self) -> &BoxedTransport {
        &self.inner.transport
    }

    /// Processes one activity.
    ///
    /// A failed turn is handed to the turn-error handler and reported through
    /// [`TurnOutcome::failed`]. An error is returned only when the handler
    /// itself fails.
    pub async fn process_activity(
        &self,
        activity: Activity,
        logic: Option<&dyn TurnLogic>,
    ) -> RuntimeResult<TurnOutcome> {
        let span = span!(
            Level::INFO,
            "turn",
            activity_type = %activity.activity_type,
            name = activity.name.as_deref().unwrap_or_default(),
            id = activity.id.as_deref().unwrap_or_default(),
        );
        self.run_turn(activity, logic).instrument(span).await
    }

    /// Decodes a JSON activity and processes it.
    pub async fn process_body(
        &self,
        body: &[u8],
        logic: Option<&dyn TurnLogic>,
    ) -> RuntimeResult<TurnOutcome> {
        let activity: Activity = serde_json::from_slice(body)
            .map_err(|e| TurnError::invalid_activity(e.to_string()))?;
        self.process_activity(activity, logic).await
    }

    async fn run_turn(
        &self,
        activity: Activity,
        logic: Option<&dyn TurnLogic>,
    ) -> RuntimeResult<TurnOutcome> {
        let is_invoke = activity.activity_type == ActivityType::Invoke;
        let ctx = Arc::new(TurnContext::new(
            activity,
            Arc::clone(&self.inner.transport),
        ));

        let failed = match self.inner.middleware.run(Arc::clone(&ctx), logic).await {
            Ok(()) => false,
            Err(err) => {
                self.inner
                    .turn_error
                    .on_turn_error(Arc::clone(&ctx), err)
                    .await
                    .inspect_err(|e| error!(error = %e, "Turn error handler failed"))?;
                true
            }
        };

        let invoke_response = match ctx.take_invoke_response() {
            Some(response) => Some(response),
            None if !is_invoke => None,
            None if failed => Some(InvokeResponse::internal_error()),
            None => Some(InvokeResponse::not_implemented()),
        };

        debug!(
            failed,
            status = invoke_response.as_ref().map(|r| r.status),
            "Turn completed"
        );

        Ok(TurnOutcome {
            invoke_response,
            failed,
        })
    }
}

impl std::fmt::Debug for BotAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotAdapter")
            .field("bot", &self.inner.bot)
            .field("middleware", &self.inner.middleware)
            .finish_non_exhaustive()
    }
}

/// Processes activities with no turn logic beyond the middleware chain.
impl Service<Activity> for BotAdapter {
    type Response = TurnOutcome;
    type Error = RuntimeError;
    type Future = BoxFuture<'static, RuntimeResult<TurnOutcome>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, activity: Activity) -> Self::Future {
        let adapter = self.clone();
        Box::pin(async move { adapter.process_activity(activity, None).await })
    }
}
