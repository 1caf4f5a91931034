//! Linear middleware chain.
//!
//! Every inbound turn runs through an ordered list of [`Middleware`] stages
//! and finally the bot's [`TurnLogic`]:
//!
//! ```text
//! ┌──────────┐   next   ┌──────────┐   next   ┌────────────┐
//! │ stage 0  │─────────▶│ stage 1  │─────────▶│ turn logic │
//! └──────────┘          └──────────┘          └────────────┘
//! ```
//!
//! A stage receives a [`Next`] continuation. Running it consumes it, so a
//! stage continues the chain at most once; a stage that never runs it ends
//! the turn early.
//!
//! # Example
//!
//! ```rust,ignore
//! struct LogStage;
//!
//! #[async_trait]
//! impl Middleware for LogStage {
//!     fn name(&self) -> &'static str {
//!         "log"
//!     }
//!
//!     async fn on_turn(&self, ctx: Arc<TurnContext>, next: Next<'_>) -> TurnResult<()> {
//!         info!(activity_type = %ctx.activity().activity_type, "turn");
//!         next.run(ctx).await
//!     }
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::trace;

use crate::context::TurnContext;
use crate::error::TurnResult;

// ============================================================================
// Middleware Trait
// ============================================================================

/// A stage of the turn pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str {
        "middleware"
    }

    /// Processes the turn, calling `next.run(ctx)` to continue the chain.
    async fn on_turn(&self, ctx: Arc<TurnContext>, next: Next<'_>) -> TurnResult<()>;
}

/// A type-erased middleware stage.
pub type BoxedMiddleware = Arc<dyn Middleware>;

// ============================================================================
// Turn Logic
// ============================================================================

/// The bot's own handling, run after every middleware stage has continued.
///
/// Implemented for async closures taking the context:
///
/// ```rust,ignore
/// let logic = |ctx: Arc<TurnContext>| async move {
///     ctx.send_text("hi").await?;
///     Ok(())
/// };
/// ```
pub trait TurnLogic: Send + Sync {
    /// Runs the logic for one turn.
    fn call(&self, ctx: Arc<TurnContext>) -> BoxFuture<'static, TurnResult<()>>;
}

impl<F, Fut> TurnLogic for F
where
    F: Fn(Arc<TurnContext>) -> Fut + Send + Sync,
    Fut: Future<Output = TurnResult<()>> + Send + 'static,
{
    fn call(&self, ctx: Arc<TurnContext>) -> BoxFuture<'static, TurnResult<()>> {
        Box::pin((self)(ctx))
    }
}

// ============================================================================
// Next
// ============================================================================

/// The continuation handed to a middleware stage.
pub struct Next<'a> {
    rest: &'a [BoxedMiddleware],
    logic: Option<&'a dyn TurnLogic>,
}

impl<'a> Next<'a> {
    fn new(rest: &'a [BoxedMiddleware], logic: Option<&'a dyn TurnLogic>) -> Self {
        Self { rest, logic }
    }

    /// Runs the remaining stages and then the turn logic.
    pub fn run(self, ctx: Arc<TurnContext>) -> BoxFuture<'a, TurnResult<()>> {
        Box::pin(async move {
            match self.rest.split_first() {
                Some((stage, rest)) => {
                    trace!(middleware = stage.name(), "Entering middleware");
                    stage.on_turn(ctx, Next::new(rest, self.logic)).await
                }
                None => match self.logic {
                    Some(logic) => logic.call(ctx).await,
                    None => Ok(()),
                },
            }
        })
    }
}

// ============================================================================
// MiddlewareSet
// ============================================================================

/// An ordered collection of middleware stages.
#[derive(Clone, Default)]
pub struct MiddlewareSet {
    stages: Vec<BoxedMiddleware>,
}

impl MiddlewareSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage. Stages run in the order they are added.
    pub fn use_middleware(&mut self, middleware: BoxedMiddleware) {
        self.stages.push(middleware);
    }

    /// Appends a stage (builder pattern).
    pub fn with(mut self, middleware: BoxedMiddleware) -> Self {
        self.stages.push(middleware);
        self
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns `true` if no stage is installed.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Returns the stage names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs the whole chain for one turn.
    pub async fn run(
        &self,
        ctx: Arc<TurnContext>,
        logic: Option<&dyn TurnLogic>,
    ) -> TurnResult<()> {
        Next::new(&self.stages, logic).run(ctx).await
    }
}

impl std::fmt::Debug for MiddlewareSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewareSet")
            .field("stages", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::Activity;
    use crate::error::TurnError;
    use crate::transport::MemoryTransport;
    use parking_lot::Mutex;

    struct Record {
        label: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        continue_chain: bool,
    }

    #[async_trait]
    impl Middleware for Record {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn on_turn(&self, ctx: Arc<TurnContext>, next: Next<'_>) -> TurnResult<()> {
            self.log.lock().push(self.label);
            if self.continue_chain {
                next.run(ctx).await?;
            }
            self.log.lock().push("after");
            Ok(())
        }
    }

    fn ctx() -> Arc<TurnContext> {
        Arc::new(TurnContext::new(
            Activity::message("hi"),
            Arc::new(MemoryTransport::new()),
        ))
    }

    fn stage(
        label: &'static str,
        log: &Arc<Mutex<Vec<&'static str>>>,
        continue_chain: bool,
    ) -> BoxedMiddleware {
        Arc::new(Record {
            label,
            log: Arc::clone(log),
            continue_chain,
        })
    }

    #[tokio::test]
    async fn test_stages_run_in_order_then_logic() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = MiddlewareSet::new()
            .with(stage("first", &log, true))
            .with(stage("second", &log, true));

        let logic_log = Arc::clone(&log);
        let logic = move |_ctx: Arc<TurnContext>| {
            let log = Arc::clone(&logic_log);
            async move {
                log.lock().push("logic");
                Ok::<_, TurnError>(())
            }
        };

        set.run(ctx(), Some(&logic)).await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first", "second", "logic", "after", "after"]
        );
        assert_eq!(set.names(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_stage_can_end_turn() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let set = MiddlewareSet::new()
            .with(stage("gate", &log, false))
            .with(stage("unreached", &log, true));

        set.run(ctx(), None).await.unwrap();

        assert_eq!(*log.lock(), vec!["gate", "after"]);
    }

    #[tokio::test]
    async fn test_logic_error_propagates() {
        let set = MiddlewareSet::new();
        let logic = |_ctx: Arc<TurnContext>| async { Err::<(), _>(TurnError::logic("boom")) };

        let err = set.run(ctx(), Some(&logic)).await.unwrap_err();
        assert!(matches!(err, TurnError::Logic(_)));
    }

    #[tokio::test]
    async fn test_empty_chain_without_logic_is_ok() {
        assert!(MiddlewareSet::new().run(ctx(), None).await.is_ok());
    }
}
