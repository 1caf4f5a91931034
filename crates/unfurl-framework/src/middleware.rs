//! The link-unfurling dispatch stage.
//!
//! [`LinkUnfurlingMiddleware`] watches for `composeExtension/queryLink`
//! invokes. For each one it walks the [`HandlerRegistry`] in order, hands
//! the URL to the first handler whose trigger matches, and records that
//! handler's result as the turn's invoke response:
//!
//! ```text
//! queryLink ─▶ H1.trigger? ──no──▶ H2.trigger? ──no──▶ (no reply)
//!                  │                   │
//!                 yes                 yes
//!                  ▼                   ▼
//!            H1.handle()          H2.handle()
//!                  └────────┬──────────┘
//!                           ▼
//!             invokeResponse { status: 200, body }
//! ```
//!
//! Whatever happens, a turn that did not fail continues down the chain
//! exactly once.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{Instrument, debug, debug_span};
use unfurl_core::{Activity, InvokeResponse, Middleware, Next, TurnContext, TurnResult};

use crate::error::LinkUnfurlError;
use crate::link::Link;
use crate::registry::HandlerRegistry;

/// Invoke name of a link-unfurling query.
pub const QUERY_LINK_INVOKE: &str = "composeExtension/queryLink";

/// Middleware routing query-link invokes to registered handlers.
#[derive(Clone)]
pub struct LinkUnfurlingMiddleware {
    registry: Arc<HandlerRegistry>,
}

impl LinkUnfurlingMiddleware {
    /// Creates the middleware over a finished registry.
    pub fn new(registry: impl Into<Arc<HandlerRegistry>>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    /// Returns the registry this middleware dispatches to.
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Runs matching and handling for a query-link turn.
    ///
    /// Returns `true` if a handler answered. A missing URL is treated as
    /// one that matches nothing.
    pub async fn dispatch(&self, ctx: &Arc<TurnContext>) -> Result<bool, LinkUnfurlError> {
        // Only `url` is read; other members may have any shape.
        let url = ctx
            .activity()
            .value
            .as_ref()
            .and_then(|value| value.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default();

        for handler in self.registry.iter() {
            let result = handler.trigger().should_trigger(url).map_err(|source| {
                LinkUnfurlError::Trigger {
                    handler: handler.name().to_string(),
                    source,
                }
            })?;

            if !result.is_match() {
                continue;
            }

            debug!(handler = handler.name(), url = %url, "Link matched handler");

            let link = Link::from_match(url, result);
            let body = handler
                .handle_link_received(Arc::clone(ctx), link)
                .await
                .map_err(|source| LinkUnfurlError::handler(handler.name(), source))?;

            ctx.send_activity(Activity::invoke_response(InvokeResponse::ok(body)))
                .await?;
            return Ok(true);
        }

        debug!(url = %url, "No link handler matched");
        Ok(false)
    }
}

#[async_trait]
impl Middleware for LinkUnfurlingMiddleware {
    fn name(&self) -> &'static str {
        "link_unfurling"
    }

    async fn on_turn(&self, ctx: Arc<TurnContext>, next: Next<'_>) -> TurnResult<()> {
        if !ctx.activity().is_named(QUERY_LINK_INVOKE) {
            return next.run(ctx).await;
        }

        let span = debug_span!("link_unfurling", handlers = self.registry.len());
        self.dispatch(&ctx).instrument(span).await?;

        next.run(ctx).await
    }
}

impl std::fmt::Debug for LinkUnfurlingMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkUnfurlingMiddleware")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{BoxedLinkHandler, link_handler};
    use crate::response::{Attachment, MessagingExtensionResponse};
    use regex::Regex;
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use unfurl_core::{ActivityType, BoxError, MemoryTransport, MiddlewareSet, TurnError};

    /// A handler answering `{ "handler": name }` and counting its calls.
    fn counting(name: &'static str, trigger: &str, calls: &Arc<AtomicUsize>) -> BoxedLinkHandler {
        let calls = Arc::clone(calls);
        link_handler(trigger, move |_ctx, _link| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, BoxError>(json!({ "handler": name }))
            }
        })
        .named(name)
        .boxed()
    }

    fn query_link(url: &str) -> Activity {
        Activity::invoke(QUERY_LINK_INVOKE, json!({ "url": url }))
    }

    struct Harness {
        set: MiddlewareSet,
        transport: MemoryTransport,
        next_calls: Arc<AtomicUsize>,
    }

    impl Harness {
        fn new(registry: HandlerRegistry) -> Self {
            Self {
                set: MiddlewareSet::new().with(Arc::new(LinkUnfurlingMiddleware::new(registry))),
                transport: MemoryTransport::new(),
                next_calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        async fn run(&self, activity: Activity) -> (Arc<TurnContext>, TurnResult<()>) {
            let ctx = Arc::new(TurnContext::new(
                activity,
                Arc::new(self.transport.clone()),
            ));
            let next_calls = Arc::clone(&self.next_calls);
            let logic = move |_ctx: Arc<TurnContext>| {
                let next_calls = Arc::clone(&next_calls);
                async move {
                    next_calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TurnError>(())
                }
            };
            let result = self.set.run(Arc::clone(&ctx), Some(&logic)).await;
            (ctx, result)
        }

        fn next_calls(&self) -> usize {
            self.next_calls.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn test_first_registered_handler_wins() {
        let h1_calls = Arc::new(AtomicUsize::new(0));
        let h2_calls = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new()
            .with(counting("h1", "contoso", &h1_calls))
            .with(counting("h2", "contoso", &h2_calls));
        let harness = Harness::new(registry);

        let (ctx, result) = harness.run(query_link("https://contoso.com/a")).await;
        result.unwrap();

        assert_eq!(h1_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h2_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            ctx.invoke_response(),
            Some(InvokeResponse::ok(Some(json!({ "handler": "h1" }))))
        );
        assert_eq!(harness.next_calls(), 1);
    }

    #[tokio::test]
    async fn test_later_handler_answers_when_earlier_misses() {
        let h1_calls = Arc::new(AtomicUsize::new(0));
        let h2_calls = Arc::new(AtomicUsize::new(0));
        let registry = HandlerRegistry::new()
            .with(counting("h1", "fabrikam", &h1_calls))
            .with(counting("h2", "contoso", &h2_calls));
        let harness = Harness::new(registry);

        let (ctx, result) = harness.run(query_link("https://contoso.com")).await;
        result.unwrap();

        assert_eq!(h1_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h2_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            ctx.invoke_response().and_then(|r| r.body),
            Some(json!({ "handler": "h2" }))
        );
    }

    #[tokio::test]
    async fn test_no_match_sends_nothing_and_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let harness = Harness::new(HandlerRegistry::new().with(counting("h", "contoso", &calls)));

        let (ctx, result) = harness.run(query_link("https://example.org")).await;
        result.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(ctx.invoke_response().is_none());
        assert!(!ctx.responded());
        assert_eq!(harness.transport.sent_count(), 0);
        assert_eq!(harness.next_calls(), 1);
    }

    #[tokio::test]
    async fn test_other_activities_pass_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let harness = Harness::new(HandlerRegistry::new().with(counting("h", ".*", &calls)));

        let (_, result) = harness.run(Activity::message("https://contoso.com")).await;
        result.unwrap();
        let (_, result) = harness
            .run(Activity::invoke(
                "composeExtension/query",
                json!({ "url": "https://contoso.com" }),
            ))
            .await;
        result.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.next_calls(), 2);
    }

    #[tokio::test]
    async fn test_missing_url_matches_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let harness = Harness::new(HandlerRegistry::new().with(counting("h", ".*", &calls)));

        let (ctx, result) = harness
            .run(Activity::invoke(QUERY_LINK_INVOKE, json!({})))
            .await;
        result.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(ctx.invoke_response().is_none());
        assert_eq!(harness.next_calls(), 1);
    }

    #[tokio::test]
    async fn test_url_is_read_whatever_the_state_shape() {
        let calls = Arc::new(AtomicUsize::new(0));
        let harness = Harness::new(
            HandlerRegistry::new().with(counting("dev", r".*\.test111\.com/dev/.*", &calls)),
        );

        for state in [json!({ "k": 1 }), json!(7), json!(null), json!("signed-in")] {
            let value = json!({ "url": "https://a.test111.com/dev/x", "state": state });
            let (ctx, result) = harness.run(Activity::invoke(QUERY_LINK_INVOKE, value)).await;
            result.unwrap();

            assert_eq!(
                ctx.invoke_response(),
                Some(InvokeResponse::ok(Some(json!({ "handler": "dev" }))))
            );
        }

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(harness.next_calls(), 4);
    }

    #[tokio::test]
    async fn test_non_string_url_matches_nothing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let harness = Harness::new(HandlerRegistry::new().with(counting("h", ".*", &calls)));

        let (ctx, result) = harness
            .run(Activity::invoke(QUERY_LINK_INVOKE, json!({ "url": 42 })))
            .await;
        result.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(ctx.invoke_response().is_none());
    }

    #[tokio::test]
    async fn test_regex_trigger_passes_captures() {
        let seen = Arc::new(parking_lot::Mutex::new(None));
        let seen_in_handler = Arc::clone(&seen);
        let handler = link_handler(
            Regex::new(r"/items/(?<id>\d+)").unwrap(),
            move |_ctx, link: Link| {
                let seen = Arc::clone(&seen_in_handler);
                async move {
                    *seen.lock() = link.matches.as_ref().and_then(|m| m.name("id")).map(String::from);
                    Ok::<_, BoxError>(())
                }
            },
        )
        .boxed();
        let harness = Harness::new(HandlerRegistry::new().with(handler));

        let (ctx, result) = harness.run(query_link("https://shop.example/items/42")).await;
        result.unwrap();

        assert_eq!(seen.lock().as_deref(), Some("42"));
        assert_eq!(ctx.invoke_response(), Some(InvokeResponse::ok(None)));
    }

    #[tokio::test]
    async fn test_handler_failure_fails_the_turn() {
        let handler = link_handler("contoso", |_ctx, _link| async {
            Err::<(), _>(std::io::Error::other("card service unavailable"))
        })
        .named("broken")
        .boxed();
        let harness = Harness::new(HandlerRegistry::new().with(handler));

        let (ctx, result) = harness.run(query_link("https://contoso.com")).await;
        let err = result.unwrap_err();

        assert!(matches!(
            err,
            TurnError::Middleware {
                middleware: "link_unfurling",
                ..
            }
        ));
        assert!(err.to_string().contains("broken"));
        assert!(ctx.invoke_response().is_none());
        assert_eq!(harness.next_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_literal_fails_the_turn() {
        let calls = Arc::new(AtomicUsize::new(0));
        let harness = Harness::new(
            HandlerRegistry::new()
                .with(counting("bad", "(unclosed", &calls))
                .with(counting("good", "contoso", &calls)),
        );

        let (_, result) = harness.run(query_link("https://contoso.com")).await;

        assert!(matches!(result, Err(TurnError::Middleware { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.next_calls(), 0);
    }

    fn main_handler() -> BoxedLinkHandler {
        link_handler(r".*\.test111\.com/main/.*", |_ctx, _link| async {
            let card = Attachment::adaptive_card(json!({ "type": "AdaptiveCard" }))
                .with_preview(Attachment::hero_card(json!({ "title": "main preview" })));
            Ok::<_, BoxError>(MessagingExtensionResponse::result_list(vec![card]))
        })
        .named("main")
        .boxed()
    }

    fn dev_handler() -> BoxedLinkHandler {
        link_handler(r".*\.test111\.com/dev/.*", |_ctx, _link| async {
            let card = Attachment::thumbnail_card(json!({ "title": "card rendered for dev" }));
            Ok::<_, BoxError>(MessagingExtensionResponse::result_list(vec![card]))
        })
        .named("dev")
        .boxed()
    }

    fn body_of(ctx: &TurnContext) -> Value {
        ctx.invoke_response()
            .and_then(|r| r.body)
            .unwrap_or(Value::Null)
    }

    #[tokio::test]
    async fn test_main_and_dev_links_route_to_their_handlers() {
        let harness = Harness::new(
            HandlerRegistry::new()
                .with(main_handler())
                .with(dev_handler()),
        );

        let (ctx, result) = harness.run(query_link("https://www.test111.com/main/a")).await;
        result.unwrap();
        let body = body_of(&ctx);
        assert_eq!(body["composeExtension"]["type"], "result");
        assert_eq!(body["composeExtension"]["attachmentLayout"], "list");
        assert_eq!(
            body["composeExtension"]["attachments"][0]["contentType"],
            "application/vnd.microsoft.card.adaptive"
        );

        let (ctx, result) = harness.run(query_link("https://www.TEST111.com/dev/b")).await;
        result.unwrap();
        let body = body_of(&ctx);
        assert_eq!(
            body["composeExtension"]["attachments"][0]["content"]["title"],
            "card rendered for dev"
        );

        let (ctx, result) = harness.run(query_link("https://www.test111.com/other")).await;
        result.unwrap();
        assert!(ctx.invoke_response().is_none());

        assert_eq!(harness.next_calls(), 3);
        assert!(
            harness
                .transport
                .sent()
                .iter()
                .all(|a| a.activity_type != ActivityType::InvokeResponse)
        );
    }
}
