//! Link Unfurl Bot Example
//!
//! A message extension that renders previews for two families of links:
//!
//! - `*.test111.com/main/...` gets an Adaptive Card with a hero-card preview
//! - `*.test111.com/dev/...` gets a thumbnail card
//!
//! Activities are read as newline-delimited JSON from stdin. Everything the
//! bot sends, and every invoke response, is written to stdout as JSON.
//!
//! # Usage
//!
//! ```bash
//! echo '{"type":"invoke","name":"composeExtension/queryLink","value":{"url":"https://a.test111.com/dev/1"}}' \
//!     | cargo run --package link-unfurl-bot
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use unfurl::core::{ResourceResponse, TransportResult};
use unfurl::prelude::*;

/// Icon shown on dev thumbnail cards.
const COMPOSER_ICON: &str = "https://bot-framework.azureedge.net/static/341749-d71b264801/intercom-webui/v1.6.2/assets/landing-page/images/Composer_Icon.png";

#[derive(Debug, Parser)]
#[command(version, about = "Link-unfurling bot reading activities from stdin")]
struct Args {
    /// Configuration file to load instead of searching for unfurl.toml.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration profile, e.g. "development" or "production".
    #[arg(short, long)]
    profile: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Renders `*.test111.com/main/...` links.
struct MainLinkUnfurlingHandler {
    trigger: TriggerSpec,
}

impl MainLinkUnfurlingHandler {
    fn new() -> Self {
        Self {
            trigger: TriggerSpec::from(r".*\.test111\.com/main/.*"),
        }
    }

    fn card(link: &str) -> Value {
        json!({
            "type": "AdaptiveCard",
            "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
            "version": "1.4",
            "body": [
                { "type": "TextBlock", "size": "Medium", "weight": "Bolder", "text": "Main page" },
                { "type": "TextBlock", "text": link, "wrap": true }
            ],
            "actions": [
                { "type": "Action.OpenUrl", "title": "Open", "url": link }
            ]
        })
    }
}

#[async_trait]
impl LinkUnfurlingHandler for MainLinkUnfurlingHandler {
    fn name(&self) -> &str {
        "main"
    }

    fn trigger(&self) -> &TriggerSpec {
        &self.trigger
    }

    async fn handle_link_received(&self, _ctx: Arc<TurnContext>, link: Link) -> HandlerResult {
        info!(link = link.as_str(), "app received link");

        let attachment = Attachment::adaptive_card(Self::card(link.as_str())).with_preview(
            Attachment::hero_card(json!({
                "title": "test",
                "text": "test",
                "images": [],
                "buttons": []
            })),
        );
        Ok(Some(serde_json::to_value(
            MessagingExtensionResponse::result_list(vec![attachment]),
        )?))
    }
}

/// Renders `*.test111.com/dev/...` links.
struct DevLinkUnfurlingHandler {
    trigger: TriggerSpec,
}

impl DevLinkUnfurlingHandler {
    fn new() -> Self {
        Self {
            trigger: TriggerSpec::from(r".*\.test111\.com/dev/.*"),
        }
    }
}

#[async_trait]
impl LinkUnfurlingHandler for DevLinkUnfurlingHandler {
    fn name(&self) -> &str {
        "dev"
    }

    fn trigger(&self) -> &TriggerSpec {
        &self.trigger
    }

    async fn handle_link_received(&self, _ctx: Arc<TurnContext>, link: Link) -> HandlerResult {
        info!(link = link.as_str(), "app received link");

        let attachment = Attachment::thumbnail_card(json!({
            "title": "card rendered for dev",
            "text": link.as_str(),
            "images": [{ "url": COMPOSER_ICON }],
            "buttons": []
        }));
        Ok(Some(serde_json::to_value(
            MessagingExtensionResponse::result_list(vec![attachment]),
        )?))
    }
}

fn handlers() -> Vec<BoxedLinkHandler> {
    vec![
        Arc::new(MainLinkUnfurlingHandler::new()),
        Arc::new(DevLinkUnfurlingHandler::new()),
    ]
}

// ============================================================================
// Console transport
// ============================================================================

/// Writes every outbound activity to stdout as one JSON line.
#[derive(Default)]
struct ConsoleTransport {
    next_id: AtomicUsize,
}

#[async_trait]
impl TurnTransport for ConsoleTransport {
    async fn send_activities(
        &self,
        activities: Vec<Activity>,
    ) -> TransportResult<Vec<ResourceResponse>> {
        let mut responses = Vec::with_capacity(activities.len());
        for activity in activities {
            println!("{}", json!({ "outbound": activity }));
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            responses.push(ResourceResponse {
                id: format!("console-{id}"),
            });
        }
        Ok(responses)
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = UnfurlRuntime::builder();
    if let Some(path) = &args.config {
        builder = builder.config_file(path);
    }
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile.as_str());
    }
    let runtime = builder.build()?;

    let app = runtime.message_extension(Arc::new(ConsoleTransport::default()), handlers())?;
    info!("Link unfurl bot ready, reading activities from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match app.request_body(line.as_bytes(), None).await {
            Ok(outcome) => {
                if let Some(response) = outcome.invoke_response {
                    println!("{}", json!({ "invokeResponse": response }));
                }
            }
            Err(e) => error!(error = %e, "Failed to process activity"),
        }
    }

    info!("Input closed, shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unfurl::core::MemoryTransport;
    use unfurl::framework::QUERY_LINK_INVOKE;

    fn app() -> MessageExtension {
        MessageExtension::new(
            MessageExtensionOptions::with_transport(Arc::new(MemoryTransport::new()))
                .adapter_config(Default::default())
                .link_unfurling(LinkUnfurlingOptions {
                    enabled: true,
                    links: handlers(),
                }),
        )
        .unwrap()
    }

    async fn unfurl(url: &str) -> Option<InvokeResponse> {
        app()
            .request_handler(Activity::invoke(QUERY_LINK_INVOKE, json!({ "url": url })), None)
            .await
            .unwrap()
            .invoke_response
    }

    #[tokio::test]
    async fn test_main_link_gets_adaptive_card() {
        let response = unfurl("https://www.test111.com/main/page").await.unwrap();
        let body = response.body.unwrap();
        let attachment = &body["composeExtension"]["attachments"][0];

        assert_eq!(response.status, 200);
        assert_eq!(body["composeExtension"]["type"], "result");
        assert_eq!(body["composeExtension"]["attachmentLayout"], "list");
        assert_eq!(attachment["contentType"], "application/vnd.microsoft.card.adaptive");
        assert_eq!(
            attachment["preview"]["contentType"],
            "application/vnd.microsoft.card.hero"
        );
    }

    #[tokio::test]
    async fn test_dev_link_gets_thumbnail() {
        let response = unfurl("https://www.test111.com/dev/page").await.unwrap();
        let body = response.body.unwrap();
        let attachment = &body["composeExtension"]["attachments"][0];

        assert_eq!(attachment["contentType"], "application/vnd.microsoft.card.thumbnail");
        assert_eq!(attachment["content"]["title"], "card rendered for dev");
        assert_eq!(attachment["content"]["text"], "https://www.test111.com/dev/page");
        assert_eq!(attachment["content"]["images"][0]["url"], COMPOSER_ICON);
    }

    #[tokio::test]
    async fn test_other_link_is_not_answered() {
        let response = unfurl("https://contoso.com/main/page").await.unwrap();
        assert_eq!(response.status, 501);
    }
}
