//! Ordinary replies from turn logic.
//!
//! Link unfurling always answers through the invoke envelope; this helper is
//! for everything else a bot says back.

use unfurl_core::{Activity, ResourceResponse, TurnContext, TurnResult};

/// Something turn logic wants to send.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Reply {
    /// A plain text message.
    Text(String),
    /// A fully formed activity, sent as is.
    Activity(Activity),
    /// Nothing to send.
    #[default]
    None,
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Activity> for Reply {
    fn from(activity: Activity) -> Self {
        Self::Activity(activity)
    }
}

impl<T: Into<Reply>> From<Option<T>> for Reply {
    fn from(reply: Option<T>) -> Self {
        reply.map_or(Self::None, Into::into)
    }
}

/// Sends `reply` through the turn context.
///
/// Returns the transport's receipt, or `None` when nothing was delivered.
pub async fn process_response(
    ctx: &TurnContext,
    reply: impl Into<Reply>,
) -> TurnResult<Option<ResourceResponse>> {
    match reply.into() {
        Reply::Text(text) => ctx.send_text(text).await,
        Reply::Activity(activity) => ctx.send_activity(activity).await,
        Reply::None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use unfurl_core::{ActivityType, MemoryTransport};

    fn ctx(transport: &MemoryTransport) -> TurnContext {
        TurnContext::new(Activity::message("hi"), Arc::new(transport.clone()))
    }

    #[tokio::test]
    async fn test_text_becomes_message() {
        let transport = MemoryTransport::new();
        let ctx = ctx(&transport);

        process_response(&ctx, "hello").await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].activity_type, ActivityType::Message);
        assert_eq!(sent[0].text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_activity_is_sent_as_is() {
        let transport = MemoryTransport::new();
        let ctx = ctx(&transport);
        let typing = Activity {
            activity_type: ActivityType::Typing,
            ..Default::default()
        };

        process_response(&ctx, typing).await.unwrap();

        assert_eq!(transport.sent()[0].activity_type, ActivityType::Typing);
    }

    #[tokio::test]
    async fn test_none_sends_nothing() {
        let transport = MemoryTransport::new();
        let ctx = ctx(&transport);

        let receipt = process_response(&ctx, Reply::None).await.unwrap();
        assert!(receipt.is_none());
        assert!(!ctx.responded());
        assert_eq!(transport.sent_count(), 0);
    }
}
