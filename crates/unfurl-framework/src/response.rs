//! Messaging-extension result payloads.
//!
//! Handlers usually answer a query-link invoke with a
//! `{ "composeExtension": { "type": "result", ... } }` body. These types
//! build that shape; card content stays opaque JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handler::{HandlerResult, IntoUnfurlResponse};

/// Content type of an Adaptive Card attachment.
pub const ADAPTIVE_CARD: &str = "application/vnd.microsoft.card.adaptive";
/// Content type of a hero card attachment.
pub const HERO_CARD: &str = "application/vnd.microsoft.card.hero";
/// Content type of a thumbnail card attachment.
pub const THUMBNAIL_CARD: &str = "application/vnd.microsoft.card.thumbnail";

/// How the client lays out multiple attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentLayout {
    #[default]
    List,
    Grid,
}

/// A card attachment, optionally with a compact preview card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<Box<Attachment>>,
}

impl Attachment {
    pub fn new(content_type: impl Into<String>, content: Value) -> Self {
        Self {
            content_type: content_type.into(),
            content: Some(content),
            preview: None,
        }
    }

    pub fn adaptive_card(content: Value) -> Self {
        Self::new(ADAPTIVE_CARD, content)
    }

    pub fn hero_card(content: Value) -> Self {
        Self::new(HERO_CARD, content)
    }

    pub fn thumbnail_card(content: Value) -> Self {
        Self::new(THUMBNAIL_CARD, content)
    }

    /// Attaches the card shown in the compose box before the user sends.
    pub fn with_preview(mut self, preview: Attachment) -> Self {
        self.preview = Some(Box::new(preview));
        self
    }
}

/// The `composeExtension` member of a messaging-extension response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionResult {
    /// Always `"result"` for unfurling replies.
    #[serde(rename = "type")]
    pub result_type: String,
    pub attachment_layout: AttachmentLayout,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl MessagingExtensionResult {
    /// A `"result"` with the given layout.
    pub fn result(attachment_layout: AttachmentLayout, attachments: Vec<Attachment>) -> Self {
        Self {
            result_type: "result".to_string(),
            attachment_layout,
            attachments,
        }
    }
}

/// Body of a messaging-extension invoke response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingExtensionResponse {
    pub compose_extension: MessagingExtensionResult,
}

impl MessagingExtensionResponse {
    /// A list-layout result carrying `attachments`.
    pub fn result_list(attachments: Vec<Attachment>) -> Self {
        Self {
            compose_extension: MessagingExtensionResult::result(AttachmentLayout::List, attachments),
        }
    }

    /// A grid-layout result carrying `attachments`.
    pub fn result_grid(attachments: Vec<Attachment>) -> Self {
        Self {
            compose_extension: MessagingExtensionResult::result(AttachmentLayout::Grid, attachments),
        }
    }
}

impl IntoUnfurlResponse for MessagingExtensionResponse {
    fn into_unfurl_response(self) -> HandlerResult {
        Ok(Some(serde_json::to_value(self)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_list_shape() {
        let card = Attachment::thumbnail_card(json!({ "title": "dev" }));
        let body = MessagingExtensionResponse::result_list(vec![card])
            .into_unfurl_response()
            .unwrap()
            .unwrap();

        assert_eq!(
            body,
            json!({
                "composeExtension": {
                    "type": "result",
                    "attachmentLayout": "list",
                    "attachments": [{
                        "contentType": "application/vnd.microsoft.card.thumbnail",
                        "content": { "title": "dev" }
                    }]
                }
            })
        );
    }

    #[test]
    fn test_preview_is_nested() {
        let card = Attachment::adaptive_card(json!({ "type": "AdaptiveCard" }))
            .with_preview(Attachment::hero_card(json!({ "title": "preview" })));
        let value = serde_json::to_value(&card).unwrap();

        assert_eq!(value["preview"]["contentType"], HERO_CARD);
        assert_eq!(value["preview"]["content"]["title"], "preview");
    }

    #[test]
    fn test_grid_layout() {
        let response = MessagingExtensionResponse::result_grid(Vec::new());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["composeExtension"]["attachmentLayout"], "grid");
    }
}
