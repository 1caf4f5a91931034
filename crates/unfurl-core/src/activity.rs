//! Activity model.
//!
//! Activities are the unit of exchange with the messaging platform: every
//! inbound request carries one and every reply is one. The model keeps the
//! fields the pipeline reads or writes and preserves everything else in
//! [`Activity::extra`] so that round-tripping a payload loses nothing.
//!
//! ```rust,ignore
//! let inbound: Activity = serde_json::from_str(body)?;
//! if inbound.name.as_deref() == Some("composeExtension/queryLink") {
//!     let query: Option<AppBasedLinkQuery> = inbound.value_as();
//! }
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Activity Type Classification
// ============================================================================

/// The `type` field of an activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    /// A user or bot message.
    #[default]
    Message,
    /// A synchronous request that expects an [`InvokeResponse`].
    Invoke,
    /// The synchronous reply to an invoke activity.
    InvokeResponse,
    /// Diagnostic activity shown by emulators only.
    Trace,
    /// Asynchronous named event.
    Event,
    /// Members joined or left the conversation.
    ConversationUpdate,
    /// Typing indicator.
    Typing,
    /// Any type this model does not know.
    #[serde(other)]
    Unknown,
}

impl ActivityType {
    /// Returns the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::Invoke => "invoke",
            Self::InvokeResponse => "invokeResponse",
            Self::Trace => "trace",
            Self::Event => "event",
            Self::ConversationUpdate => "conversationUpdate",
            Self::Typing => "typing",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// A participant of a conversation (user or bot).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelAccount {
    /// Channel-specific identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Azure AD object id, when the channel provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aad_object_id: Option<String>,
}

/// The conversation an activity belongs to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    /// Conversation identifier.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `personal`, `groupChat` or `channel`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_type: Option<String>,
    /// Tenant the conversation lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Whether more than two participants take part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
}

/// Identifier returned by the transport for a delivered activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    /// Identifier assigned by the channel.
    #[serde(default)]
    pub id: String,
}

// ============================================================================
// Invoke payloads
// ============================================================================

/// The synchronous reply to an invoke activity.
///
/// The body is opaque to the pipeline; an absent body is omitted from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResponse {
    /// HTTP-like status code.
    pub status: u16,
    /// Reply payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl InvokeResponse {
    /// Creates a response with the given status and body.
    pub fn new(status: u16, body: Option<Value>) -> Self {
        Self { status, body }
    }

    /// A `200` response carrying `body`.
    pub fn ok(body: Option<Value>) -> Self {
        Self::new(200, body)
    }

    /// The `501` reply for invokes nobody answered.
    pub fn not_implemented() -> Self {
        Self::new(501, None)
    }

    /// The `500` reply for invokes whose turn failed.
    pub fn internal_error() -> Self {
        Self::new(500, None)
    }

    fn into_value(self) -> Value {
        let mut map = Map::new();
        map.insert("status".to_string(), Value::from(self.status));
        if let Some(body) = self.body {
            map.insert("body".to_string(), body);
        }
        Value::Object(map)
    }
}

/// Payload of a `composeExtension/queryLink` invoke.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppBasedLinkQuery {
    /// The URL the user pasted.
    #[serde(default)]
    pub url: Option<String>,
    /// Opaque state echoed back after a sign-in flow, kept in whatever shape
    /// the channel sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
}

// ============================================================================
// Activity
// ============================================================================

/// A single activity exchanged with the messaging platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type", default)]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Name of an invoke or event activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Value>,
    /// Fields not modelled above, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    /// Creates a text message.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Creates a named invoke activity.
    pub fn invoke(name: impl Into<String>, value: Value) -> Self {
        Self {
            activity_type: ActivityType::Invoke,
            name: Some(name.into()),
            value: Some(value),
            ..Default::default()
        }
    }

    /// Wraps an [`InvokeResponse`] in an `invokeResponse` activity.
    pub fn invoke_response(response: InvokeResponse) -> Self {
        Self {
            activity_type: ActivityType::InvokeResponse,
            value: Some(response.into_value()),
            ..Default::default()
        }
    }

    /// Creates a trace activity.
    pub fn trace(
        name: impl Into<String>,
        value: Option<Value>,
        value_type: Option<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            activity_type: ActivityType::Trace,
            name: Some(name.into()),
            value,
            value_type,
            label,
            ..Default::default()
        }
    }

    /// Returns `true` if this activity carries the given invoke/event name.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }

    /// Deserializes the `value` field into `T`, if present and well-formed.
    pub fn value_as<T: DeserializeOwned>(&self) -> Option<T> {
        self.value
            .as_ref()
            .and_then(|v| T::deserialize(v).ok())
    }

    /// Reads the [`InvokeResponse`] carried by an `invokeResponse` activity.
    pub fn as_invoke_response(&self) -> Option<InvokeResponse> {
        if self.activity_type != ActivityType::InvokeResponse {
            return None;
        }
        self.value_as()
    }

    /// Addresses this activity as a reply to `inbound`.
    ///
    /// Fields already set on `self` are left untouched.
    pub fn apply_conversation_reference(&mut self, inbound: &Activity) {
        if self.conversation.is_none() {
            self.conversation.clone_from(&inbound.conversation);
        }
        if self.channel_id.is_none() {
            self.channel_id.clone_from(&inbound.channel_id);
        }
        if self.service_url.is_none() {
            self.service_url.clone_from(&inbound.service_url);
        }
        if self.from.is_none() {
            self.from.clone_from(&inbound.recipient);
        }
        if self.recipient.is_none() {
            self.recipient.clone_from(&inbound.from);
        }
        if self.reply_to_id.is_none() {
            self.reply_to_id.clone_from(&inbound.id);
        }
    }
}
