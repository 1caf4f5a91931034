//! Turn context.
//!
//! One [`TurnContext`] is created per inbound activity and shared (behind an
//! `Arc`) by every middleware stage and the turn logic. It owns the inbound
//! activity and the outbound side of the turn:
//!
//! - ordinary activities are addressed to the sender and handed to the
//!   [`TurnTransport`](crate::transport::TurnTransport);
//! - an `invokeResponse` activity is never delivered through the transport.
//!   It is stored as the turn's synchronous reply, which the adapter hands back
//!   to the caller once the turn completes.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace};

use crate::activity::{Activity, ActivityType, InvokeResponse, ResourceResponse};
use crate::error::TurnResult;
use crate::transport::BoxedTransport;

/// Per-turn state handed to middleware, handlers and turn logic.
pub struct TurnContext {
    activity: Activity,
    transport: BoxedTransport,
    /// Set once anything has been sent for this turn.
    responded: AtomicBool,
    invoke_response: Mutex<Option<InvokeResponse>>,
}

impl TurnContext {
    /// Creates a context for `activity`, replying through `transport`.
    pub fn new(activity: Activity, transport: BoxedTransport) -> Self {
        Self {
            activity,
            transport,
            responded: AtomicBool::new(false),
            invoke_response: Mutex::new(None),
        }
    }

    /// Returns the inbound activity.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// Returns the transport used for outbound activities.
    pub fn transport(&self) -> &BoxedTransport {
        &self.transport
    }

    /// Returns `true` once any activity has been sent during this turn.
    pub fn responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }

    /// Returns the synchronous reply recorded for this turn, if any.
    pub fn invoke_response(&self) -> Option<InvokeResponse> {
        self.invoke_response.lock().clone()
    }

    /// Removes and returns the synchronous reply recorded for this turn.
    pub fn take_invoke_response(&self) -> Option<InvokeResponse> {
        self.invoke_response.lock().take()
    }

    /// Sends a single activity.
    ///
    /// Returns `None` for `invokeResponse` activities, which are recorded
    /// rather than delivered.
    pub async fn send_activity(&self, activity: Activity) -> TurnResult<Option<ResourceResponse>> {
        let is_invoke_response = activity.activity_type == ActivityType::InvokeResponse;
        let mut responses = self.send_activities(vec![activity]).await?;
        if is_invoke_response {
            return Ok(None);
        }
        Ok(responses.pop())
    }

    /// Sends a plain text message.
    pub async fn send_text(&self, text: impl Into<String>) -> TurnResult<Option<ResourceResponse>> {
        self.send_activity(Activity::message(text)).await
    }

    /// Sends a trace activity.
    pub async fn send_trace_activity(
        &self,
        name: impl Into<String>,
        value: Option<Value>,
        value_type: Option<String>,
        label: Option<String>,
    ) -> TurnResult<Option<ResourceResponse>> {
        self.send_activity(Activity::trace(name, value, value_type, label))
            .await
    }

    /// Sends activities in order.
    ///
    /// The returned list has one entry per input activity; recorded invoke
    /// responses get an empty [`ResourceResponse`].
    pub async fn send_activities(
        &self,
        activities: Vec<Activity>,
    ) -> TurnResult<Vec<ResourceResponse>> {
        let mut responses = vec![ResourceResponse::default(); activities.len()];
        let mut outbound = Vec::with_capacity(activities.len());
        let mut outbound_slots = Vec::with_capacity(activities.len());

        for (slot, mut activity) in activities.into_iter().enumerate() {
            activity.apply_conversation_reference(&self.activity);

            if activity.activity_type == ActivityType::InvokeResponse {
                let response = activity.as_invoke_response();
                debug!(
                    status = response.as_ref().map(|r| r.status),
                    "Recorded invoke response"
                );
                *self.invoke_response.lock() = response;
            } else {
                outbound_slots.push(slot);
                outbound.push(activity);
            }
        }

        self.responded.store(true, Ordering::SeqCst);

        if outbound.is_empty() {
            return Ok(responses);
        }

        trace!(count = outbound.len(), "Delivering activities");
        let delivered = self.transport.send_activities(outbound).await?;
        for (slot, response) in outbound_slots.into_iter().zip(delivered) {
            responses[slot] = response;
        }

        Ok(responses)
    }
}

impl std::fmt::Debug for TurnContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnContext")
            .field("activity", &self.activity)
            .field("responded", &self.responded())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ChannelAccount;
    use crate::transport::MemoryTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn inbound() -> Activity {
        Activity {
            id: Some("in-1".into()),
            from: Some(ChannelAccount {
                id: "user".into(),
                ..Default::default()
            }),
            ..Activity::invoke("composeExtension/queryLink", json!({ "url": "x" }))
        }
    }

    #[tokio::test]
    async fn test_invoke_response_is_recorded_not_delivered() {
        let transport = MemoryTransport::new();
        let ctx = TurnContext::new(inbound(), Arc::new(transport.clone()));

        let sent = ctx
            .send_activity(Activity::invoke_response(InvokeResponse::ok(Some(
                json!({ "k": "v" }),
            ))))
            .await
            .unwrap();

        assert!(sent.is_none());
        assert!(ctx.responded());
        assert_eq!(transport.sent_count(), 0);
        assert_eq!(
            ctx.invoke_response(),
            Some(InvokeResponse::ok(Some(json!({ "k": "v" }))))
        );
    }

    #[tokio::test]
    async fn test_messages_are_addressed_and_delivered() {
        let transport = MemoryTransport::new();
        let ctx = TurnContext::new(inbound(), Arc::new(transport.clone()));

        let sent = ctx.send_text("hello").await.unwrap();

        assert!(sent.is_some());
        let delivered = transport.sent();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].text.as_deref(), Some("hello"));
        assert_eq!(delivered[0].reply_to_id.as_deref(), Some("in-1"));
        assert_eq!(delivered[0].recipient.as_ref().unwrap().id, "user");
        assert!(ctx.invoke_response().is_none());
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_slot_order() {
        let transport = MemoryTransport::new();
        let ctx = TurnContext::new(inbound(), Arc::new(transport.clone()));

        let responses = ctx
            .send_activities(vec![
                Activity::message("one"),
                Activity::invoke_response(InvokeResponse::ok(None)),
                Activity::message("two"),
            ])
            .await
            .unwrap();

        assert_eq!(responses.len(), 3);
        assert_eq!(responses[0].id, "0");
        assert_eq!(responses[1], ResourceResponse::default());
        assert_eq!(responses[2].id, "1");
        assert_eq!(transport.sent_count(), 2);
        assert_eq!(ctx.take_invoke_response(), Some(InvokeResponse::ok(None)));
        assert!(ctx.invoke_response().is_none());
    }
}
