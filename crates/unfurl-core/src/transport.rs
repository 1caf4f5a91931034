//! Outbound delivery.
//!
//! A [`TurnTransport`] is whatever carries activities back to the platform:
//! a connector REST client in production, a console writer in the demo, or
//! the in-memory [`MemoryTransport`] in tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use crate::activity::{Activity, ResourceResponse};
use crate::error::TransportResult;

/// Delivers outbound activities produced during a turn.
#[async_trait]
pub trait TurnTransport: Send + Sync {
    /// Sends the activities in order, returning one resource id per activity.
    async fn send_activities(
        &self,
        activities: Vec<Activity>,
    ) -> TransportResult<Vec<ResourceResponse>>;
}

/// Type alias for a shared transport.
pub type BoxedTransport = Arc<dyn TurnTransport>;

/// A transport that keeps every delivered activity in memory.
///
/// Cloning shares the underlying buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<Activity>>>,
    next_id: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Creates an empty transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every activity delivered so far.
    pub fn sent(&self) -> Vec<Activity> {
        self.sent.lock().clone()
    }

    /// Returns the number of delivered activities.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Removes and returns every delivered activity.
    pub fn drain(&self) -> Vec<Activity> {
        std::mem::take(&mut *self.sent.lock())
    }
}

#[async_trait]
impl TurnTransport for MemoryTransport {
    async fn send_activities(
        &self,
        activities: Vec<Activity>,
    ) -> TransportResult<Vec<ResourceResponse>> {
        let mut sent = self.sent.lock();
        let responses = activities
            .into_iter()
            .map(|activity| {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
                trace!(id = %id, activity_type = %activity.activity_type, "Buffered activity");
                sent.push(activity);
                ResourceResponse { id }
            })
            .collect();
        Ok(responses)
    }
}
