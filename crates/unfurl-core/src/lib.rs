//! # Unfurl Core
//!
//! The core building blocks of the Unfurl bot pipeline.
//!
//! - **Activity model**: the wire shape of inbound and outbound activities
//!   ([`Activity`], [`InvokeResponse`], [`AppBasedLinkQuery`])
//! - **Turn context**: per-turn state and the outbound side of a turn
//!   ([`TurnContext`])
//! - **Transport**: where outbound activities go ([`TurnTransport`])
//! - **Middleware chain**: ordered stages with a typed continuation
//!   ([`Middleware`], [`Next`], [`MiddlewareSet`])
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────────────┐     ┌────────────┐
//! │   Adapter   │────▶│ Middleware ─▶ Middleware │────▶│ Turn logic │
//! └─────────────┘     └──────────────────────────┘     └────────────┘
//!        ▲                        │
//!        └──── invoke response ───┘
//! ```

pub mod activity;
pub mod context;
pub mod error;
pub mod middleware;
pub mod transport;

pub use activity::{
    Activity, ActivityType, AppBasedLinkQuery, ChannelAccount, ConversationAccount,
    InvokeResponse, ResourceResponse,
};
pub use context::TurnContext;
pub use error::{BoxError, TransportError, TransportResult, TurnError, TurnResult};
pub use middleware::{BoxedMiddleware, Middleware, MiddlewareSet, Next, TurnLogic};
pub use transport::{BoxedTransport, MemoryTransport, TurnTransport};

/// Prelude for common imports.
pub mod prelude {
    pub use super::activity::*;
    pub use super::context::TurnContext;
    pub use super::error::{TurnError, TurnResult};
    pub use super::middleware::{Middleware, MiddlewareSet, Next, TurnLogic};
    pub use super::transport::{MemoryTransport, TurnTransport};
}
