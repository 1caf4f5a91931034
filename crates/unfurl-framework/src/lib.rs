//! # Unfurl Framework
//!
//! Link-unfurling components built on top of the core turn pipeline.
//!
//! This layer provides:
//! - Trigger patterns (case-insensitive literals, native regexes, or lists)
//!   and the matcher functions that evaluate them
//! - The [`LinkUnfurlingHandler`] trait and closure handlers
//! - An ordered [`HandlerRegistry`] with first-match priority
//! - [`LinkUnfurlingMiddleware`], the dispatch stage for query-link invokes
//! - Messaging-extension response payloads and the [`process_response`]
//!   helper for ordinary replies

pub mod error;
pub mod handler;
pub mod link;
pub mod middleware;
pub mod registry;
pub mod reply;
pub mod response;
pub mod trigger;

pub use error::{LinkUnfurlError, TriggerError, TriggerResult};
pub use handler::{
    BoxedLinkHandler, HandlerResult, IntoUnfurlResponse, LinkHandlerFn, LinkUnfurlingHandler,
    link_handler,
};
pub use link::Link;
pub use middleware::{LinkUnfurlingMiddleware, QUERY_LINK_INVOKE};
pub use registry::HandlerRegistry;
pub use reply::{Reply, process_response};
pub use response::{
    Attachment, AttachmentLayout, MessagingExtensionResponse, MessagingExtensionResult,
};
pub use trigger::{
    LinkMatches, LiteralPattern, MatchResult, TriggerPattern, TriggerSpec, match_pattern,
    should_trigger,
};
