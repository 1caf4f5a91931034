//! Ordered registry of link-unfurling handlers.
//!
//! Handlers are checked in registration order and the first one whose
//! trigger matches wins:
//!
//! ```rust,ignore
//! let registry = HandlerRegistry::new()
//!     .with(main_handler.boxed())
//!     .with(dev_handler.boxed());
//!
//! let middleware = LinkUnfurlingMiddleware::new(registry);
//! ```
//!
//! The registry is assembled during startup and then frozen behind an
//! `Arc`, so dispatch reads it without locking.

use crate::handler::BoxedLinkHandler;

/// An append-only, ordered list of handlers.
///
/// Insertion order is priority order. Duplicates are allowed.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: Vec<BoxedLinkHandler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler.
    pub fn register(&mut self, handler: BoxedLinkHandler) {
        self.handlers.push(handler);
    }

    /// Appends a handler if one is given. `None` is ignored.
    pub fn register_optional(&mut self, handler: Option<BoxedLinkHandler>) {
        if let Some(handler) = handler {
            self.register(handler);
        }
    }

    /// Appends every present handler in iteration order.
    pub fn register_many<I>(&mut self, handlers: I)
    where
        I: IntoIterator<Item = Option<BoxedLinkHandler>>,
    {
        for handler in handlers {
            self.register_optional(handler);
        }
    }

    /// Appends a handler (builder pattern).
    pub fn with(mut self, handler: BoxedLinkHandler) -> Self {
        self.register(handler);
        self
    }

    /// Iterates handlers in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedLinkHandler> {
        self.handlers.iter()
    }

    /// Returns the number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handler names in priority order.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl Extend<BoxedLinkHandler> for HandlerRegistry {
    fn extend<I: IntoIterator<Item = BoxedLinkHandler>>(&mut self, iter: I) {
        self.handlers.extend(iter);
    }
}

impl FromIterator<BoxedLinkHandler> for HandlerRegistry {
    fn from_iter<I: IntoIterator<Item = BoxedLinkHandler>>(iter: I) -> Self {
        Self {
            handlers: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a HandlerRegistry {
    type Item = &'a BoxedLinkHandler;
    type IntoIter = std::slice::Iter<'a, BoxedLinkHandler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.iter()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
