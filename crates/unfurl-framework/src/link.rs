//! The matched link handed to a handler.

use crate::trigger::{LinkMatches, MatchResult};

/// A URL that triggered a handler.
///
/// Built fresh for every query-link turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The URL exactly as received.
    pub link: String,
    /// Capture groups, present only when a native regular expression matched.
    pub matches: Option<LinkMatches>,
}

impl Link {
    /// Creates a link without captures.
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            matches: None,
        }
    }

    /// Creates a link from the result that selected the handler.
    pub fn from_match(link: impl Into<String>, result: MatchResult) -> Self {
        Self {
            link: link.into(),
            matches: result.into_matches(),
        }
    }

    /// Returns the URL.
    pub fn as_str(&self) -> &str {
        &self.link
    }

    /// Shorthand for capture group `index`.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.matches.as_ref().and_then(|m| m.get(index))
    }
}
