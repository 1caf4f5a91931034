//! Trigger matching.
//!
//! A handler claims URLs through a [`TriggerSpec`]: an ordered list of
//! [`TriggerPattern`]s. Each pattern is either
//!
//! - a **literal** string, interpreted as a case-insensitive regular
//!   expression that only answers *match* or *no match*, or
//! - a native [`Regex`], which additionally reports its capture groups.
//!
//! Patterns are tried in list order and the first one that matches decides
//! the result. There is no best-match or union semantics.
//!
//! ```rust,ignore
//! use regex::Regex;
//!
//! let spec = TriggerSpec::from([".*\\.contoso\\.com/docs/.*"])
//!     .or(Regex::new(r"https://(\w+)\.example\.org/(\d+)")?);
//!
//! match spec.should_trigger("https://blog.example.org/42")? {
//!     MatchResult::Captured(m) => assert_eq!(m.get(2), Some("42")),
//!     _ => unreachable!(),
//! }
//! ```
//!
//! Literal patterns are compiled on first use and cached. A literal that is
//! not a valid expression reports [`TriggerError::InvalidPattern`] every time
//! it is evaluated against non-empty text.

use std::sync::OnceLock;

use regex::{Captures, Regex, RegexBuilder};
use tracing::trace;

use crate::error::{TriggerError, TriggerResult};

// ============================================================================
// Match results
// ============================================================================

/// Capture groups produced by a native regular expression.
///
/// Group 0 is the whole match; later entries follow the expression's
/// parenthesized groups. Groups that did not take part in the match are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMatches {
    groups: Vec<Option<String>>,
    names: Vec<Option<String>>,
}

impl LinkMatches {
    fn from_captures(regex: &Regex, captures: &Captures<'_>) -> Self {
        let groups = captures
            .iter()
            .map(|group| group.map(|m| m.as_str().to_string()))
            .collect();
        let names = regex
            .capture_names()
            .map(|name| name.map(str::to_string))
            .collect();
        Self { groups, names }
    }

    /// Returns the text of the whole match.
    pub fn whole(&self) -> &str {
        self.get(0).unwrap_or_default()
    }

    /// Returns group `index`, if it participated in the match.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|group| group.as_deref())
    }

    /// Returns the named group `name`, if it participated in the match.
    pub fn name(&self, name: &str) -> Option<&str> {
        let index = self
            .names
            .iter()
            .position(|candidate| candidate.as_deref() == Some(name))?;
        self.get(index)
    }

    /// Returns the number of groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `false` for any value produced by a match, which always holds the
    /// whole-match group.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over the groups in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.groups.iter().map(|group| group.as_deref())
    }
}

/// Outcome of evaluating a pattern or a spec against some text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// Nothing matched.
    NoMatch,
    /// A literal pattern matched. Literals never report captures.
    Matched,
    /// A native regular expression matched.
    Captured(LinkMatches),
}

impl MatchResult {
    /// Returns `true` unless this is [`MatchResult::NoMatch`].
    pub fn is_match(&self) -> bool {
        !matches!(self, Self::NoMatch)
    }

    /// Returns the captures, if the match produced any.
    pub fn matches(&self) -> Option<&LinkMatches> {
        match self {
            Self::Captured(matches) => Some(matches),
            _ => None,
        }
    }

    /// Consumes the result, returning the captures if any.
    pub fn into_matches(self) -> Option<LinkMatches> {
        match self {
            Self::Captured(matches) => Some(matches),
            _ => None,
        }
    }
}

// ============================================================================
// Patterns
// ============================================================================

/// A literal trigger string with its lazily compiled expression.
#[derive(Debug, Clone)]
pub struct LiteralPattern {
    source: String,
    compiled: OnceLock<Result<Regex, regex::Error>>,
}

impl LiteralPattern {
    /// Wraps `source` without compiling it.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: OnceLock::new(),
        }
    }

    /// Returns the pattern text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns the compiled case-insensitive expression.
    pub fn regex(&self) -> TriggerResult<&Regex> {
        self.compiled
            .get_or_init(|| {
                RegexBuilder::new(&self.source)
                    .case_insensitive(true)
                    .build()
            })
            .as_ref()
            .map_err(|source| TriggerError::InvalidPattern {
                pattern: self.source.clone(),
                source: source.clone(),
            })
    }
}

/// One entry of a [`TriggerSpec`].
#[derive(Debug, Clone)]
pub enum TriggerPattern {
    /// A string treated as a case-insensitive regular expression.
    Literal(LiteralPattern),
    /// A native regular expression, matched as written.
    Pattern(Regex),
}

impl TriggerPattern {
    /// Creates a literal pattern.
    pub fn literal(source: impl Into<String>) -> Self {
        Self::Literal(LiteralPattern::new(source))
    }

    /// Wraps a native regular expression.
    pub fn regex(regex: Regex) -> Self {
        Self::Pattern(regex)
    }

    /// Returns the pattern's source text.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(literal) => literal.as_str(),
            Self::Pattern(regex) => regex.as_str(),
        }
    }

    /// Compiles the pattern now, reporting an invalid literal.
    pub fn validate(&self) -> TriggerResult<()> {
        match self {
            Self::Literal(literal) => literal.regex().map(|_| ()),
            Self::Pattern(_) => Ok(()),
        }
    }

    /// Evaluates this pattern against `text`. See [`match_pattern`].
    pub fn evaluate(&self, text: &str) -> TriggerResult<MatchResult> {
        match_pattern(self, text)
    }
}

impl From<&str> for TriggerPattern {
    fn from(source: &str) -> Self {
        Self::literal(source)
    }
}

impl From<String> for TriggerPattern {
    fn from(source: String) -> Self {
        Self::literal(source)
    }
}

impl From<Regex> for TriggerPattern {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

// ============================================================================
// Specs
// ============================================================================

/// The pattern or patterns a handler declares to claim a URL.
///
/// An empty spec never matches.
#[derive(Debug, Clone, Default)]
pub struct TriggerSpec {
    patterns: Vec<TriggerPattern>,
}

impl TriggerSpec {
    /// Creates an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a spec with a single pattern.
    pub fn one(pattern: impl Into<TriggerPattern>) -> Self {
        Self {
            patterns: vec![pattern.into()],
        }
    }

    /// Creates a spec from an ordered list of patterns.
    pub fn any_of<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<TriggerPattern>,
    {
        patterns.into_iter().collect()
    }

    /// Appends a pattern, tried after the existing ones.
    pub fn or(mut self, pattern: impl Into<TriggerPattern>) -> Self {
        self.patterns.push(pattern.into());
        self
    }

    /// Returns the patterns in evaluation order.
    pub fn patterns(&self) -> &[TriggerPattern] {
        &self.patterns
    }

    /// Returns the number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns `true` if the spec holds no pattern.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compiles every literal, reporting the first invalid one.
    pub fn validate(&self) -> TriggerResult<()> {
        self.patterns.iter().try_for_each(TriggerPattern::validate)
    }

    /// Evaluates the spec against `text`. See [`should_trigger`].
    pub fn should_trigger(&self, text: &str) -> TriggerResult<MatchResult> {
        should_trigger(self, text)
    }
}

impl From<TriggerPattern> for TriggerSpec {
    fn from(pattern: TriggerPattern) -> Self {
        Self::one(pattern)
    }
}

impl From<&str> for TriggerSpec {
    fn from(source: &str) -> Self {
        Self::one(source)
    }
}

impl From<String> for TriggerSpec {
    fn from(source: String) -> Self {
        Self::one(source)
    }
}

impl From<Regex> for TriggerSpec {
    fn from(regex: Regex) -> Self {
        Self::one(regex)
    }
}

impl<P: Into<TriggerPattern>> From<Vec<P>> for TriggerSpec {
    fn from(patterns: Vec<P>) -> Self {
        Self::any_of(patterns)
    }
}

impl<P: Into<TriggerPattern>, const N: usize> From<[P; N]> for TriggerSpec {
    fn from(patterns: [P; N]) -> Self {
        Self::any_of(patterns)
    }
}

impl<P: Into<TriggerPattern>> FromIterator<P> for TriggerSpec {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// Matcher functions
// ============================================================================

/// Evaluates a single pattern against `text`.
///
/// - Empty `text` never matches, and no compilation is attempted.
/// - A literal tests its case-insensitive expression and answers
///   [`MatchResult::Matched`] even if it contains groups.
/// - A native expression answers [`MatchResult::Captured`] with the groups of
///   its leftmost match.
pub fn match_pattern(pattern: &TriggerPattern, text: &str) -> TriggerResult<MatchResult> {
    if text.is_empty() {
        return Ok(MatchResult::NoMatch);
    }

    let result = match pattern {
        TriggerPattern::Literal(literal) => {
            if literal.regex()?.is_match(text) {
                MatchResult::Matched
            } else {
                MatchResult::NoMatch
            }
        }
        TriggerPattern::Pattern(regex) => match regex.captures(text) {
            Some(captures) => MatchResult::Captured(LinkMatches::from_captures(regex, &captures)),
            None => MatchResult::NoMatch,
        },
    };

    trace!(
        pattern = pattern.as_str(),
        matched = result.is_match(),
        "Evaluated trigger pattern"
    );

    Ok(result)
}

/// Evaluates `spec` against `text`, returning the first pattern that matches.
///
/// Evaluation stops at the first match, so an invalid literal placed after a
/// matching pattern is never compiled.
pub fn should_trigger(spec: &TriggerSpec, text: &str) -> TriggerResult<MatchResult> {
    for pattern in spec.patterns() {
        let result = match_pattern(pattern, text)?;
        if result.is_match() {
            return Ok(result);
        }
    }

    Ok(MatchResult::NoMatch)
}
