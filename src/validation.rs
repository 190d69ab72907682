//! Validation context.
//!
//! A [`ValidationContext`] is passed down every validation call. It carries the
//! message resolver, the traversal direction (decode or encode), the recursion
//! depth guard for lazy schemas and whether offending inputs are copied into
//! issues.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use stillwater::Validation;

use crate::error::{Issue, IssueKind, ValidationError};
use crate::locale::{default_resolver, MessageResolver};
use crate::path::JsonPath;
use crate::ValidationResult;

/// Default limit on nested lazy-schema evaluations.
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// Which way a traversal runs.
///
/// Most validators behave the same in both directions. Codecs and pipes
/// reverse their order when encoding, and plain transforms refuse to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// Input to output (`parse`, `decode`).
    #[default]
    Decode,
    /// Output back to input (`encode`).
    Encode,
}

/// Per-call validation configuration.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt, ValidationContext, IssueKind};
/// use serde_json::json;
///
/// let ctx = ValidationContext::new()
///     .with_resolver(|kind: &IssueKind| match kind {
///         IssueKind::InvalidType { .. } => Some("wrong type".to_string()),
///         _ => None,
///     })
///     .with_report_input(true);
///
/// let err = Schema::string().parse_with(&json!(5), &ctx).unwrap_err();
/// assert_eq!(err.first().message, "wrong type");
/// assert_eq!(err.first().input, Some(json!(5)));
/// ```
#[derive(Clone)]
pub struct ValidationContext {
    resolver: Arc<dyn MessageResolver>,
    direction: Direction,
    report_input: bool,
    depth: usize,
    max_depth: usize,
}

impl ValidationContext {
    /// Creates a context using the current process-wide default resolver.
    pub fn new() -> Self {
        Self {
            resolver: default_resolver(),
            direction: Direction::Decode,
            report_input: false,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Uses `resolver` for every message produced under this context.
    pub fn with_resolver<R: MessageResolver + 'static>(mut self, resolver: R) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Uses an already shared resolver.
    pub fn with_shared_resolver(mut self, resolver: Arc<dyn MessageResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the maximum nesting of lazy schemas.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Copies offending inputs into issues when enabled.
    pub fn with_report_input(mut self, report_input: bool) -> Self {
        self.report_input = report_input;
        self
    }

    /// Sets the traversal direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Returns the traversal direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns true when running in the encode direction.
    pub fn is_encoding(&self) -> bool {
        self.direction == Direction::Encode
    }

    /// Returns the current lazy nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the maximum allowed depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Returns a context one level deeper.
    pub fn increment_depth(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            depth: self.depth + 1,
            ..*self
        }
    }

    /// Returns true if the depth limit has been passed.
    pub fn depth_exceeded(&self) -> bool {
        self.depth > self.max_depth
    }

    /// Returns the resolver in use.
    pub fn resolver(&self) -> &Arc<dyn MessageResolver> {
        &self.resolver
    }

    /// Resolves the message for `kind`.
    pub fn message(&self, kind: &IssueKind) -> String {
        self.resolver
            .resolve(kind)
            .unwrap_or_else(|| kind.fallback_message().to_string())
    }

    /// Builds an issue with a resolved message.
    pub fn issue(&self, kind: IssueKind, path: &JsonPath, input: Option<&Value>) -> Issue {
        self.issue_with_message(kind, path, input, None)
    }

    /// Builds an issue, preferring `message` over the resolver when given.
    pub fn issue_with_message(
        &self,
        kind: IssueKind,
        path: &JsonPath,
        input: Option<&Value>,
        message: Option<&str>,
    ) -> Issue {
        let text = match message {
            Some(text) => text.to_string(),
            None => self.message(&kind),
        };
        let issue = Issue::new(kind, path.clone(), text);
        match input {
            Some(value) if self.report_input => issue.with_input(value.clone()),
            _ => issue,
        }
    }

    /// Shorthand for a failure holding one issue.
    pub fn fail<T>(
        &self,
        kind: IssueKind,
        path: &JsonPath,
        input: Option<&Value>,
    ) -> ValidationResult<T> {
        Validation::Failure(ValidationError::single(self.issue(kind, path, input)))
    }
}

impl Default for ValidationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationContext")
            .field("direction", &self.direction)
            .field("report_input", &self.report_input)
            .field("depth", &self.depth)
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
