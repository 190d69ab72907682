//! Derived views of a [`ValidationError`].
//!
//! Every view is a pure function of the error's issue list: calling one twice
//! yields identical output.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::issue::{Issue, IssueKind};
use crate::error::validation_error::ValidationError;
use crate::path::{JsonPath, PathSegment};

/// A tree of messages keyed by path.
///
/// Issues at a node's own path land in `errors`; string segments descend into
/// `properties`, integer segments into `items`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ErrorTree {
    /// Messages for issues located exactly at this node.
    pub errors: Vec<String>,
    /// Children reached through a key segment.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, ErrorTree>,
    /// Children reached through an index segment.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub items: BTreeMap<usize, ErrorTree>,
}

impl ErrorTree {
    /// Returns the child for a key segment, if any issue reached it.
    pub fn property(&self, name: &str) -> Option<&ErrorTree> {
        self.properties.get(name)
    }

    /// Returns the child for an index segment, if any issue reached it.
    pub fn item(&self, index: usize) -> Option<&ErrorTree> {
        self.items.get(&index)
    }

    fn insert(&mut self, path: &[PathSegment], message: &str) {
        match path.split_first() {
            None => self.errors.push(message.to_string()),
            Some((PathSegment::Field(name), rest)) => self
                .properties
                .entry(name.clone())
                .or_default()
                .insert(rest, message),
            Some((PathSegment::Index(idx), rest)) => {
                self.items.entry(*idx).or_default().insert(rest, message)
            }
        }
    }
}

/// Issues split into root-level and per-field messages.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedError {
    /// Messages of issues with an empty path.
    pub form_errors: Vec<String>,
    /// Messages keyed by the first path segment of each issue.
    pub field_errors: IndexMap<String, Vec<String>>,
}

/// Issues nested inside an aggregate issue (union members, record keys).
fn nested_issues(issue: &Issue) -> Option<Vec<&Issue>> {
    match &issue.kind {
        IssueKind::InvalidUnion { errors, .. } if !errors.is_empty() => {
            Some(errors.iter().flatten().collect())
        }
        IssueKind::InvalidKey { issues } if !issues.is_empty() => Some(issues.iter().collect()),
        _ => None,
    }
}

fn visit_leaves<'a>(issues: impl IntoIterator<Item = &'a Issue>, visit: &mut dyn FnMut(&'a Issue)) {
    for issue in issues {
        match nested_issues(issue) {
            Some(nested) => visit_leaves(nested, visit),
            None => visit(issue),
        }
    }
}

/// Builds an [`ErrorTree`] from an error.
///
/// Aggregate issues (`invalid_union`, `invalid_key`) contribute their member
/// issues rather than their own summary message.
pub fn treeify(error: &ValidationError) -> ErrorTree {
    let mut tree = ErrorTree::default();
    visit_leaves(error.iter(), &mut |issue| {
        tree.insert(issue.path.as_slice(), &issue.message)
    });
    tree
}

/// Splits an error into form-level and first-segment field messages.
pub fn flatten(error: &ValidationError) -> FlattenedError {
    let mut flattened = FlattenedError::default();
    for issue in error.iter() {
        match issue.path.first() {
            None => flattened.form_errors.push(issue.message.clone()),
            Some(segment) => flattened
                .field_errors
                .entry(segment.as_key())
                .or_default()
                .push(issue.message.clone()),
        }
    }
    flattened
}

/// Renders an error as plain text, one block per issue.
///
/// Each block is `✖ <message>`, followed by `  → at <path>` when the path is
/// not the root. Blocks are ordered by path depth, keeping issue order within
/// a depth.
///
/// # Example
///
/// ```rust
/// use inquest::{Issue, IssueKind, JsonPath, ValidationError};
///
/// let error = ValidationError::single(Issue::new(
///     IssueKind::custom(),
///     JsonPath::root().push_field("items").push_index(0).push_field("name"),
///     "Required",
/// ));
///
/// assert_eq!(inquest::prettify(&error), "✖ Required\n  → at items[0].name");
/// ```
pub fn prettify(error: &ValidationError) -> String {
    let mut issues: Vec<&Issue> = error.iter().collect();
    issues.sort_by_key(|issue| issue.path.len());

    let mut lines = Vec::with_capacity(issues.len() * 2);
    for issue in issues {
        lines.push(format!("✖ {}", issue.message));
        if !issue.path.is_root() {
            lines.push(format!("  → at {}", issue.path));
        }
    }
    lines.join("\n")
}

/// Builds the nested `_errors` view: every node is an object whose `_errors`
/// array holds the messages at that node.
///
/// A field named `_errors` cannot get a node of its own, so an issue at or
/// below such a field is reported in the enclosing node's `_errors`.
pub fn format_nested(error: &ValidationError) -> Value {
    let mut root = Map::new();
    root.insert("_errors".to_string(), Value::Array(Vec::new()));

    visit_leaves(error.iter(), &mut |issue| {
        let mut node = &mut root;
        for segment in issue.path.segments() {
            if matches!(segment, PathSegment::Field(name) if name == "_errors") {
                break;
            }
            let child = node
                .entry(segment.as_key())
                .or_insert_with(|| {
                    let mut fresh = Map::new();
                    fresh.insert("_errors".to_string(), Value::Array(Vec::new()));
                    Value::Object(fresh)
                });
            node = match child {
                Value::Object(map) => map,
                _ => return,
            };
        }
        if let Some(Value::Array(messages)) = node.get_mut("_errors") {
            messages.push(Value::String(issue.message.clone()));
        }
    });

    Value::Object(root)
}

/// Serializes the issue list as JSON.
pub fn to_json(error: &ValidationError) -> Value {
    let issues: Vec<&Issue> = error.iter().collect();
    serde_json::to_value(issues).unwrap_or(Value::Null)
}

impl ValidationError {
    /// See [`treeify`].
    pub fn treeify(&self) -> ErrorTree {
        treeify(self)
    }

    /// See [`flatten`].
    pub fn flatten(&self) -> FlattenedError {
        flatten(self)
    }

    /// See [`prettify`].
    pub fn prettify(&self) -> String {
        prettify(self)
    }

    /// See [`format_nested`].
    pub fn format_nested(&self) -> Value {
        format_nested(self)
    }

    /// See [`to_json`].
    pub fn to_json(&self) -> Value {
        to_json(self)
    }

    /// Returns all issues whose path starts with `prefix`.
    pub fn under(&self, prefix: &JsonPath) -> Vec<&Issue> {
        self.iter()
            .filter(|issue| issue.path.as_slice().starts_with(prefix.as_slice()))
            .collect()
    }
}
