//! Array schema validation.
//!
//! This module provides [`ArraySchema`] for validating arrays with an item
//! schema and length constraints.

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{finish, Issue, IssueKind, SizeOrigin};
use crate::path::JsonPath;
use crate::schema::traits::{type_mismatch, DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// A length constraint applied to array values.
#[derive(Clone)]
enum ArrayConstraint {
    MinLength {
        min: usize,
        message: Option<String>,
    },
    MaxLength {
        max: usize,
        message: Option<String>,
    },
}

impl ArrayConstraint {
    fn message_mut(&mut self) -> &mut Option<String> {
        match self {
            ArrayConstraint::MinLength { message, .. }
            | ArrayConstraint::MaxLength { message, .. } => message,
        }
    }
}

/// Checks array length bounds.
pub(crate) fn length_issue(
    len: usize,
    min: Option<usize>,
    max: Option<usize>,
    input: &Value,
    path: &JsonPath,
    ctx: &ValidationContext,
    message: Option<&str>,
) -> Option<Issue> {
    let kind = match (min, max) {
        (Some(min), _) if len < min => IssueKind::TooSmall {
            origin: SizeOrigin::Array,
            minimum: min as f64,
            inclusive: true,
        },
        (_, Some(max)) if len > max => IssueKind::TooBig {
            origin: SizeOrigin::Array,
            maximum: max as f64,
            inclusive: true,
        },
        _ => return None,
    };
    Some(ctx.issue_with_message(kind, path, Some(input), message))
}

/// A schema for validating array values.
///
/// `ArraySchema` validates that values are arrays, validates each item against
/// an item schema, and applies length constraints. All validation errors are
/// accumulated rather than short-circuiting on the first failure.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let schema = Schema::array(Schema::string().min_len(1))
///     .non_empty()
///     .max_len(10);
///
/// assert!(schema.parse(&json!(["hello", "world"])).is_ok());
///
/// let err = schema.parse(&json!(["ok", ""])).unwrap_err();
/// assert_eq!(err.first().path.to_string(), "[1]");
/// ```
#[derive(Clone)]
pub struct ArraySchema {
    item: DynSchema,
    constraints: Vec<ArrayConstraint>,
    type_error_message: Option<String>,
}

impl ArraySchema {
    /// Creates a new array schema with the given item schema.
    pub fn new(item: DynSchema) -> Self {
        Self {
            item,
            constraints: Vec::new(),
            type_error_message: None,
        }
    }

    /// The schema every item is validated against.
    pub fn element(&self) -> &DynSchema {
        &self.item
    }

    /// The array must have at least `min` items.
    pub fn min_len(mut self, min: usize) -> Self {
        self.constraints
            .push(ArrayConstraint::MinLength { min, message: None });
        self
    }

    /// The array must have at most `max` items.
    pub fn max_len(mut self, max: usize) -> Self {
        self.constraints
            .push(ArrayConstraint::MaxLength { max, message: None });
        self
    }

    /// The array must have exactly `len` items.
    pub fn length(self, len: usize) -> Self {
        self.min_len(len).max_len(len)
    }

    /// Equivalent to `.min_len(1)`.
    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    /// Sets a custom error message for the most recent constraint, or for the
    /// type error when no constraint has been added.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        match self.constraints.last_mut() {
            Some(last) => *last.message_mut() = Some(message.into()),
            None => self.type_error_message = Some(message.into()),
        }
        self
    }

    fn length_issues(
        &self,
        value: &Value,
        len: usize,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Vec<Issue> {
        self.constraints
            .iter()
            .filter_map(|constraint| match constraint {
                ArrayConstraint::MinLength { min, message } => {
                    length_issue(len, Some(*min), None, value, path, ctx, message.as_deref())
                }
                ArrayConstraint::MaxLength { max, message } => {
                    length_issue(len, None, Some(*max), value, path, ctx, message.as_deref())
                }
            })
            .collect()
    }

    fn collect(
        &self,
        results: impl IntoIterator<Item = ValidationResult<Value>>,
        mut issues: Vec<Issue>,
        capacity: usize,
    ) -> ValidationResult<Value> {
        let mut items = Vec::with_capacity(capacity);
        for result in results {
            match result {
                Validation::Success(v) => items.push(v),
                Validation::Failure(e) => issues.extend(e),
            }
        }
        finish(Value::Array(items), issues)
    }

    fn type_error<T>(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        type_mismatch("array", value, path, ctx, self.type_error_message.as_deref())
    }
}

impl SchemaLike for ArraySchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let arr = match value.as_array() {
            Some(a) => a,
            None => return self.type_error(value, path, ctx),
        };

        let issues = self.length_issues(value, arr.len(), path, ctx);
        let results = arr
            .iter()
            .enumerate()
            .map(|(index, item)| self.item.validate(item, &path.push_index(index), ctx));
        self.collect(results, issues, arr.len())
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let arr = match value.as_array() {
                Some(a) => a,
                None => return self.type_error(value, path, ctx),
            };

            let issues = self.length_issues(value, arr.len(), path, ctx);
            let paths: Vec<JsonPath> = (0..arr.len()).map(|i| path.push_index(i)).collect();
            let results = future::join_all(
                arr.iter()
                    .zip(&paths)
                    .map(|(item, item_path)| self.item.validate_async(item, item_path, ctx)),
            )
            .await;
            self.collect(results, issues, arr.len())
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Array
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Array)
    }
}
