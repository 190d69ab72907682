//! Fixed-position array validation.

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{finish, Issue, ValidationError};
use crate::path::JsonPath;
use crate::schema::array::length_issue;
use crate::schema::traits::{type_mismatch, DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// A schema for arrays whose positions each have their own schema.
///
/// Trailing positions whose schema accepts absence may be left out. Without a
/// `rest` schema, extra elements are rejected.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt, SchemaLike};
/// use serde_json::json;
///
/// let point = Schema::tuple(vec![
///     Schema::number().into_shared(),
///     Schema::number().into_shared(),
///     Schema::string().optional().into_shared(),
/// ]);
///
/// assert!(point.parse(&json!([1, 2])).is_ok());
/// assert!(point.parse(&json!([1, 2, "label"])).is_ok());
/// assert_eq!(point.parse(&json!([1])).unwrap_err().first().code(), "too_small");
/// assert_eq!(point.parse(&json!([1, 2, "a", 4])).unwrap_err().first().code(), "too_big");
/// ```
#[derive(Clone)]
pub struct TupleSchema {
    items: Vec<DynSchema>,
    rest: Option<DynSchema>,
    type_error_message: Option<String>,
}

impl TupleSchema {
    pub(crate) fn new(items: Vec<DynSchema>) -> Self {
        Self {
            items,
            rest: None,
            type_error_message: None,
        }
    }

    /// Validates elements past the fixed positions against `schema`.
    pub fn rest<S>(mut self, schema: S) -> Self
    where
        S: SchemaLike + 'static,
    {
        self.rest = Some(schema.into_shared());
        self
    }

    /// Sets the message used when the input is not an array.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.type_error_message = Some(message.into());
        self
    }

    /// Number of leading positions that must be present.
    fn required_len(&self) -> usize {
        self.items
            .iter()
            .rposition(|item| !item.accepts_missing())
            .map_or(0, |last| last + 1)
    }

    fn length_check(
        &self,
        value: &Value,
        len: usize,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Option<Issue> {
        let max = if self.rest.is_some() {
            None
        } else {
            Some(self.items.len())
        };
        length_issue(len, Some(self.required_len()), max, value, path, ctx, None)
    }

    fn assemble(
        &self,
        positional: Vec<ValidationResult<Option<Value>>>,
        rest: Vec<ValidationResult<Value>>,
    ) -> ValidationResult<Value> {
        let mut issues = Vec::new();
        let mut slots: Vec<Option<Value>> = Vec::with_capacity(positional.len() + rest.len());

        for result in positional {
            match result {
                Validation::Success(slot) => slots.push(slot),
                Validation::Failure(err) => {
                    issues.extend(err);
                    slots.push(None);
                }
            }
        }
        for result in rest {
            match result {
                Validation::Success(v) => slots.push(Some(v)),
                Validation::Failure(err) => issues.extend(err),
            }
        }

        while matches!(slots.last(), Some(None)) {
            slots.pop();
        }
        let items = slots
            .into_iter()
            .map(|slot| slot.unwrap_or(Value::Null))
            .collect();
        finish(Value::Array(items), issues)
    }

    fn type_error<T>(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        type_mismatch("tuple", value, path, ctx, self.type_error_message.as_deref())
    }
}

impl SchemaLike for TupleSchema {
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
        if let Some(issue) = self.length_check(value, arr.len(), path, ctx) {
            return Validation::Failure(ValidationError::single(issue));
        }

        let positional = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let item_path = path.push_index(index);
                match arr.get(index) {
                    Some(v) => match item.validate(v, &item_path, ctx) {
                        Validation::Success(out) => Validation::Success(Some(out)),
                        Validation::Failure(err) => Validation::Failure(err),
                    },
                    None => item.validate_missing(&item_path, ctx),
                }
            })
            .collect();

        let rest = match &self.rest {
            Some(schema) => arr
                .iter()
                .enumerate()
                .skip(self.items.len())
                .map(|(index, v)| schema.validate(v, &path.push_index(index), ctx))
                .collect(),
            None => Vec::new(),
        };

        self.assemble(positional, rest)
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
            if let Some(issue) = self.length_check(value, arr.len(), path, ctx) {
                return Validation::Failure(ValidationError::single(issue));
            }

            let pending = self.items.iter().enumerate().map(|(index, item)| async move {
                let item_path = path.push_index(index);
                match arr.get(index) {
                    Some(v) => match item.validate_async(v, &item_path, ctx).await {
                        Validation::Success(out) => Validation::Success(Some(out)),
                        Validation::Failure(err) => Validation::Failure(err),
                    },
                    None => item.validate_missing_async(&item_path, ctx).await,
                }
            });
            let positional = future::join_all(pending).await;

            let rest = match &self.rest {
                Some(schema) => {
                    future::join_all(arr.iter().enumerate().skip(self.items.len()).map(
                        |(index, v)| async move {
                            let item_path = path.push_index(index);
                            schema.validate_async(v, &item_path, ctx).await
                        },
                    ))
                    .await
                }
                None => Vec::new(),
            };

            self.assemble(positional, rest)
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Tuple
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Array)
    }
}
