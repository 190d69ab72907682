//! Validation against two schemas at once.

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use stillwater::{Semigroup, Validation};

use crate::error::IssueKind;
use crate::path::JsonPath;
use crate::schema::primitive::same_value;
use crate::schema::traits::{DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::TypeSet;
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// Merges two outputs produced from the same input.
///
/// Objects merge key-wise and recursively, arrays of equal length merge
/// element-wise, and anything else must be equal.
pub(crate) fn merge_values(a: &Value, b: &Value) -> Option<Value> {
    match (a, b) {
        _ if same_value(a, b) => Some(a.clone()),
        (Value::Object(left), Value::Object(right)) => {
            let mut merged = Map::new();
            for (key, lv) in left {
                let value = match right.get(key) {
                    Some(rv) => merge_values(lv, rv)?,
                    None => lv.clone(),
                };
                merged.insert(key.clone(), value);
            }
            for (key, rv) in right {
                if !left.contains_key(key) {
                    merged.insert(key.clone(), rv.clone());
                }
            }
            Some(Value::Object(merged))
        }
        (Value::Array(left), Value::Array(right)) if left.len() == right.len() => left
            .iter()
            .zip(right)
            .map(|(l, r)| merge_values(l, r))
            .collect::<Option<Vec<_>>>()
            .map(Value::Array),
        _ => None,
    }
}

/// Requires the input to satisfy both schemas and merges their outputs.
///
/// Failures of both sides are reported together.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let named = Schema::object().field("name", Schema::string()).passthrough();
/// let aged = Schema::object().field("age", Schema::number()).passthrough();
/// let person = Schema::intersection(named, aged);
///
/// let out = person.parse(&json!({"name": "Ada", "age": 36})).unwrap();
/// assert_eq!(out, json!({"name": "Ada", "age": 36}));
///
/// let err = person.parse(&json!({})).unwrap_err();
/// assert_eq!(err.len(), 2);
/// ```
#[derive(Clone)]
pub struct IntersectionSchema {
    left: DynSchema,
    right: DynSchema,
}

impl IntersectionSchema {
    pub(crate) fn new(left: DynSchema, right: DynSchema) -> Self {
        Self { left, right }
    }

    fn combine(
        left: ValidationResult<Value>,
        right: ValidationResult<Value>,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match (left, right) {
            (Validation::Success(l), Validation::Success(r)) => match merge_values(&l, &r) {
                Some(merged) => Validation::Success(merged),
                None => ctx.fail(IssueKind::InvalidIntersectionTypes, path, Some(value)),
            },
            (Validation::Failure(l), Validation::Failure(r)) => Validation::Failure(l.combine(r)),
            (Validation::Failure(err), _) | (_, Validation::Failure(err)) => {
                Validation::Failure(err)
            }
        }
    }

    fn combine_missing(
        left: ValidationResult<Option<Value>>,
        right: ValidationResult<Option<Value>>,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        match (left, right) {
            (Validation::Success(None), Validation::Success(None)) => Validation::Success(None),
            (Validation::Success(Some(l)), Validation::Success(Some(r))) => {
                match merge_values(&l, &r) {
                    Some(merged) => Validation::Success(Some(merged)),
                    None => ctx.fail(IssueKind::InvalidIntersectionTypes, path, None),
                }
            }
            (Validation::Success(_), Validation::Success(_)) => {
                ctx.fail(IssueKind::InvalidIntersectionTypes, path, None)
            }
            (Validation::Failure(l), Validation::Failure(r)) => Validation::Failure(l.combine(r)),
            (Validation::Failure(err), _) | (_, Validation::Failure(err)) => {
                Validation::Failure(err)
            }
        }
    }
}

impl SchemaLike for IntersectionSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let left = self.left.validate(value, path, ctx);
        let right = self.right.validate(value, path, ctx);
        Self::combine(left, right, value, path, ctx)
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        let left = self.left.validate_missing(path, ctx);
        let right = self.right.validate_missing(path, ctx);
        Self::combine_missing(left, right, path, ctx)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let (left, right) = future::join(
                self.left.validate_async(value, path, ctx),
                self.right.validate_async(value, path, ctx),
            )
            .await;
            Self::combine(left, right, value, path, ctx)
        }
        .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        async move {
            let (left, right) = future::join(
                self.left.validate_missing_async(path, ctx),
                self.right.validate_missing_async(path, ctx),
            )
            .await;
            Self::combine_missing(left, right, path, ctx)
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Intersection
    }

    fn accepts(&self) -> TypeSet {
        self.left.accepts().intersect(self.right.accepts())
    }

    fn accepts_missing(&self) -> bool {
        self.left.accepts_missing() && self.right.accepts_missing()
    }
}
