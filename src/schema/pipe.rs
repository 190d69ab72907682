//! Sequential composition.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::path::JsonPath;
use crate::schema::traits::{DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::TypeSet;
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// Feeds the output of one schema into another.
///
/// Decoding runs `first` then `second`; encoding runs them in reverse. An
/// absent result from the first stage is handed on as absent.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let length = Schema::string()
///     .map(|v| json!(v.as_str().map_or(0, |s| s.chars().count())))
///     .pipe(Schema::number().max(5.0));
///
/// assert_eq!(length.parse(&json!("abc")).unwrap(), json!(3));
/// assert!(length.parse(&json!("abcdefg")).is_err());
/// ```
#[derive(Clone)]
pub struct PipeSchema {
    first: DynSchema,
    second: DynSchema,
}

impl PipeSchema {
    pub(crate) fn new(first: DynSchema, second: DynSchema) -> Self {
        Self { first, second }
    }

    /// Stages in the order they run for `ctx`.
    fn stages(&self, ctx: &ValidationContext) -> (&DynSchema, &DynSchema) {
        if ctx.is_encoding() {
            (&self.second, &self.first)
        } else {
            (&self.first, &self.second)
        }
    }
}

impl SchemaLike for PipeSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let (head, tail) = self.stages(ctx);
        match head.validate(value, path, ctx) {
            Validation::Success(output) => tail.validate(&output, path, ctx),
            failure => failure,
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        let (head, tail) = self.stages(ctx);
        match head.validate_missing(path, ctx) {
            Validation::Success(Some(output)) => match tail.validate(&output, path, ctx) {
                Validation::Success(value) => Validation::Success(Some(value)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            Validation::Success(None) => tail.validate_missing(path, ctx),
            Validation::Failure(err) => Validation::Failure(err),
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let (head, tail) = self.stages(ctx);
            match head.validate_async(value, path, ctx).await {
                Validation::Success(output) => tail.validate_async(&output, path, ctx).await,
                failure => failure,
            }
        }
        .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        async move {
            let (head, tail) = self.stages(ctx);
            match head.validate_missing_async(path, ctx).await {
                Validation::Success(Some(output)) => {
                    match tail.validate_async(&output, path, ctx).await {
                        Validation::Success(value) => Validation::Success(Some(value)),
                        Validation::Failure(err) => Validation::Failure(err),
                    }
                }
                Validation::Success(None) => tail.validate_missing_async(path, ctx).await,
                Validation::Failure(err) => Validation::Failure(err),
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Pipe
    }

    fn accepts(&self) -> TypeSet {
        self.first.accepts()
    }

    fn accepts_missing(&self) -> bool {
        self.first.accepts_missing()
    }
}
