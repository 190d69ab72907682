//! User-closure leaf schemas.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{IssueKind, ValidationError};
use crate::path::JsonPath;
use crate::schema::effects::{CallError, Predicate};
use crate::schema::traits::{SchemaKind, SchemaLike};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// A leaf that accepts a value when a closure returns true.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let even = Schema::custom(|v| v.as_i64().is_some_and(|n| n % 2 == 0));
/// assert!(even.parse(&json!(4)).is_ok());
/// assert_eq!(even.parse(&json!(3)).unwrap_err().first().code(), "custom");
/// ```
#[derive(Clone)]
pub struct CustomSchema {
    predicate: Predicate,
    message: Option<String>,
}

impl CustomSchema {
    pub(crate) fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            message: None,
        }
    }

    /// Sets the message reported when the closure rejects a value.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn outcome(
        &self,
        outcome: Result<bool, CallError>,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let issue = match outcome {
            Ok(true) => return Validation::Success(value.clone()),
            Ok(false) => ctx.issue_with_message(
                IssueKind::custom(),
                path,
                Some(value),
                self.message.as_deref(),
            ),
            Err(CallError::Failed(reason)) => ctx.issue_with_message(
                IssueKind::Custom {
                    params: Some(serde_json::json!({ "reason": reason })),
                },
                path,
                Some(value),
                self.message.as_deref(),
            ),
            Err(CallError::Async) => ctx.issue(IssueKind::AsyncUnsupported, path, Some(value)),
        };
        Validation::Failure(ValidationError::single(issue))
    }
}

impl SchemaLike for CustomSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let outcome = self.predicate.test("custom", value);
        self.outcome(outcome, value, path, ctx)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let outcome = self
                .predicate
                .test_async("custom", value)
                .await
                .map_err(CallError::Failed);
            self.outcome(outcome, value, path, ctx)
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Custom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_panicking_closure_is_reported() {
        let schema = CustomSchema::new(Predicate::sync(|_| panic!("boom")));
        let err = schema
            .validate(&json!(1), &JsonPath::root(), &ValidationContext::new())
            .into_result()
            .unwrap_err();
        assert_eq!(
            err.first().kind,
            IssueKind::Custom {
                params: Some(json!({"reason": "boom"}))
            }
        );
    }

    #[test]
    fn test_async_closure_needs_async_entry() {
        let schema =
            CustomSchema::new(Predicate::asynchronous(|v: Value| async move { v.is_string() }));
        let ctx = ValidationContext::new();
        let sync = schema.validate(&json!("x"), &JsonPath::root(), &ctx);
        assert_eq!(sync.into_result().unwrap_err().first().code(), "async_unsupported");

        let value = json!("x");
        let path = JsonPath::root();
        let result = futures::executor::block_on(schema.validate_async(&value, &path, &ctx));
        assert!(result.is_success());
    }
}
