//! Deferred and self-referential schemas.

use std::sync::{Arc, OnceLock, Weak};

use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use stillwater::Validation;

use crate::error::{IssueKind, ValidationError};
use crate::path::JsonPath;
use crate::schema::effects::guarded;
use crate::schema::object::ObjectSchema;
use crate::schema::traits::{DynSchema, SchemaKind, SchemaLike};
use crate::validation::ValidationContext;
use crate::ValidationResult;

type Thunk = Arc<dyn Fn() -> DynSchema + Send + Sync>;
type Slot = OnceLock<DynSchema>;

#[derive(Clone)]
enum Source {
    /// Built by a thunk on first use and memoized.
    Thunk { init: Thunk, cell: Arc<Slot> },
    /// Owns the target of a recursive definition.
    Owner(Arc<DynSchema>),
    /// Refers back to the enclosing recursive definition.
    Handle(Weak<DynSchema>),
}

/// A schema resolved when it is first needed.
///
/// Each evaluation counts one level against the context's `max_depth`;
/// exceeding it reports `max_depth_exceeded` instead of recursing further.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// // A tree where every node has a name and child nodes.
/// let tree = Schema::recursive(|node| {
///     Schema::object()
///         .field("name", Schema::string())
///         .field("children", Schema::array(node))
/// });
///
/// let input = json!({"name": "root", "children": [{"name": "leaf", "children": []}]});
/// assert!(tree.safe_parse(&input).is_success());
///
/// let bad = json!({"name": "root", "children": [{"name": 1, "children": []}]});
/// let err = tree.parse(&bad).unwrap_err();
/// assert_eq!(err.first().path.to_string(), "children[0].name");
/// ```
#[derive(Clone)]
pub struct LazySchema {
    source: Source,
}

impl LazySchema {
    pub(crate) fn from_thunk<F>(init: F) -> Self
    where
        F: Fn() -> DynSchema + Send + Sync + 'static,
    {
        Self {
            source: Source::Thunk {
                init: Arc::new(init),
                cell: Arc::new(OnceLock::new()),
            },
        }
    }

    pub(crate) fn recursive<F>(build: F) -> Self
    where
        F: FnOnce(DynSchema) -> DynSchema,
    {
        let target = Arc::new_cyclic(|weak: &Weak<DynSchema>| {
            build(Arc::new(Self {
                source: Source::Handle(weak.clone()),
            }))
        });
        Self {
            source: Source::Owner(target),
        }
    }

    /// Returns true once the target schema exists.
    pub fn is_initialized(&self) -> bool {
        match &self.source {
            Source::Thunk { cell, .. } => cell.get().is_some(),
            Source::Owner(_) => true,
            Source::Handle(weak) => weak.strong_count() > 0,
        }
    }

    fn unresolved(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
        reason: &str,
    ) -> ValidationError {
        ValidationError::single(ctx.issue(
            IssueKind::Custom {
                params: Some(json!({ "reason": reason })),
            },
            path,
            None,
        ))
    }

    fn resolve(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Result<DynSchema, ValidationError> {
        match &self.source {
            Source::Thunk { init, cell } => {
                if let Some(schema) = cell.get() {
                    return Ok(schema.clone());
                }
                match guarded("lazy", || init()) {
                    Ok(schema) => {
                        tracing::trace!("lazy schema initialized");
                        Ok(cell.get_or_init(|| schema).clone())
                    }
                    Err(reason) => Err(self.unresolved(path, ctx, &reason)),
                }
            }
            Source::Owner(target) => Ok(DynSchema::clone(target)),
            Source::Handle(weak) => weak
                .upgrade()
                .map(|target| DynSchema::clone(&target))
                .ok_or_else(|| self.unresolved(path, ctx, "recursive schema is not available")),
        }
    }

    fn too_deep<T>(
        &self,
        path: &JsonPath,
        input: Option<&Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        ctx.fail(
            IssueKind::MaxDepthExceeded {
                max_depth: ctx.max_depth(),
            },
            path,
            input,
        )
    }
}

impl SchemaLike for LazySchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let deeper = ctx.increment_depth();
        if deeper.depth_exceeded() {
            return self.too_deep(path, Some(value), ctx);
        }
        match self.resolve(path, ctx) {
            Ok(schema) => schema.validate(value, path, &deeper),
            Err(err) => Validation::Failure(err),
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        let deeper = ctx.increment_depth();
        if deeper.depth_exceeded() {
            return self.too_deep(path, None, ctx);
        }
        match self.resolve(path, ctx) {
            Ok(schema) => schema.validate_missing(path, &deeper),
            Err(err) => Validation::Failure(err),
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let deeper = ctx.increment_depth();
            if deeper.depth_exceeded() {
                return self.too_deep(path, Some(value), ctx);
            }
            match self.resolve(path, ctx) {
                Ok(schema) => schema.validate_async(value, path, &deeper).await,
                Err(err) => Validation::Failure(err),
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
            let deeper = ctx.increment_depth();
            if deeper.depth_exceeded() {
                return self.too_deep(path, None, ctx);
            }
            match self.resolve(path, ctx) {
                Ok(schema) => schema.validate_missing_async(path, &deeper).await,
                Err(err) => Validation::Failure(err),
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Lazy
    }

    fn as_object(&self) -> Option<&ObjectSchema> {
        match &self.source {
            Source::Owner(target) => target.as_object(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::SchemaExt;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_thunk_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let schema = Schema::lazy(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Schema::string().into_shared()
        });

        assert!(!schema.is_initialized());
        assert!(schema.safe_parse(&json!("a")).is_success());
        assert!(schema.safe_parse(&json!(1)).is_failure());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(schema.is_initialized());
    }

    #[test]
    fn test_recursive_depth_is_bounded() {
        let nested = Schema::recursive(|this| Schema::array(this).into_shared());
        let mut value = json!([]);
        for _ in 0..5 {
            value = json!([value]);
        }

        assert!(nested.safe_parse(&value).is_success());

        let ctx = ValidationContext::new().with_max_depth(3);
        let err = nested.parse_with(&value, &ctx).unwrap_err();
        assert_eq!(err.first().code(), "max_depth_exceeded");
    }

    #[test]
    fn test_recursive_handle_resolves_once_built() {
        let mut escaped: Option<DynSchema> = None;
        let owner = Schema::recursive(|this| {
            escaped = Some(this.clone());
            Schema::array(this).into_shared()
        });
        assert!(owner.is_initialized());

        let handle = escaped.unwrap();
        assert!(handle.parse(&json!([[], [[]]])).is_ok());
        assert!(handle.parse(&json!([1])).is_err());
    }

    #[test]
    fn test_handle_outliving_owner_reports_issue() {
        let mut escaped: Option<DynSchema> = None;
        let owner = Schema::recursive(|this| {
            escaped = Some(this.clone());
            Schema::string().into_shared()
        });
        drop(owner);

        let handle = escaped.unwrap();
        let err = handle.parse(&json!("x")).unwrap_err();
        assert_eq!(err.first().code(), "custom");
    }

    #[test]
    fn test_recursive_object_exposes_shape() {
        let tree = Schema::recursive(|this| {
            Schema::object()
                .field("kind", Schema::literal(json!("node")))
                .field("next", this.optional())
                .into_shared()
        });
        assert!(tree.as_object().is_some());
    }
}
