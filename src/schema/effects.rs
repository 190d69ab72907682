//! Schemas that run user callbacks: refinements, transforms and preprocessors.
//!
//! Every callback is invoked through a guard. A panic never escapes a parse:
//! it becomes an issue of the kind belonging to the callback (`custom` for
//! predicates, `transform` for transforms and preprocessors). Async callbacks
//! reached from a synchronous parse report `async_unsupported`.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{json, Value};
use stillwater::Validation;

use crate::error::{Issue, IssueKind, ValidationError};
use crate::path::JsonPath;
use crate::schema::object::ObjectSchema;
use crate::schema::traits::{DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::TypeSet;
use crate::validation::ValidationContext;
use crate::ValidationResult;

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text.to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "callback panicked".to_string()
    }
}

/// Runs `f`, turning a panic into its message.
pub(crate) fn guarded<T>(label: &'static str, f: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let reason = panic_reason(payload);
        tracing::warn!(callback = label, %reason, "user callback panicked");
        reason
    })
}

/// Awaits `fut`, turning a panic into its message.
pub(crate) async fn guarded_future<F: Future>(
    label: &'static str,
    fut: F,
) -> Result<F::Output, String> {
    AssertUnwindSafe(fut).catch_unwind().await.map_err(|payload| {
        let reason = panic_reason(payload);
        tracing::warn!(callback = label, %reason, "user callback panicked");
        reason
    })
}

type ValueFn = Arc<dyn Fn(Value) -> Result<Value, String> + Send + Sync>;
type AsyncValueFn = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// Why a guarded callback produced no value.
pub(crate) enum CallError {
    /// The callback returned an error or panicked.
    Failed(String),
    /// The callback is async and the caller is not.
    Async,
}

/// A value-to-value callback, sync or async.
#[derive(Clone)]
pub(crate) enum Callback {
    Sync(ValueFn),
    Async(AsyncValueFn),
}

impl Callback {
    pub(crate) fn infallible<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Callback::Sync(Arc::new(move |value| Ok(f(value))))
    }

    pub(crate) fn fallible<F, E>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Display,
    {
        Callback::Sync(Arc::new(move |value| f(value).map_err(|e| e.to_string())))
    }

    pub(crate) fn asynchronous<F, Fut, E>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Display,
    {
        Callback::Async(Arc::new(move |value| {
            let fut = f(value);
            async move { fut.await.map_err(|e| e.to_string()) }.boxed()
        }))
    }

    pub(crate) fn call(&self, label: &'static str, value: Value) -> Result<Value, CallError> {
        match self {
            Callback::Sync(f) => guarded(label, || f(value))
                .and_then(|result| result)
                .map_err(CallError::Failed),
            Callback::Async(_) => Err(CallError::Async),
        }
    }

    pub(crate) async fn call_async(
        &self,
        label: &'static str,
        value: Value,
    ) -> Result<Value, String> {
        match self {
            Callback::Sync(f) => guarded(label, || f(value)).and_then(|result| result),
            Callback::Async(f) => {
                let fut = guarded(label, || f(value))?;
                guarded_future(label, fut).await.and_then(|result| result)
            }
        }
    }
}

type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
type AsyncPredicateFn = Arc<dyn Fn(Value) -> BoxFuture<'static, bool> + Send + Sync>;

/// A boolean check on a value, sync or async.
#[derive(Clone)]
pub(crate) enum Predicate {
    Sync(PredicateFn),
    Async(AsyncPredicateFn),
}

impl Predicate {
    pub(crate) fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Predicate::Sync(Arc::new(f))
    }

    pub(crate) fn asynchronous<F, Fut>(f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        Predicate::Async(Arc::new(move |value| f(value).boxed()))
    }

    pub(crate) fn test(&self, label: &'static str, value: &Value) -> Result<bool, CallError> {
        match self {
            Predicate::Sync(f) => guarded(label, || f(value)).map_err(CallError::Failed),
            Predicate::Async(_) => Err(CallError::Async),
        }
    }

    pub(crate) async fn test_async(
        &self,
        label: &'static str,
        value: &Value,
    ) -> Result<bool, String> {
        match self {
            Predicate::Sync(f) => guarded(label, || f(value)),
            Predicate::Async(f) => {
                let fut = guarded(label, || f(value.clone()))?;
                guarded_future(label, fut).await
            }
        }
    }
}

/// Options for [`refine_with`](crate::SchemaExt::refine_with).
///
/// # Example
///
/// ```rust
/// use inquest::{JsonPath, RefineOptions, Schema, SchemaExt};
/// use serde_json::json;
///
/// let form = Schema::object()
///     .field("password", Schema::string())
///     .field("confirm", Schema::string())
///     .refine_with(
///         |v| v["password"] == v["confirm"],
///         RefineOptions::new()
///             .message("Passwords do not match")
///             .path(JsonPath::from_field("confirm")),
///     );
///
/// let err = form.parse(&json!({"password": "a", "confirm": "b"})).unwrap_err();
/// assert_eq!(err.first().path.to_string(), "confirm");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RefineOptions {
    message: Option<String>,
    path: JsonPath,
    params: Option<Value>,
}

impl RefineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message reported when the check fails.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Path appended to the issue path.
    pub fn path(mut self, path: JsonPath) -> Self {
        self.path = path;
        self
    }

    /// Parameters attached to the `custom` issue.
    pub fn params(mut self, params: Value) -> Self {
        self.params = Some(params);
        self
    }
}

/// Runs a predicate after the inner schema succeeds.
#[derive(Clone)]
pub struct RefineSchema {
    inner: DynSchema,
    predicate: Predicate,
    options: RefineOptions,
}

impl RefineSchema {
    pub(crate) fn new(inner: DynSchema, predicate: Predicate, options: RefineOptions) -> Self {
        Self {
            inner,
            predicate,
            options,
        }
    }

    fn outcome(
        &self,
        outcome: Result<bool, CallError>,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let issue_path = path.join(&self.options.path);
        let message = self.options.message.as_deref();
        let issue = match outcome {
            Ok(true) => return Validation::Success(value),
            Ok(false) => ctx.issue_with_message(
                IssueKind::Custom {
                    params: self.options.params.clone(),
                },
                &issue_path,
                Some(&value),
                message,
            ),
            Err(CallError::Failed(reason)) => ctx.issue_with_message(
                IssueKind::Custom {
                    params: Some(json!({ "reason": reason })),
                },
                &issue_path,
                Some(&value),
                message,
            ),
            Err(CallError::Async) => ctx.issue(IssueKind::AsyncUnsupported, path, Some(&value)),
        };
        Validation::Failure(ValidationError::single(issue))
    }

    fn check(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let outcome = self.predicate.test("refine", &value);
        self.outcome(outcome, value, path, ctx)
    }

    async fn check_async(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let outcome = self
            .predicate
            .test_async("refine", &value)
            .await
            .map_err(CallError::Failed);
        self.outcome(outcome, value, path, ctx)
    }
}

impl SchemaLike for RefineSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.inner.validate(value, path, ctx) {
            Validation::Success(output) => self.check(output, path, ctx),
            failure => failure,
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        match self.inner.validate_missing(path, ctx) {
            Validation::Success(Some(output)) => match self.check(output, path, ctx) {
                Validation::Success(checked) => Validation::Success(Some(checked)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            other => other,
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            match self.inner.validate_async(value, path, ctx).await {
                Validation::Success(output) => self.check_async(output, path, ctx).await,
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
            match self.inner.validate_missing_async(path, ctx).await {
                Validation::Success(Some(output)) => {
                    match self.check_async(output, path, ctx).await {
                        Validation::Success(checked) => Validation::Success(Some(checked)),
                        Validation::Failure(err) => Validation::Failure(err),
                    }
                }
                other => other,
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Refine
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts()
    }

    fn accepts_missing(&self) -> bool {
        self.inner.accepts_missing()
    }

    fn as_object(&self) -> Option<&ObjectSchema> {
        self.inner.as_object()
    }
}

/// Collects issues raised by a [`super_refine`](crate::SchemaExt::super_refine)
/// callback.
///
/// Paths given to the `*_at` methods are relative to the refined value.
pub struct RefinementCtx<'a> {
    path: &'a JsonPath,
    ctx: &'a ValidationContext,
    issues: Vec<Issue>,
}

impl<'a> RefinementCtx<'a> {
    fn new(path: &'a JsonPath, ctx: &'a ValidationContext) -> Self {
        Self {
            path,
            ctx,
            issues: Vec::new(),
        }
    }

    /// Adds a `custom` issue at the refined value.
    pub fn add_issue(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.push(IssueKind::custom(), &JsonPath::root(), Some(&message));
    }

    /// Adds a `custom` issue below the refined value.
    pub fn add_issue_at(&mut self, relative: JsonPath, message: impl Into<String>) {
        let message = message.into();
        self.push(IssueKind::custom(), &relative, Some(&message));
    }

    /// Adds an issue of any kind. Without a message the resolver supplies one.
    pub fn add(&mut self, kind: IssueKind, relative: JsonPath, message: Option<&str>) {
        self.push(kind, &relative, message);
    }

    /// The path of the refined value.
    pub fn path(&self) -> &JsonPath {
        self.path
    }

    /// Number of issues added so far.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    fn push(&mut self, kind: IssueKind, relative: &JsonPath, message: Option<&str>) {
        let path = self.path.join(relative);
        self.issues
            .push(self.ctx.issue_with_message(kind, &path, None, message));
    }
}

type SuperRefineFn = Arc<dyn Fn(&Value, &mut RefinementCtx<'_>) + Send + Sync>;

/// Runs an issue-collecting callback after the inner schema succeeds.
#[derive(Clone)]
pub struct SuperRefineSchema {
    inner: DynSchema,
    refinement: SuperRefineFn,
}

impl SuperRefineSchema {
    pub(crate) fn new<F>(inner: DynSchema, refinement: F) -> Self
    where
        F: Fn(&Value, &mut RefinementCtx<'_>) + Send + Sync + 'static,
    {
        Self {
            inner,
            refinement: Arc::new(refinement),
        }
    }

    fn check(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let mut refinement = RefinementCtx::new(path, ctx);
        let outcome = guarded("super_refine", || (self.refinement)(&value, &mut refinement));
        let mut issues = refinement.issues;
        if let Err(reason) = outcome {
            issues.push(ctx.issue(
                IssueKind::Custom {
                    params: Some(json!({ "reason": reason })),
                },
                path,
                Some(&value),
            ));
        }
        match ValidationError::from_issues(issues) {
            Some(err) => Validation::Failure(err),
            None => Validation::Success(value),
        }
    }
}

impl SchemaLike for SuperRefineSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.inner.validate(value, path, ctx) {
            Validation::Success(output) => self.check(output, path, ctx),
            failure => failure,
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        match self.inner.validate_missing(path, ctx) {
            Validation::Success(Some(output)) => match self.check(output, path, ctx) {
                Validation::Success(checked) => Validation::Success(Some(checked)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            other => other,
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            match self.inner.validate_async(value, path, ctx).await {
                Validation::Success(output) => self.check(output, path, ctx),
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
            match self.inner.validate_missing_async(path, ctx).await {
                Validation::Success(Some(output)) => match self.check(output, path, ctx) {
                    Validation::Success(checked) => Validation::Success(Some(checked)),
                    Validation::Failure(err) => Validation::Failure(err),
                },
                other => other,
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::SuperRefine
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts()
    }

    fn accepts_missing(&self) -> bool {
        self.inner.accepts_missing()
    }

    fn as_object(&self) -> Option<&ObjectSchema> {
        self.inner.as_object()
    }
}

fn callback_failure<T>(
    error: CallError,
    kind: impl FnOnce(String) -> IssueKind,
    path: &JsonPath,
    input: &Value,
    ctx: &ValidationContext,
) -> ValidationResult<T> {
    match error {
        CallError::Failed(reason) => ctx.fail(kind(reason), path, Some(input)),
        CallError::Async => ctx.fail(IssueKind::AsyncUnsupported, path, Some(input)),
    }
}

fn transform_kind(reason: String) -> IssueKind {
    IssueKind::Transform { reason }
}

/// Applies a callback to the inner schema's output.
///
/// A transform cannot be reversed: in the encode direction it reports
/// `encode_failed`. Use a codec for two-way conversions.
#[derive(Clone)]
pub struct TransformSchema {
    inner: DynSchema,
    transform: Callback,
}

impl TransformSchema {
    pub(crate) fn new(inner: DynSchema, transform: Callback) -> Self {
        Self { inner, transform }
    }

    fn apply(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.transform.call("transform", value.clone()) {
            Ok(output) => Validation::Success(output),
            Err(error) => callback_failure(error, transform_kind, path, &value, ctx),
        }
    }

    async fn apply_async(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.transform.call_async("transform", value.clone()).await {
            Ok(output) => Validation::Success(output),
            Err(reason) => ctx.fail(transform_kind(reason), path, Some(&value)),
        }
    }

    fn irreversible<T>(
        &self,
        path: &JsonPath,
        input: Option<&Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        ctx.fail(
            IssueKind::EncodeFailed {
                reason: "transform cannot be encoded".to_string(),
            },
            path,
            input,
        )
    }
}

impl SchemaLike for TransformSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if ctx.is_encoding() {
            return self.irreversible(path, Some(value), ctx);
        }
        match self.inner.validate(value, path, ctx) {
            Validation::Success(output) => self.apply(output, path, ctx),
            failure => failure,
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        if ctx.is_encoding() {
            return self.irreversible(path, None, ctx);
        }
        match self.inner.validate_missing(path, ctx) {
            Validation::Success(Some(output)) => match self.apply(output, path, ctx) {
                Validation::Success(transformed) => Validation::Success(Some(transformed)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            other => other,
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            if ctx.is_encoding() {
                return self.irreversible(path, Some(value), ctx);
            }
            match self.inner.validate_async(value, path, ctx).await {
                Validation::Success(output) => self.apply_async(output, path, ctx).await,
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
            if ctx.is_encoding() {
                return self.irreversible(path, None, ctx);
            }
            match self.inner.validate_missing_async(path, ctx).await {
                Validation::Success(Some(output)) => {
                    match self.apply_async(output, path, ctx).await {
                        Validation::Success(transformed) => Validation::Success(Some(transformed)),
                        Validation::Failure(err) => Validation::Failure(err),
                    }
                }
                other => other,
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Transform
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts()
    }

    fn accepts_missing(&self) -> bool {
        self.inner.accepts_missing()
    }
}

/// Applies a callback to the raw input before the inner schema runs.
///
/// Absent input goes straight to the inner schema. In the encode direction
/// the callback is skipped and the inner schema validates the value as is.
#[derive(Clone)]
pub struct PreprocessSchema {
    preprocess: Callback,
    inner: DynSchema,
}

impl PreprocessSchema {
    pub(crate) fn new(preprocess: Callback, inner: DynSchema) -> Self {
        Self { preprocess, inner }
    }
}

impl SchemaLike for PreprocessSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if ctx.is_encoding() {
            return self.inner.validate(value, path, ctx);
        }
        match self.preprocess.call("preprocess", value.clone()) {
            Ok(prepared) => self.inner.validate(&prepared, path, ctx),
            Err(error) => callback_failure(error, transform_kind, path, value, ctx),
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        self.inner.validate_missing(path, ctx)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            if ctx.is_encoding() {
                return self.inner.validate_async(value, path, ctx).await;
            }
            match self.preprocess.call_async("preprocess", value.clone()).await {
                Ok(prepared) => self.inner.validate_async(&prepared, path, ctx).await,
                Err(reason) => ctx.fail(transform_kind(reason), path, Some(value)),
            }
        }
        .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        self.inner.validate_missing_async(path, ctx)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Preprocess
    }

    fn accepts_missing(&self) -> bool {
        self.inner.accepts_missing()
    }
}
