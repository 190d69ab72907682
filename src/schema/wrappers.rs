//! Presence, fallback and marker wrappers.
//!
//! Each wrapper holds its inner schema behind an `Arc` and changes how absent,
//! null or failing input is handled, leaving everything else to the inner
//! schema.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{SchemaBuildError, ValidationError};
use crate::path::JsonPath;
use crate::schema::object::ObjectSchema;
use crate::schema::traits::{DynSchema, FastCheck, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// Checks a configured value against the schema it will stand in for.
///
/// Failures consisting only of `async_unsupported` issues are accepted: the
/// value cannot be checked synchronously and is trusted.
fn check_configured(
    schema: &DynSchema,
    value: &Value,
    what: &'static str,
) -> Result<(), ValidationError> {
    let ctx = ValidationContext::new();
    match schema.validate(value, &JsonPath::root(), &ctx) {
        Validation::Success(_) => Ok(()),
        Validation::Failure(err) if err.iter().all(|i| i.code() == "async_unsupported") => {
            tracing::debug!(combinator = what, "configured value not checked: schema is async");
            Ok(())
        }
        Validation::Failure(err) => {
            tracing::debug!(
                combinator = what,
                %value,
                issues = err.len(),
                "configured value rejected"
            );
            Err(err)
        }
    }
}

fn some<T>(result: ValidationResult<T>) -> ValidationResult<Option<T>> {
    match result {
        Validation::Success(value) => Validation::Success(Some(value)),
        Validation::Failure(err) => Validation::Failure(err),
    }
}

/// Lets absent input through as absent.
#[derive(Clone)]
pub struct OptionalSchema {
    inner: DynSchema,
}

impl OptionalSchema {
    pub(crate) fn new(inner: DynSchema) -> Self {
        Self { inner }
    }

    /// The wrapped schema.
    pub fn inner(&self) -> &DynSchema {
        &self.inner
    }
}

impl SchemaLike for OptionalSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        self.inner.validate(value, path, ctx)
    }

    fn validate_missing(
        &self,
        _path: &JsonPath,
        _ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        Validation::Success(None)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        self.inner.validate_async(value, path, ctx)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Optional
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts()
    }

    fn accepts_missing(&self) -> bool {
        true
    }

    fn fast_check(&self) -> Option<FastCheck> {
        self.inner.fast_check()
    }

    fn unwrap_optional(&self) -> Option<DynSchema> {
        Some(self.inner.clone())
    }
}

/// Lets `null` through unchanged.
#[derive(Clone)]
pub struct NullableSchema {
    inner: DynSchema,
}

impl NullableSchema {
    pub(crate) fn new(inner: DynSchema) -> Self {
        Self { inner }
    }
}

impl SchemaLike for NullableSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if value.is_null() {
            return Validation::Success(Value::Null);
        }
        self.inner.validate(value, path, ctx)
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
        if value.is_null() {
            return future::ready(Validation::Success(Value::Null)).boxed();
        }
        self.inner.validate_async(value, path, ctx)
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        self.inner.validate_missing_async(path, ctx)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Nullable
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts().with(ValueType::Null)
    }

    fn accepts_missing(&self) -> bool {
        self.inner.accepts_missing()
    }
}

/// Lets both `null` and absent input through.
#[derive(Clone)]
pub struct NullishSchema {
    inner: DynSchema,
}

impl NullishSchema {
    pub(crate) fn new(inner: DynSchema) -> Self {
        Self { inner }
    }
}

impl SchemaLike for NullishSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if value.is_null() {
            return Validation::Success(Value::Null);
        }
        self.inner.validate(value, path, ctx)
    }

    fn validate_missing(
        &self,
        _path: &JsonPath,
        _ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        Validation::Success(None)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        if value.is_null() {
            return future::ready(Validation::Success(Value::Null)).boxed();
        }
        self.inner.validate_async(value, path, ctx)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Nullish
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts().with(ValueType::Null)
    }

    fn accepts_missing(&self) -> bool {
        true
    }
}

/// Substitutes a fixed value for absent input, without re-validating it.
///
/// The value is checked against the inner schema once, when the wrapper is
/// built.
#[derive(Clone)]
pub struct DefaultSchema {
    inner: DynSchema,
    value: Value,
}

impl DefaultSchema {
    pub(crate) fn new(inner: DynSchema, value: Value) -> Result<Self, SchemaBuildError> {
        check_configured(&inner, &value, "default")
            .map_err(|source| SchemaBuildError::InvalidDefault {
                value: value.clone(),
                source,
            })?;
        Ok(Self { inner, value })
    }

    /// The configured default.
    pub fn default_value(&self) -> &Value {
        &self.value
    }
}

impl SchemaLike for DefaultSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        self.inner.validate(value, path, ctx)
    }

    fn validate_missing(
        &self,
        _path: &JsonPath,
        _ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        Validation::Success(Some(self.value.clone()))
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        self.inner.validate_async(value, path, ctx)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Default
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts()
    }

    fn accepts_missing(&self) -> bool {
        true
    }

    fn fast_check(&self) -> Option<FastCheck> {
        self.inner.fast_check()
    }
}

/// Runs the inner schema against a fixed value whenever input is absent.
#[derive(Clone)]
pub struct PrefaultSchema {
    inner: DynSchema,
    value: Value,
}

impl PrefaultSchema {
    pub(crate) fn new(inner: DynSchema, value: Value) -> Result<Self, SchemaBuildError> {
        check_configured(&inner, &value, "prefault")
            .map_err(|source| SchemaBuildError::InvalidPrefault {
                value: value.clone(),
                source,
            })?;
        Ok(Self { inner, value })
    }
}

impl SchemaLike for PrefaultSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        self.inner.validate(value, path, ctx)
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        some(self.inner.validate(&self.value, path, ctx))
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        self.inner.validate_async(value, path, ctx)
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        self.inner
            .validate_async(&self.value, path, ctx)
            .map(some)
            .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Prefault
    }

    fn accepts(&self) -> TypeSet {
        self.inner.accepts()
    }

    fn accepts_missing(&self) -> bool {
        true
    }
}

/// Replaces any failure of the inner schema with a fixed value.
#[derive(Clone)]
pub struct CatchSchema {
    inner: DynSchema,
    fallback: Value,
}

impl CatchSchema {
    pub(crate) fn new(inner: DynSchema, fallback: Value) -> Result<Self, SchemaBuildError> {
        check_configured(&inner, &fallback, "catch")
            .map_err(|source| SchemaBuildError::InvalidFallback {
                value: fallback.clone(),
                source,
            })?;
        Ok(Self { inner, fallback })
    }

    fn recover(&self, result: ValidationResult<Value>) -> ValidationResult<Value> {
        match result {
            Validation::Failure(err) => {
                tracing::trace!(issues = err.len(), "catch replaced failure with fallback");
                Validation::Success(self.fallback.clone())
            }
            success => success,
        }
    }

    fn recover_missing(
        &self,
        result: ValidationResult<Option<Value>>,
    ) -> ValidationResult<Option<Value>> {
        match result {
            Validation::Failure(_) => Validation::Success(Some(self.fallback.clone())),
            success => success,
        }
    }
}

impl SchemaLike for CatchSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        self.recover(self.inner.validate(value, path, ctx))
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        self.recover_missing(self.inner.validate_missing(path, ctx))
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        self.inner
            .validate_async(value, path, ctx)
            .map(move |result| self.recover(result))
            .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        self.inner
            .validate_missing_async(path, ctx)
            .map(move |result| self.recover_missing(result))
            .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Catch
    }

    fn accepts_missing(&self) -> bool {
        true
    }
}

/// Marks the output as read-only. Validation is unchanged.
#[derive(Clone)]
pub struct ReadonlySchema {
    inner: DynSchema,
}

impl ReadonlySchema {
    pub(crate) fn new(inner: DynSchema) -> Self {
        Self { inner }
    }
}

/// Forwards every [`SchemaLike`] method except `kind` to `self.inner`.
macro_rules! delegate_schema {
    ($kind:expr) => {
        fn validate(
            &self,
            value: &Value,
            path: &JsonPath,
            ctx: &ValidationContext,
        ) -> ValidationResult<Value> {
            self.inner.validate(value, path, ctx)
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
            self.inner.validate_async(value, path, ctx)
        }

        fn validate_missing_async<'a>(
            &'a self,
            path: &'a JsonPath,
            ctx: &'a ValidationContext,
        ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
            self.inner.validate_missing_async(path, ctx)
        }

        fn kind(&self) -> SchemaKind {
            $kind
        }

        fn accepts(&self) -> TypeSet {
            self.inner.accepts()
        }

        fn accepts_missing(&self) -> bool {
            self.inner.accepts_missing()
        }

        fn fast_check(&self) -> Option<FastCheck> {
            self.inner.fast_check()
        }

        fn as_object(&self) -> Option<&ObjectSchema> {
            self.inner.as_object()
        }

        fn discriminator_values(&self) -> Option<Vec<Value>> {
            self.inner.discriminator_values()
        }
    };
}

impl SchemaLike for ReadonlySchema {
    delegate_schema!(SchemaKind::Readonly);
}

/// A nominal marker over a schema. `B` only exists at compile time.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// struct UserId;
///
/// let schema = Schema::string().min_len(1).brand::<UserId>();
/// let id = schema.parse_branded(&json!("u-1")).unwrap();
/// assert_eq!(id.as_str(), Some("u-1"));
/// ```
pub struct BrandSchema<B> {
    inner: DynSchema,
    _brand: PhantomData<fn() -> B>,
}

impl<B> BrandSchema<B> {
    pub(crate) fn new(inner: DynSchema) -> Self {
        Self {
            inner,
            _brand: PhantomData,
        }
    }

    /// Validates and tags the output with the brand.
    pub fn safe_parse_branded(&self, value: &Value) -> ValidationResult<Branded<B>> {
        let ctx = ValidationContext::new();
        match self.inner.validate(value, &JsonPath::root(), &ctx) {
            Validation::Success(output) => Validation::Success(Branded::new(output)),
            Validation::Failure(err) => Validation::Failure(err),
        }
    }

    /// Validates and tags the output, or returns the error.
    pub fn parse_branded(&self, value: &Value) -> Result<Branded<B>, ValidationError> {
        self.safe_parse_branded(value).into_result()
    }
}

impl<B> Clone for BrandSchema<B> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<B> SchemaLike for BrandSchema<B> {
    delegate_schema!(SchemaKind::Brand);
}

/// A validated value carrying the brand `B`.
pub struct Branded<B> {
    value: Value,
    _brand: PhantomData<fn() -> B>,
}

impl<B> Branded<B> {
    fn new(value: Value) -> Self {
        Self {
            value,
            _brand: PhantomData,
        }
    }

    /// Returns the underlying value.
    pub fn into_inner(self) -> Value {
        self.value
    }
}

impl<B> Deref for Branded<B> {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.value
    }
}

impl<B> Clone for Branded<B> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<B> PartialEq for Branded<B> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<B> fmt::Debug for Branded<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Branded").field(&self.value).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::SchemaExt;
    use serde_json::json;

    #[test]
    fn test_optional_accepts_absence_only() {
        let schema = Schema::string().optional();
        assert!(matches!(schema.safe_parse_missing(), Validation::Success(None)));
        assert!(schema.safe_parse(&json!(null)).is_failure());
        assert_eq!(schema.unwrap_optional().unwrap().kind(), SchemaKind::String);
    }

    #[test]
    fn test_nullable_does_not_accept_absence() {
        let schema = Schema::string().nullable();
        assert_eq!(schema.parse(&json!(null)).unwrap(), json!(null));
        let err = schema.safe_parse_missing().into_result().unwrap_err();
        assert_eq!(
            err.first().kind,
            crate::IssueKind::invalid_type("string", "undefined")
        );
    }

    #[test]
    fn test_nullish_accepts_both() {
        let schema = Schema::number().nullish();
        assert!(schema.safe_parse(&json!(null)).is_success());
        assert!(matches!(schema.safe_parse_missing(), Validation::Success(None)));
        assert!(schema.safe_parse(&json!("1")).is_failure());
    }

    #[test]
    fn test_default_rejects_invalid_value_at_construction() {
        let err = Schema::string().min_len(3).default(json!("ab")).err().unwrap();
        assert!(matches!(err, SchemaBuildError::InvalidDefault { .. }));

        let schema = Schema::string().min_len(3).default(json!("abc")).unwrap();
        assert!(matches!(
            schema.safe_parse_missing(),
            Validation::Success(Some(ref v)) if v == &json!("abc")
        ));
    }

    #[test]
    fn test_prefault_revalidates_through_base() {
        let schema = Schema::string()
            .map(|v| json!(v.as_str().map(str::len)))
            .prefault(json!("four"))
            .unwrap();
        assert!(matches!(
            schema.safe_parse_missing(),
            Validation::Success(Some(ref v)) if v == &json!(4)
        ));
    }

    #[test]
    fn test_catch_replaces_failure() {
        let schema = Schema::number().catch(json!(0)).unwrap();
        assert_eq!(schema.parse(&json!("nope")).unwrap(), json!(0));
        assert_eq!(schema.parse(&json!(7)).unwrap(), json!(7));
        assert!(matches!(
            schema.safe_parse_missing(),
            Validation::Success(Some(ref v)) if v == &json!(0)
        ));

        assert!(matches!(
            Schema::number().catch(json!("zero")),
            Err(SchemaBuildError::InvalidFallback { .. })
        ));
    }

    #[test]
    fn test_readonly_and_brand_delegate() {
        struct Email;
        let readonly = Schema::string().readonly();
        assert_eq!(readonly.fast_check(), Some(FastCheck::String));

        let branded = Schema::string().brand::<Email>();
        assert!(branded.parse_branded(&json!(1)).is_err());
        let value = branded.parse_branded(&json!("a@b")).unwrap();
        assert_eq!(value.into_inner(), json!("a@b"));
    }
}
