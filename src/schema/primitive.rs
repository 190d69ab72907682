//! Boolean, null, any, never, literal and enum schemas.

use serde_json::Value;
use stillwater::Validation;

use crate::error::{IssueKind, ValidationError};
use crate::path::JsonPath;
use crate::schema::traits::{type_mismatch, FastCheck, SchemaKind, SchemaLike};
use crate::schema::types::{type_name, TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// JSON equality where numbers compare by value, so `1` matches `1.0`.
pub(crate) fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| same_value(x, y)))
        }
        _ => a == b,
    }
}

/// A schema for `true` and `false`.
#[derive(Clone, Default)]
pub struct BooleanSchema {
    type_error_message: Option<String>,
}

impl BooleanSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the message used when the value is not a boolean.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.type_error_message = Some(message.into());
        self
    }
}

impl SchemaLike for BooleanSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if value.is_boolean() {
            Validation::Success(value.clone())
        } else {
            type_mismatch("boolean", value, path, ctx, self.type_error_message.as_deref())
        }
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Boolean
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Boolean)
    }

    fn fast_check(&self) -> Option<FastCheck> {
        Some(FastCheck::Boolean)
    }
}

/// A schema accepting only `null`.
#[derive(Clone, Copy, Default)]
pub struct NullSchema;

impl SchemaLike for NullSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if value.is_null() {
            Validation::Success(Value::Null)
        } else {
            type_mismatch("null", value, path, ctx, None)
        }
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Null
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Null)
    }

    fn fast_check(&self) -> Option<FastCheck> {
        Some(FastCheck::Null)
    }
}

/// Accepts every value, and absence.
#[derive(Clone, Copy, Default)]
pub struct AnySchema;

impl SchemaLike for AnySchema {
    fn validate(
        &self,
        value: &Value,
        _path: &JsonPath,
        _ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        Validation::Success(value.clone())
    }

    fn validate_missing(
        &self,
        _path: &JsonPath,
        _ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        Validation::Success(None)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Any
    }

    fn accepts_missing(&self) -> bool {
        true
    }

    fn fast_check(&self) -> Option<FastCheck> {
        Some(FastCheck::Any)
    }
}

/// Rejects every value.
#[derive(Clone, Copy, Default)]
pub struct NeverSchema;

impl SchemaLike for NeverSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        ctx.fail(
            IssueKind::invalid_type("never", type_name(value)),
            path,
            Some(value),
        )
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Never
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::EMPTY
    }
}

/// Accepts one of a fixed set of JSON values.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let answer = Schema::literal(json!(42));
/// assert!(answer.parse(&json!(42)).is_ok());
/// assert_eq!(answer.parse(&json!(41)).unwrap_err().first().code(), "invalid_literal");
/// ```
#[derive(Clone)]
pub struct LiteralSchema {
    values: Vec<Value>,
    message: Option<String>,
}

impl LiteralSchema {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            message: None,
        }
    }

    /// The accepted values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Sets the message used when the value does not match.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl SchemaLike for LiteralSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if self.values.iter().any(|v| same_value(v, value)) {
            return Validation::Success(value.clone());
        }
        let kind = IssueKind::InvalidLiteral {
            expected: self.values.clone(),
        };
        Validation::Failure(ValidationError::single(ctx.issue_with_message(
            kind,
            path,
            Some(value),
            self.message.as_deref(),
        )))
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Literal
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::of_values(&self.values)
    }

    fn discriminator_values(&self) -> Option<Vec<Value>> {
        Some(self.values.clone())
    }
}

/// Accepts one of a fixed, ordered list of options.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let color = Schema::enumeration(["red", "green", "blue"]);
/// assert!(color.parse(&json!("green")).is_ok());
///
/// let warm = color.exclude(["green", "blue"]);
/// assert!(warm.parse(&json!("green")).is_err());
/// ```
#[derive(Clone)]
pub struct EnumSchema {
    options: Vec<Value>,
    message: Option<String>,
}

impl EnumSchema {
    pub(crate) fn new(options: Vec<Value>) -> Self {
        let mut unique: Vec<Value> = Vec::with_capacity(options.len());
        for option in options {
            if !unique.iter().any(|u| same_value(u, &option)) {
                unique.push(option);
            }
        }
        Self {
            options: unique,
            message: None,
        }
    }

    /// The options in declaration order.
    pub fn options(&self) -> &[Value] {
        &self.options
    }

    /// A new enum without the given options.
    pub fn exclude<I, V>(&self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let removed: Vec<Value> = options.into_iter().map(Into::into).collect();
        Self {
            options: self
                .options
                .iter()
                .filter(|o| !removed.iter().any(|r| same_value(r, o)))
                .cloned()
                .collect(),
            message: self.message.clone(),
        }
    }

    /// A new enum keeping only the given options, in this enum's order.
    pub fn extract<I, V>(&self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let kept: Vec<Value> = options.into_iter().map(Into::into).collect();
        Self {
            options: self
                .options
                .iter()
                .filter(|o| kept.iter().any(|k| same_value(k, o)))
                .cloned()
                .collect(),
            message: self.message.clone(),
        }
    }

    /// Sets the message used when the value is not an option.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl SchemaLike for EnumSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        if self.options.iter().any(|o| same_value(o, value)) {
            return Validation::Success(value.clone());
        }
        let kind = IssueKind::InvalidEnumValue {
            options: self.options.clone(),
        };
        Validation::Failure(ValidationError::single(ctx.issue_with_message(
            kind,
            path,
            Some(value),
            self.message.as_deref(),
        )))
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Enum
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::of_values(&self.options)
    }

    fn discriminator_values(&self) -> Option<Vec<Value>> {
        Some(self.options.clone())
    }
}
