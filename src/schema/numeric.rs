//! Numeric schema validation.
//!
//! This module provides [`NumberSchema`] for validating numbers with bounds,
//! sign requirements, divisibility and an optional integer requirement.

use std::ops::RangeInclusive;

use serde_json::Value;
use stillwater::Validation;

use crate::error::{finish, Issue, IssueKind, SizeOrigin, ValidationError};
use crate::path::JsonPath;
use crate::schema::traits::{type_mismatch, FastCheck, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// A constraint applied to numeric values.
#[derive(Clone)]
enum NumberConstraint {
    Min {
        value: f64,
        inclusive: bool,
        message: Option<String>,
    },
    Max {
        value: f64,
        inclusive: bool,
        message: Option<String>,
    },
    MultipleOf {
        divisor: f64,
        message: Option<String>,
    },
}

impl NumberConstraint {
    fn message_mut(&mut self) -> &mut Option<String> {
        match self {
            NumberConstraint::Min { message, .. }
            | NumberConstraint::Max { message, .. }
            | NumberConstraint::MultipleOf { message, .. } => message,
        }
    }

    fn check(
        &self,
        n: f64,
        input: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Option<Issue> {
        let (kind, message) = match self {
            NumberConstraint::Min {
                value,
                inclusive,
                message,
            } => {
                let ok = if *inclusive { n >= *value } else { n > *value };
                if ok {
                    return None;
                }
                let kind = IssueKind::TooSmall {
                    origin: SizeOrigin::Number,
                    minimum: *value,
                    inclusive: *inclusive,
                };
                (kind, message)
            }
            NumberConstraint::Max {
                value,
                inclusive,
                message,
            } => {
                let ok = if *inclusive { n <= *value } else { n < *value };
                if ok {
                    return None;
                }
                let kind = IssueKind::TooBig {
                    origin: SizeOrigin::Number,
                    maximum: *value,
                    inclusive: *inclusive,
                };
                (kind, message)
            }
            NumberConstraint::MultipleOf { divisor, message } => {
                if is_multiple_of(n, *divisor) {
                    return None;
                }
                (IssueKind::NotMultipleOf { divisor: *divisor }, message)
            }
        };
        Some(ctx.issue_with_message(kind, path, Some(input), message.as_deref()))
    }
}

fn is_multiple_of(n: f64, divisor: f64) -> bool {
    if divisor == 0.0 {
        return false;
    }
    let quotient = n / divisor;
    (quotient - quotient.round()).abs() < 1e-9
}

/// A schema for validating numbers.
///
/// All constraint violations are accumulated rather than short-circuiting on
/// the first failure.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let percent = Schema::int().min(0.0).max(100.0);
///
/// assert!(percent.parse(&json!(42)).is_ok());
/// assert_eq!(percent.parse(&json!(-5)).unwrap_err().first().code(), "too_small");
/// assert_eq!(percent.parse(&json!(2.5)).unwrap_err().first().code(), "invalid_type");
/// ```
#[derive(Clone, Default)]
pub struct NumberSchema {
    integer: bool,
    constraints: Vec<NumberConstraint>,
    type_error_message: Option<String>,
}

impl NumberSchema {
    /// Creates a new number schema with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires a whole number.
    pub fn int(mut self) -> Self {
        self.integer = true;
        self
    }

    fn lower(mut self, value: f64, inclusive: bool) -> Self {
        self.constraints.push(NumberConstraint::Min {
            value,
            inclusive,
            message: None,
        });
        self
    }

    fn upper(mut self, value: f64, inclusive: bool) -> Self {
        self.constraints.push(NumberConstraint::Max {
            value,
            inclusive,
            message: None,
        });
        self
    }

    /// The number must be at least `value`.
    pub fn min(self, value: f64) -> Self {
        self.lower(value, true)
    }

    /// The number must be at most `value`.
    pub fn max(self, value: f64) -> Self {
        self.upper(value, true)
    }

    /// The number must be greater than `value`.
    pub fn gt(self, value: f64) -> Self {
        self.lower(value, false)
    }

    /// The number must be less than `value`.
    pub fn lt(self, value: f64) -> Self {
        self.upper(value, false)
    }

    /// The number must lie within `range`, inclusive.
    pub fn range(self, range: RangeInclusive<f64>) -> Self {
        let (start, end) = range.into_inner();
        self.min(start).max(end)
    }

    /// The number must be greater than zero.
    pub fn positive(self) -> Self {
        self.gt(0.0)
    }

    /// The number must be at least zero.
    pub fn non_negative(self) -> Self {
        self.min(0.0)
    }

    /// The number must be less than zero.
    pub fn negative(self) -> Self {
        self.lt(0.0)
    }

    /// The number must be at most zero.
    pub fn non_positive(self) -> Self {
        self.max(0.0)
    }

    /// The number must be an integer multiple of `divisor`.
    pub fn multiple_of(mut self, divisor: f64) -> Self {
        self.constraints.push(NumberConstraint::MultipleOf {
            divisor,
            message: None,
        });
        self
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

    fn expected(&self) -> &'static str {
        if self.integer {
            "int"
        } else {
            "number"
        }
    }
}

impl SchemaLike for NumberSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let message = self.type_error_message.as_deref();
        let n = match value.as_f64() {
            Some(n) if n.is_finite() => n,
            _ => return type_mismatch(self.expected(), value, path, ctx, message),
        };

        if self.integer && n.fract() != 0.0 {
            let kind = IssueKind::invalid_type("int", "number");
            return Validation::Failure(ValidationError::single(ctx.issue_with_message(
                kind,
                path,
                Some(value),
                message,
            )));
        }

        let issues: Vec<Issue> = self
            .constraints
            .iter()
            .filter_map(|c| c.check(n, value, path, ctx))
            .collect();

        finish(value.clone(), issues)
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        ctx.fail(
            IssueKind::invalid_type(self.expected(), "undefined"),
            path,
            None,
        )
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Number
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Number)
    }

    fn fast_check(&self) -> Option<FastCheck> {
        (!self.integer && self.constraints.is_empty()).then_some(FastCheck::Number)
    }
}
