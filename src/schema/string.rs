//! String schema validation.
//!
//! This module provides [`StringSchema`] for validating string values with
//! length bounds and regex patterns.

use regex::Regex;
use serde_json::Value;

use crate::error::{finish, Issue, IssueKind, SchemaBuildError, SizeOrigin};
use crate::path::JsonPath;
use crate::schema::traits::{type_mismatch, FastCheck, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// A constraint applied to string values.
#[derive(Clone)]
enum StringConstraint {
    MinLength {
        min: usize,
        message: Option<String>,
    },
    MaxLength {
        max: usize,
        message: Option<String>,
    },
    Pattern {
        regex: Regex,
        message: Option<String>,
    },
}

impl StringConstraint {
    fn message_mut(&mut self) -> &mut Option<String> {
        match self {
            StringConstraint::MinLength { message, .. }
            | StringConstraint::MaxLength { message, .. }
            | StringConstraint::Pattern { message, .. } => message,
        }
    }

    fn check(
        &self,
        value: &str,
        input: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Option<Issue> {
        let (kind, message) = match self {
            StringConstraint::MinLength { min, message } => {
                if value.chars().count() >= *min {
                    return None;
                }
                let kind = IssueKind::TooSmall {
                    origin: SizeOrigin::String,
                    minimum: *min as f64,
                    inclusive: true,
                };
                (kind, message)
            }
            StringConstraint::MaxLength { max, message } => {
                if value.chars().count() <= *max {
                    return None;
                }
                let kind = IssueKind::TooBig {
                    origin: SizeOrigin::String,
                    maximum: *max as f64,
                    inclusive: true,
                };
                (kind, message)
            }
            StringConstraint::Pattern { regex, message } => {
                if regex.is_match(value) {
                    return None;
                }
                let kind = IssueKind::InvalidFormat {
                    format: "regex".to_string(),
                    pattern: Some(regex.as_str().to_string()),
                };
                (kind, message)
            }
        };
        Some(ctx.issue_with_message(kind, path, Some(input), message.as_deref()))
    }
}

/// A schema for validating string values.
///
/// `StringSchema` validates that values are strings and applies length and
/// pattern constraints. All constraint violations are accumulated rather than
/// short-circuiting on the first failure.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let schema = Schema::string()
///     .min_len(3)
///     .max_len(20)
///     .pattern(r"^[a-z]+$")
///     .unwrap();
///
/// // Both the length and the pattern violation are reported
/// let err = schema.parse(&json!("AB")).unwrap_err();
/// assert_eq!(err.len(), 2);
/// ```
#[derive(Clone, Default)]
pub struct StringSchema {
    constraints: Vec<StringConstraint>,
    type_error_message: Option<String>,
}

impl StringSchema {
    /// Creates a new string schema with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    /// The string must have at least `min` characters (Unicode scalar values).
    pub fn min_len(mut self, min: usize) -> Self {
        self.constraints
            .push(StringConstraint::MinLength { min, message: None });
        self
    }

    /// The string must have at most `max` characters (Unicode scalar values).
    pub fn max_len(mut self, max: usize) -> Self {
        self.constraints
            .push(StringConstraint::MaxLength { max, message: None });
        self
    }

    /// The string must have exactly `len` characters.
    pub fn length(self, len: usize) -> Self {
        self.min_len(len).max_len(len)
    }

    /// Equivalent to `.min_len(1)`.
    pub fn non_empty(self) -> Self {
        self.min_len(1)
    }

    /// The string must match `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError::Pattern`] if the regex does not compile.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde_json::json;
    ///
    /// let digits = Schema::string().pattern(r"^\d+$").unwrap();
    /// assert!(digits.parse(&json!("12345")).is_ok());
    ///
    /// let err = digits.parse(&json!("abc")).unwrap_err();
    /// assert_eq!(err.first().code(), "invalid_format");
    ///
    /// assert!(Schema::string().pattern("[unclosed").is_err());
    /// ```
    pub fn pattern(mut self, pattern: &str) -> Result<Self, SchemaBuildError> {
        let regex = Regex::new(pattern).map_err(|err| {
            tracing::debug!(pattern = pattern, "string pattern rejected");
            SchemaBuildError::from(err)
        })?;
        self.constraints
            .push(StringConstraint::Pattern { regex, message: None });
        Ok(self)
    }

    /// Sets a custom error message for the most recent constraint.
    ///
    /// If no constraints have been added yet, this sets the type error message
    /// (used when the value is not a string).
    pub fn error(mut self, message: impl Into<String>) -> Self {
        match self.constraints.last_mut() {
            Some(last) => *last.message_mut() = Some(message.into()),
            None => self.type_error_message = Some(message.into()),
        }
        self
    }
}

impl SchemaLike for StringSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let s = match value.as_str() {
            Some(s) => s,
            None => {
                return type_mismatch(
                    "string",
                    value,
                    path,
                    ctx,
                    self.type_error_message.as_deref(),
                )
            }
        };

        let issues: Vec<Issue> = self
            .constraints
            .iter()
            .filter_map(|c| c.check(s, value, path, ctx))
            .collect();

        finish(value.clone(), issues)
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::String
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::String)
    }

    fn fast_check(&self) -> Option<FastCheck> {
        self.constraints.is_empty().then_some(FastCheck::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use serde_json::json;
    use stillwater::Validation;

    fn validate(schema: &StringSchema, value: Value) -> ValidationResult<Value> {
        schema.validate(&value, &JsonPath::root(), &ValidationContext::new())
    }

    fn unwrap_failure<T: std::fmt::Debug>(v: Validation<T, ValidationError>) -> ValidationError {
        v.into_result().unwrap_err()
    }

    #[test]
    fn test_string_schema_rejects_non_string() {
        let schema = StringSchema::new();
        assert!(validate(&schema, json!("hello")).is_success());

        for value in [json!(42), json!(null), json!(true), json!([1]), json!({"k": "v"})] {
            let errors = unwrap_failure(validate(&schema, value));
            assert_eq!(errors.first().code(), "invalid_type");
        }

        let errors = unwrap_failure(validate(&schema, json!(42)));
        assert_eq!(
            errors.first().message,
            "Invalid input: expected string, received number"
        );
    }

    #[test]
    fn test_length_bounds() {
        let schema = StringSchema::new().min_len(5).max_len(10);
        assert!(validate(&schema, json!("hello")).is_success());

        let errors = unwrap_failure(validate(&schema, json!("hi")));
        assert_eq!(errors.first().code(), "too_small");

        let errors = unwrap_failure(validate(&schema, json!("this is way too long")));
        assert_eq!(errors.first().code(), "too_big");
    }

    #[test]
    fn test_exact_length() {
        let schema = StringSchema::new().length(2);
        assert!(validate(&schema, json!("ab")).is_success());
        assert!(validate(&schema, json!("abc")).is_failure());
        assert!(validate(&schema, json!("a")).is_failure());
    }

    #[test]
    fn test_pattern_issue_carries_pattern() {
        let schema = StringSchema::new().pattern(r"^\d+$").unwrap();
        let errors = unwrap_failure(validate(&schema, json!("abc")));
        assert_eq!(
            errors.first().kind,
            IssueKind::InvalidFormat {
                format: "regex".to_string(),
                pattern: Some(r"^\d+$".to_string()),
            }
        );
        assert!(errors.first().message.contains(r"^\d+$"));
    }

    #[test]
    fn test_custom_error_messages() {
        let schema = StringSchema::new().min_len(5).error("username too short");
        let errors = unwrap_failure(validate(&schema, json!("ab")));
        assert_eq!(errors.first().message, "username too short");

        let schema = StringSchema::new().error("must be a string");
        let errors = unwrap_failure(validate(&schema, json!(42)));
        assert_eq!(errors.first().message, "must be a string");
    }

    #[test]
    fn test_error_accumulation() {
        let schema = StringSchema::new().min_len(10).pattern(r"^\d+$").unwrap();
        let errors = unwrap_failure(validate(&schema, json!("abc")));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.with_code("too_small").len(), 1);
        assert_eq!(errors.with_code("invalid_format").len(), 1);
    }

    #[test]
    fn test_unicode_length() {
        let schema = StringSchema::new().min_len(3).max_len(5);
        assert!(validate(&schema, json!("日本語")).is_success());
        assert!(validate(&schema, json!("🎉🎊")).is_failure());
    }

    #[test]
    fn test_invalid_regex_pattern() {
        let result = StringSchema::new().pattern(r"[invalid");
        assert!(matches!(result, Err(SchemaBuildError::Pattern(_))));
    }

    #[test]
    fn test_fast_check_only_when_unconstrained() {
        assert_eq!(StringSchema::new().fast_check(), Some(FastCheck::String));
        assert_eq!(StringSchema::new().min_len(1).fast_check(), None);
    }
}
