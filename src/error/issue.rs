//! The issue vocabulary.
//!
//! An [`Issue`] is one atomic validation failure. Its [`IssueKind`] carries the
//! kind-specific context (expected/received types, bounds, unknown keys, the
//! per-candidate failures of a union, ...) so message resolution and error
//! views never need to parse message text.

use std::fmt::{self, Display};

use serde::Serialize;
use serde_json::Value;

use crate::path::JsonPath;

/// What a size bound was measured on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeOrigin {
    /// Character count of a string.
    String,
    /// Numeric value.
    Number,
    /// Element count of an array or tuple.
    Array,
}

impl SizeOrigin {
    /// The unit noun used in messages, or None for numeric bounds.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            SizeOrigin::String => Some("characters"),
            SizeOrigin::Array => Some("items"),
            SizeOrigin::Number => None,
        }
    }
}

impl Display for SizeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeOrigin::String => write!(f, "string"),
            SizeOrigin::Number => write!(f, "number"),
            SizeOrigin::Array => write!(f, "array"),
        }
    }
}

/// The kind of a validation failure, with its context.
///
/// The set is open in practice: leaf validators outside this crate report
/// their own failures through [`IssueKind::Custom`] with `params`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum IssueKind {
    /// The input had the wrong JSON type (or was absent).
    InvalidType { expected: String, received: String },
    /// A lower bound was violated.
    TooSmall {
        origin: SizeOrigin,
        minimum: f64,
        inclusive: bool,
    },
    /// An upper bound was violated.
    TooBig {
        origin: SizeOrigin,
        maximum: f64,
        inclusive: bool,
    },
    /// A string did not match a format.
    InvalidFormat {
        format: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    /// A number was not a multiple of the divisor.
    NotMultipleOf { divisor: f64 },
    /// A strict object or exhaustive record saw keys outside its shape.
    UnrecognizedKeys { keys: Vec<String> },
    /// No union member matched (or, for exclusive unions, several did).
    InvalidUnion {
        errors: Vec<Vec<Issue>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    /// The input was not one of the literal values.
    InvalidLiteral { expected: Vec<Value> },
    /// The input was not one of the enum options.
    InvalidEnumValue { options: Vec<Value> },
    /// A discriminated union could not select an option.
    InvalidDiscriminator {
        discriminator: String,
        options: Vec<Value>,
    },
    /// A record key failed its key validator.
    InvalidKey { issues: Vec<Issue> },
    /// Intersection members produced outputs that cannot be merged.
    InvalidIntersectionTypes,
    /// A refinement or user-defined check failed.
    Custom {
        #[serde(skip_serializing_if = "Option::is_none")]
        params: Option<Value>,
    },
    /// A transform or preprocess callback failed.
    Transform { reason: String },
    /// A codec decode function failed.
    DecodeFailed { reason: String },
    /// A codec encode function failed, or a value could not be encoded.
    EncodeFailed { reason: String },
    /// An asynchronous callback was reached from a synchronous entry point.
    AsyncUnsupported,
    /// Recursive validation went deeper than the context allows.
    MaxDepthExceeded { max_depth: usize },
}

impl IssueKind {
    /// Creates an `invalid_type` kind.
    pub fn invalid_type(expected: impl Into<String>, received: impl Into<String>) -> Self {
        IssueKind::InvalidType {
            expected: expected.into(),
            received: received.into(),
        }
    }

    /// Creates a `custom` kind without parameters.
    pub fn custom() -> Self {
        IssueKind::Custom { params: None }
    }

    /// Returns the stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::InvalidType { .. } => "invalid_type",
            IssueKind::TooSmall { .. } => "too_small",
            IssueKind::TooBig { .. } => "too_big",
            IssueKind::InvalidFormat { .. } => "invalid_format",
            IssueKind::NotMultipleOf { .. } => "not_multiple_of",
            IssueKind::UnrecognizedKeys { .. } => "unrecognized_keys",
            IssueKind::InvalidUnion { .. } => "invalid_union",
            IssueKind::InvalidLiteral { .. } => "invalid_literal",
            IssueKind::InvalidEnumValue { .. } => "invalid_enum_value",
            IssueKind::InvalidDiscriminator { .. } => "invalid_discriminator",
            IssueKind::InvalidKey { .. } => "invalid_key",
            IssueKind::InvalidIntersectionTypes => "invalid_intersection_types",
            IssueKind::Custom { .. } => "custom",
            IssueKind::Transform { .. } => "transform",
            IssueKind::DecodeFailed { .. } => "decode_failed",
            IssueKind::EncodeFailed { .. } => "encode_failed",
            IssueKind::AsyncUnsupported => "async_unsupported",
            IssueKind::MaxDepthExceeded { .. } => "max_depth_exceeded",
        }
    }

    /// Last-resort message used when no resolver produces one.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            IssueKind::InvalidType { .. } => "Invalid input",
            IssueKind::TooSmall { .. } => "Too small",
            IssueKind::TooBig { .. } => "Too big",
            IssueKind::InvalidFormat { .. } => "Invalid format",
            IssueKind::NotMultipleOf { .. } => "Invalid number",
            IssueKind::UnrecognizedKeys { .. } => "Unrecognized keys",
            IssueKind::InvalidUnion { .. } => "Invalid input",
            IssueKind::InvalidLiteral { .. } => "Invalid literal value",
            IssueKind::InvalidEnumValue { .. } => "Invalid option",
            IssueKind::InvalidDiscriminator { .. } => "Invalid discriminator value",
            IssueKind::InvalidKey { .. } => "Invalid key",
            IssueKind::InvalidIntersectionTypes => "Intersection results could not be merged",
            IssueKind::Custom { .. } => "Invalid input",
            IssueKind::Transform { .. } => "Transform failed",
            IssueKind::DecodeFailed { .. } => "Decode failed",
            IssueKind::EncodeFailed { .. } => "Encode failed",
            IssueKind::AsyncUnsupported => "Asynchronous validation is not supported here",
            IssueKind::MaxDepthExceeded { .. } => "Maximum validation depth exceeded",
        }
    }
}

/// A single validation failure.
///
/// `path` is relative to the root value of the outermost parse call and
/// `message` is already resolved to human text. `input` is only populated when
/// the validation context asks for inputs to be reported.
///
/// # Example
///
/// ```rust
/// use inquest::{Issue, IssueKind, JsonPath};
///
/// let issue = Issue::new(
///     IssueKind::invalid_type("string", "number"),
///     JsonPath::root().push_field("name"),
///     "Invalid input: expected string, received number",
/// );
///
/// assert_eq!(issue.code(), "invalid_type");
/// assert_eq!(issue.to_string(), "name: Invalid input: expected string, received number");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Kind and kind-specific context.
    #[serde(flatten)]
    pub kind: IssueKind,
    /// Where the failure occurred.
    pub path: JsonPath,
    /// Human-readable message.
    pub message: String,
    /// The offending input, when reporting is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl Issue {
    /// Creates an issue with an explicit message.
    pub fn new(kind: IssueKind, path: JsonPath, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
            input: None,
        }
    }

    /// Attaches the offending input.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    /// Returns the stable machine-readable code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Formats a bound without a trailing `.0` for whole numbers.
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<Issue>();
    assert_sync::<Issue>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_codes_are_snake_case() {
        assert_eq!(IssueKind::invalid_type("string", "null").code(), "invalid_type");
        assert_eq!(IssueKind::InvalidIntersectionTypes.code(), "invalid_intersection_types");
        assert_eq!(
            IssueKind::UnrecognizedKeys { keys: vec![] }.code(),
            "unrecognized_keys"
        );
    }

    #[test]
    fn test_issue_serializes_with_code_tag() {
        let issue = Issue::new(
            IssueKind::TooSmall {
                origin: SizeOrigin::String,
                minimum: 3.0,
                inclusive: true,
            },
            JsonPath::root().push_field("name"),
            "Too small",
        );

        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            json!({
                "code": "too_small",
                "origin": "string",
                "minimum": 3.0,
                "inclusive": true,
                "path": ["name"],
                "message": "Too small"
            })
        );
    }

    #[test]
    fn test_display_marks_root() {
        let issue = Issue::new(IssueKind::custom(), JsonPath::root(), "bad");
        assert_eq!(issue.to_string(), "(root): bad");
    }

    #[test]
    fn test_format_number_drops_trailing_zero() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-10.0), "-10");
    }
}
