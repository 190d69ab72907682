//! Message resolution.
//!
//! Validators never format user-facing text themselves: they hand an
//! [`IssueKind`] to a [`MessageResolver`] and fall back to
//! [`IssueKind::fallback_message`] when the resolver has nothing to say.
//!
//! A process-wide default resolver can be installed with
//! [`set_default_resolver`]. It is read once when a
//! [`ValidationContext`](crate::ValidationContext) is created, so an
//! in-flight parse keeps the resolver it started with.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{format_number, IssueKind, SizeOrigin};

/// Produces human text for an issue kind.
///
/// Returning `None` defers to the kind's fallback message. Closures of type
/// `Fn(&IssueKind) -> Option<String>` are resolvers.
///
/// # Example
///
/// ```rust
/// use inquest::locale::{EnglishMessages, Layered, MessageResolver};
/// use inquest::IssueKind;
///
/// let terse = |kind: &IssueKind| match kind {
///     IssueKind::InvalidType { expected, .. } => Some(format!("need {}", expected)),
///     _ => None,
/// };
/// let resolver = Layered::new(terse, EnglishMessages);
///
/// let kind = IssueKind::invalid_type("string", "number");
/// assert_eq!(resolver.resolve(&kind).as_deref(), Some("need string"));
/// ```
pub trait MessageResolver: Send + Sync {
    /// Returns the message for `kind`, or None to use the fallback.
    fn resolve(&self, kind: &IssueKind) -> Option<String>;
}

impl<F> MessageResolver for F
where
    F: Fn(&IssueKind) -> Option<String> + Send + Sync,
{
    fn resolve(&self, kind: &IssueKind) -> Option<String> {
        self(kind)
    }
}

/// Tries `primary`, then `secondary`.
#[derive(Debug, Clone)]
pub struct Layered<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> Layered<A, B> {
    /// Layers `primary` over `secondary`.
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: MessageResolver, B: MessageResolver> MessageResolver for Layered<A, B> {
    fn resolve(&self, kind: &IssueKind) -> Option<String> {
        self.primary
            .resolve(kind)
            .or_else(|| self.secondary.resolve(kind))
    }
}

/// The built-in English message table.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishMessages;

fn join_values(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("|")
}

fn bound(origin: SizeOrigin, op: &str, limit: f64) -> String {
    match origin.unit() {
        Some(unit) => format!(
            "expected {} to have {}{} {}",
            origin,
            op,
            format_number(limit),
            unit
        ),
        None => format!("expected {} to be {}{}", origin, op, format_number(limit)),
    }
}

impl MessageResolver for EnglishMessages {
    fn resolve(&self, kind: &IssueKind) -> Option<String> {
        let message = match kind {
            IssueKind::InvalidType { expected, received } => {
                format!("Invalid input: expected {}, received {}", expected, received)
            }
            IssueKind::TooSmall {
                origin,
                minimum,
                inclusive,
            } => {
                let op = if *inclusive { ">=" } else { ">" };
                format!("Too small: {}", bound(*origin, op, *minimum))
            }
            IssueKind::TooBig {
                origin,
                maximum,
                inclusive,
            } => {
                let op = if *inclusive { "<=" } else { "<" };
                format!("Too big: {}", bound(*origin, op, *maximum))
            }
            IssueKind::InvalidFormat { format, pattern } => match pattern {
                Some(pattern) => format!("Invalid string: must match pattern {}", pattern),
                None => format!("Invalid {}", format),
            },
            IssueKind::NotMultipleOf { divisor } => {
                format!("Invalid number: must be a multiple of {}", format_number(*divisor))
            }
            IssueKind::UnrecognizedKeys { keys } => {
                let quoted: Vec<String> = keys.iter().map(|k| format!("\"{}\"", k)).collect();
                let noun = if keys.len() == 1 { "key" } else { "keys" };
                format!("Unrecognized {}: {}", noun, quoted.join(", "))
            }
            IssueKind::InvalidUnion { note, .. } => match note {
                Some(note) => format!("Invalid input: {}", note),
                None => "Invalid input".to_string(),
            },
            IssueKind::InvalidLiteral { expected } if expected.len() == 1 => {
                format!("Invalid input: expected {}", expected[0])
            }
            IssueKind::InvalidLiteral { expected } => {
                format!("Invalid option: expected one of {}", join_values(expected))
            }
            IssueKind::InvalidEnumValue { options } => {
                format!("Invalid option: expected one of {}", join_values(options))
            }
            IssueKind::InvalidDiscriminator { options, .. } => format!(
                "Invalid discriminator value: expected one of {}",
                join_values(options)
            ),
            IssueKind::InvalidKey { .. } => "Invalid key in record".to_string(),
            IssueKind::InvalidIntersectionTypes => {
                "Intersection results could not be merged".to_string()
            }
            IssueKind::Custom { .. } => "Invalid input".to_string(),
            IssueKind::Transform { reason } => format!("Transform failed: {}", reason),
            IssueKind::DecodeFailed { reason } => format!("Decode failed: {}", reason),
            IssueKind::EncodeFailed { reason } => format!("Encode failed: {}", reason),
            IssueKind::AsyncUnsupported => concat!(
                "Encountered an asynchronous check during synchronous validation; ",
                "use the async entry point"
            )
            .to_string(),
            IssueKind::MaxDepthExceeded { max_depth } => {
                format!("Maximum validation depth of {} exceeded", max_depth)
            }
        };
        Some(message)
    }
}

static DEFAULT_RESOLVER: RwLock<Option<Arc<dyn MessageResolver>>> =
    parking_lot::const_rwlock(None);

fn english() -> Arc<dyn MessageResolver> {
    static ENGLISH: OnceLock<Arc<dyn MessageResolver>> = OnceLock::new();
    Arc::clone(ENGLISH.get_or_init(|| Arc::new(EnglishMessages)))
}

/// Installs `resolver` as the process-wide default.
///
/// Contexts created afterwards use it; contexts already created keep the
/// resolver they captured.
pub fn set_default_resolver<R: MessageResolver + 'static>(resolver: R) {
    *DEFAULT_RESOLVER.write() = Some(Arc::new(resolver));
}

/// Restores [`EnglishMessages`] as the process-wide default.
pub fn reset_default_resolver() {
    *DEFAULT_RESOLVER.write() = None;
}

/// Returns the current process-wide default resolver.
pub fn default_resolver() -> Arc<dyn MessageResolver> {
    match DEFAULT_RESOLVER.read().as_ref() {
        Some(resolver) => Arc::clone(resolver),
        None => english(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_english_invalid_type() {
        let msg = EnglishMessages.resolve(&IssueKind::invalid_type("string", "undefined"));
        assert_eq!(
            msg.as_deref(),
            Some("Invalid input: expected string, received undefined")
        );
    }

    #[test]
    fn test_english_bounds() {
        let small = IssueKind::TooSmall {
            origin: SizeOrigin::String,
            minimum: 3.0,
            inclusive: true,
        };
        assert_eq!(
            EnglishMessages.resolve(&small).as_deref(),
            Some("Too small: expected string to have >=3 characters")
        );

        let big = IssueKind::TooBig {
            origin: SizeOrigin::Number,
            maximum: 10.0,
            inclusive: false,
        };
        assert_eq!(
            EnglishMessages.resolve(&big).as_deref(),
            Some("Too big: expected number to be <10")
        );
    }

    #[test]
    fn test_english_enum_and_keys() {
        let kind = IssueKind::InvalidEnumValue {
            options: vec![json!("a"), json!("b")],
        };
        assert_eq!(
            EnglishMessages.resolve(&kind).as_deref(),
            Some(r#"Invalid option: expected one of "a"|"b""#)
        );

        let kind = IssueKind::UnrecognizedKeys {
            keys: vec!["x".to_string(), "y".to_string()],
        };
        assert_eq!(
            EnglishMessages.resolve(&kind).as_deref(),
            Some(r#"Unrecognized keys: "x", "y""#)
        );
    }

    #[test]
    fn test_layered_falls_through() {
        let only_custom = |kind: &IssueKind| match kind {
            IssueKind::Custom { .. } => Some("nope".to_string()),
            _ => None,
        };
        let layered = Layered::new(only_custom, EnglishMessages);
        assert_eq!(layered.resolve(&IssueKind::custom()).as_deref(), Some("nope"));
        assert_eq!(
            layered.resolve(&IssueKind::AsyncUnsupported).as_deref(),
            EnglishMessages.resolve(&IssueKind::AsyncUnsupported).as_deref()
        );
    }
}
