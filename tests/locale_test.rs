//! Integration tests for message resolution.
//!
//! The process-wide default is only touched by a single test in this binary,
//! so the other tests pass an explicit resolver.

use inquest::locale::{self, EnglishMessages, Layered, MessageResolver};
use inquest::{IssueKind, Schema, SchemaExt, SizeOrigin, ValidationContext};
use serde_json::json;

/// A partial German table.
struct German;

impl MessageResolver for German {
    fn resolve(&self, kind: &IssueKind) -> Option<String> {
        match kind {
            IssueKind::InvalidType { expected, received } => {
                Some(format!("Ungültige Eingabe: {} erwartet, {} erhalten", expected, received))
            }
            IssueKind::TooSmall {
                origin: SizeOrigin::String,
                minimum,
                ..
            } => Some(format!("Zu kurz: mindestens {} Zeichen", minimum)),
            _ => None,
        }
    }
}

#[test]
fn test_context_resolver_localizes_messages() {
    let ctx = ValidationContext::new().with_resolver(Layered::new(German, EnglishMessages));
    let schema = Schema::object()
        .field("name", Schema::string().min_len(2))
        .field("age", Schema::number().min(0.0));

    let errors = schema
        .parse_with(&json!({"name": "a", "age": -1}), &ctx)
        .unwrap_err();
    assert_eq!(
        errors.messages(),
        vec!["Zu kurz: mindestens 2 Zeichen", "Too small: expected number to be >=0"]
    );

    let errors = schema.parse_with(&json!([]), &ctx).unwrap_err();
    assert_eq!(errors.first().message, "Ungültige Eingabe: object erwartet, array erhalten");
}

#[test]
fn test_explicit_messages_win_over_the_resolver() {
    let ctx = ValidationContext::new().with_resolver(German);
    let schema = Schema::string().error("custom text");

    let errors = schema.parse_with(&json!(1), &ctx).unwrap_err();
    assert_eq!(errors.first().message, "custom text");
}

#[test]
fn test_resolver_without_an_answer_uses_the_fallback() {
    let ctx = ValidationContext::new().with_resolver(|_: &IssueKind| -> Option<String> { None });
    let errors = Schema::literal(json!("x")).parse_with(&json!("y"), &ctx).unwrap_err();
    let kind = IssueKind::InvalidLiteral {
        expected: vec![json!("x")],
    };
    assert_eq!(errors.first().message, kind.fallback_message());
}

#[test]
fn test_shared_resolver() {
    let shared: std::sync::Arc<dyn MessageResolver> = std::sync::Arc::new(German);
    let a = ValidationContext::new().with_shared_resolver(shared.clone());
    let b = ValidationContext::new().with_shared_resolver(shared);

    let first = Schema::boolean().parse_with(&json!(0), &a).unwrap_err();
    let second = Schema::boolean().parse_with(&json!(0), &b).unwrap_err();
    assert_eq!(first, second);
    assert!(first.first().message.starts_with("Ungültige Eingabe"));
}

#[test]
fn test_process_default_resolver() {
    let before = ValidationContext::new();

    locale::set_default_resolver(Layered::new(German, EnglishMessages));
    let errors = Schema::string().parse(&json!(1)).unwrap_err();
    assert_eq!(errors.first().message, "Ungültige Eingabe: string erwartet, number erhalten");

    // A context keeps the resolver it was created with.
    let errors = Schema::string().parse_with(&json!(1), &before).unwrap_err();
    assert_eq!(errors.first().message, "Invalid input: expected string, received number");

    locale::reset_default_resolver();
    let errors = Schema::string().parse(&json!(1)).unwrap_err();
    assert_eq!(errors.first().message, "Invalid input: expected string, received number");
    assert_eq!(
        locale::default_resolver().resolve(&IssueKind::custom()).as_deref(),
        Some("Invalid input")
    );
}
