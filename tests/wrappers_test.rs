//! Integration tests for presence wrappers, fallbacks and markers.

use inquest::{IssueKind, Schema, SchemaBuildError, SchemaExt, SchemaKind, SchemaLike, StringSchema};
use serde_json::json;
use stillwater::Validation;

fn unwrap_success<T, E: std::fmt::Debug>(v: Validation<T, E>) -> T {
    v.into_result().unwrap()
}

fn unwrap_failure<T: std::fmt::Debug, E>(v: Validation<T, E>) -> E {
    v.into_result().unwrap_err()
}

// ====== Presence Tests ======

#[test]
fn test_optional() {
    let schema = Schema::string().optional();
    assert_eq!(unwrap_success(schema.safe_parse_missing()), None);
    assert!(schema.safe_parse(&json!("x")).is_success());

    let errors = unwrap_failure(schema.safe_parse(&json!(null)));
    assert_eq!(errors.first().kind, IssueKind::invalid_type("string", "null"));
    assert_eq!(schema.unwrap_optional().map(|s| s.kind()), Some(SchemaKind::String));
}

#[test]
fn test_nullable() {
    let schema = Schema::number().nullable();
    assert_eq!(unwrap_success(schema.safe_parse(&json!(null))), json!(null));
    assert!(schema.safe_parse(&json!(1)).is_success());

    let errors = unwrap_failure(schema.safe_parse_missing());
    assert_eq!(errors.first().kind, IssueKind::invalid_type("number", "undefined"));
}

#[test]
fn test_nullish() {
    let schema = Schema::boolean().nullish();
    assert!(schema.safe_parse(&json!(null)).is_success());
    assert_eq!(unwrap_success(schema.safe_parse_missing()), None);
    assert!(schema.safe_parse(&json!("true")).is_failure());
}

#[test]
fn test_optional_field_in_object() {
    let schema = Schema::object()
        .field("a", Schema::string().optional())
        .field("b", Schema::string().nullable().optional());

    assert_eq!(unwrap_success(schema.safe_parse(&json!({}))), json!({}));
    assert_eq!(
        unwrap_success(schema.safe_parse(&json!({"b": null}))),
        json!({"b": null})
    );
}

// ====== Fallback Tests ======

#[test]
fn test_default_fills_in_missing_values() {
    let schema = Schema::int().min(1.0).default(json!(10)).unwrap();

    assert_eq!(unwrap_success(schema.safe_parse_missing()), Some(json!(10)));
    assert_eq!(unwrap_success(schema.safe_parse(&json!(3))), json!(3));
    assert!(schema.safe_parse(&json!(0)).is_failure());
    assert_eq!(schema.default_value(), &json!(10));
}

#[test]
fn test_default_must_satisfy_its_schema() {
    let result = Schema::string().min_len(3).default(json!("ab"));
    match result {
        Err(SchemaBuildError::InvalidDefault { value, source }) => {
            assert_eq!(value, json!("ab"));
            assert_eq!(source.first().code(), "too_small");
        }
        Err(other) => panic!("unexpected build error {other}"),
        Ok(_) => panic!("default should have been rejected"),
    }
}

#[test]
fn test_default_is_not_transformed() {
    let counter = Schema::string()
        .map(|v| json!(v.as_str().map_or(0, str::len)))
        .default(json!("abc"))
        .unwrap();

    assert_eq!(unwrap_success(counter.safe_parse_missing()), Some(json!("abc")));
    assert_eq!(unwrap_success(counter.safe_parse(&json!("abcd"))), json!(4));
}

#[test]
fn test_prefault_runs_the_schema_on_its_value() {
    let schema = Schema::string()
        .map(|v| json!(v.as_str().map_or(0, str::len)))
        .prefault(json!("abc"))
        .unwrap();

    assert_eq!(unwrap_success(schema.safe_parse_missing()), Some(json!(3)));

    let rejected = Schema::int().prefault(json!("x"));
    assert!(matches!(rejected, Err(SchemaBuildError::InvalidPrefault { .. })));
}

#[test]
fn test_catch_replaces_failures() {
    let schema = Schema::int().positive().catch(json!(1)).unwrap();

    assert_eq!(unwrap_success(schema.safe_parse(&json!(5))), json!(5));
    assert_eq!(unwrap_success(schema.safe_parse(&json!(-5))), json!(1));
    assert_eq!(unwrap_success(schema.safe_parse(&json!("junk"))), json!(1));
    assert_eq!(unwrap_success(schema.safe_parse_missing()), Some(json!(1)));
}

#[test]
fn test_catch_fallback_is_checked() {
    let result = Schema::string().catch(json!(0));
    match result {
        Err(err @ SchemaBuildError::InvalidFallback { .. }) => {
            assert!(err.to_string().starts_with("fallback value 0 is rejected"));
        }
        _ => panic!("fallback should have been rejected"),
    }
}

#[test]
fn test_async_schema_trusts_configured_values() {
    let schema = Schema::string().refine_async(|_| async { false }, "never checked");
    assert!(schema.clone().default(json!("x")).is_ok());
    assert!(schema.catch(json!("x")).is_ok());
}

// ====== Marker Tests ======

struct Email;

#[test]
fn test_brand() {
    let schema = Schema::string().pattern("@").unwrap().brand::<Email>();

    let email = schema.parse_branded(&json!("a@b")).unwrap();
    assert_eq!(email.as_str(), Some("a@b"));
    assert_eq!(email.clone().into_inner(), json!("a@b"));

    assert!(schema.parse_branded(&json!("nope")).is_err());
    assert!(schema.safe_parse(&json!("a@b")).is_success());
}

#[test]
fn test_readonly_changes_nothing_but_the_kind() {
    let schema = Schema::array(Schema::number()).readonly();
    assert_eq!(schema.kind(), SchemaKind::Readonly);
    assert_eq!(unwrap_success(schema.safe_parse(&json!([1, 2]))), json!([1, 2]));
    assert!(schema.safe_parse(&json!(["x"])).is_failure());
}

#[test]
fn test_apply_reuses_building_steps() {
    fn username(s: StringSchema) -> StringSchema {
        s.min_len(3).max_len(16)
    }

    let schema = Schema::string().apply(username);
    assert!(schema.safe_parse(&json!("ada")).is_success());
    assert!(schema.safe_parse(&json!("a")).is_failure());
}

#[test]
fn test_pipe_feeds_output_forward() {
    let schema = Schema::string()
        .map(|v| json!(v.as_str().map_or(0, str::len)))
        .pipe(Schema::int().max(3.0));

    assert_eq!(unwrap_success(schema.safe_parse(&json!("abc"))), json!(3));
    let errors = unwrap_failure(schema.safe_parse(&json!("abcd")));
    assert_eq!(errors.first().code(), "too_big");
}
