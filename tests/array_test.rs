//! Integration tests for array and tuple schema validation.

use inquest::{IssueKind, JsonPath, Schema, SchemaExt, SchemaLike, SizeOrigin};
use serde_json::json;

/// Helper to extract the success value from a Validation
fn unwrap_success<T, E: std::fmt::Debug>(v: stillwater::Validation<T, E>) -> T {
    v.into_result().unwrap()
}

/// Helper to extract the error value from a Validation
fn unwrap_failure<T, E>(v: stillwater::Validation<T, E>) -> E
where
    T: std::fmt::Debug,
{
    v.into_result().unwrap_err()
}

// ====== Array Tests ======

#[test]
fn test_array_of_strings() {
    let schema = Schema::array(Schema::string());
    assert!(schema.safe_parse(&json!(["a", "b"])).is_success());
    assert!(schema.safe_parse(&json!([])).is_success());
}

#[test]
fn test_array_of_objects() {
    let schema = Schema::array(
        Schema::object()
            .field("id", Schema::int().positive())
            .field("name", Schema::string()),
    );

    let result = schema.safe_parse(&json!([
        {"id": 1, "name": "a", "extra": true},
        {"id": 2, "name": "b"}
    ]));
    assert_eq!(
        unwrap_success(result),
        json!([{"id": 1, "name": "a"}, {"id": 2, "name": "b"}])
    );
}

#[test]
fn test_length_constraints() {
    let schema = Schema::array(Schema::number()).min_len(2).max_len(3);
    assert!(schema.safe_parse(&json!([1, 2])).is_success());

    let errors = unwrap_failure(schema.safe_parse(&json!([1])));
    assert_eq!(
        errors.first().kind,
        IssueKind::TooSmall {
            origin: SizeOrigin::Array,
            minimum: 2.0,
            inclusive: true,
        }
    );
    assert_eq!(errors.first().message, "Too small: expected array to have >=2 items");

    let errors = unwrap_failure(schema.safe_parse(&json!([1, 2, 3, 4])));
    assert_eq!(errors.first().code(), "too_big");

    let errors = unwrap_failure(Schema::array(Schema::any()).non_empty().safe_parse(&json!([])));
    assert_eq!(errors.first().code(), "too_small");
}

#[test]
fn test_non_array_produces_invalid_type() {
    let errors = unwrap_failure(Schema::array(Schema::string()).safe_parse(&json!({"0": "a"})));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().kind, IssueKind::invalid_type("array", "object"));
}

#[test]
fn test_error_accumulation_multiple_invalid_items() {
    let schema = Schema::array(Schema::string());
    let errors = unwrap_failure(schema.safe_parse(&json!(["ok", 1, "ok", false])));

    let paths: Vec<String> = errors.iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["[1]", "[3]"]);
}

#[test]
fn test_error_accumulation_length_and_items() {
    let schema = Schema::array(Schema::string()).min_len(3);
    let errors = unwrap_failure(schema.safe_parse(&json!([1])));

    let codes: Vec<&str> = errors.iter().map(|i| i.code()).collect();
    assert_eq!(codes, vec!["too_small", "invalid_type"]);
}

#[test]
fn test_nested_array_path_tracking() {
    let schema = Schema::object().field(
        "users",
        Schema::array(Schema::object().field("tags", Schema::array(Schema::string()))),
    );

    let errors = unwrap_failure(schema.safe_parse(&json!({
        "users": [{"tags": ["a"]}, {"tags": ["b", 2]}]
    })));
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.first().path,
        JsonPath::root()
            .push_field("users")
            .push_index(1)
            .push_field("tags")
            .push_index(1)
    );
    assert_eq!(errors.first().path.to_string(), "users[1].tags[1]");
}

#[test]
fn test_items_are_transformed() {
    let schema = Schema::array(Schema::string().map(|v| json!(v.as_str().map(str::len))));
    assert_eq!(unwrap_success(schema.safe_parse(&json!(["ab", "abc"]))), json!([2, 3]));
}

#[test]
fn test_array_sugar() {
    let schema = Schema::int().array().max_len(2);
    assert!(schema.safe_parse(&json!([1, 2])).is_success());
    assert!(schema.safe_parse(&json!([1, 2, 3])).is_failure());
}

// ====== Tuple Tests ======

#[test]
fn test_tuple_positions() {
    let schema = Schema::tuple(vec![
        Schema::string().into_shared(),
        Schema::int().into_shared(),
    ]);

    assert!(schema.safe_parse(&json!(["a", 1])).is_success());

    let errors = unwrap_failure(schema.safe_parse(&json!([1, "a"])));
    let paths: Vec<String> = errors.iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["[0]", "[1]"]);
}

#[test]
fn test_tuple_length_checks() {
    let schema = Schema::tuple(vec![
        Schema::string().into_shared(),
        Schema::int().into_shared(),
    ]);

    let errors = unwrap_failure(schema.safe_parse(&json!(["a"])));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code(), "too_small");

    let errors = unwrap_failure(schema.safe_parse(&json!(["a", 1, 2])));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().code(), "too_big");
}

#[test]
fn test_tuple_trailing_optional_and_rest() {
    let schema = Schema::tuple(vec![
        Schema::string().into_shared(),
        Schema::int().optional().into_shared(),
    ])
    .rest(Schema::boolean());

    assert_eq!(unwrap_success(schema.safe_parse(&json!(["a"]))), json!(["a"]));
    assert!(schema.safe_parse(&json!(["a", 1, true, false])).is_success());

    let errors = unwrap_failure(schema.safe_parse(&json!(["a", 1, true, "x"])));
    assert_eq!(errors.first().path, JsonPath::from_index(3));
}

#[test]
fn test_tuple_non_array() {
    let schema = Schema::tuple(vec![Schema::string().into_shared()]);
    let errors = unwrap_failure(schema.safe_parse(&json!("a")));
    assert_eq!(errors.first().kind, IssueKind::invalid_type("tuple", "string"));
}
