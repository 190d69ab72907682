//! Integration tests for object schema validation.

use inquest::{IssueKind, JsonPath, Schema, SchemaBuildError, SchemaExt, SchemaKind, SchemaLike};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn unwrap_success<T, E: std::fmt::Debug>(v: stillwater::Validation<T, E>) -> T {
    v.into_result().unwrap()
}

fn unwrap_failure<T, E>(v: stillwater::Validation<T, E>) -> E
where
    T: std::fmt::Debug,
{
    v.into_result().unwrap_err()
}

fn person() -> inquest::ObjectSchema {
    Schema::object()
        .field("name", Schema::string())
        .field("age", Schema::number())
}

// ====== Field Tests ======

#[test]
fn test_empty_input_reports_every_missing_field() {
    let errors = unwrap_failure(person().safe_parse(&json!({})));

    assert!(errors.len() >= 2);
    let paths: Vec<JsonPath> = errors.iter().map(|i| i.path.clone()).collect();
    assert!(paths.contains(&JsonPath::from_field("name")));
    assert!(paths.contains(&JsonPath::from_field("age")));
    assert_eq!(
        errors.first().kind,
        IssueKind::invalid_type("string", "undefined")
    );
}

#[test]
fn test_field_failures_aggregate() {
    let schema = Schema::object()
        .field("email", Schema::string().min_len(3))
        .field("age", Schema::int().non_negative())
        .field("tags", Schema::array(Schema::string()));

    let errors = unwrap_failure(schema.safe_parse(&json!({
        "email": "a",
        "age": -1,
        "tags": ["ok", 3]
    })));
    let paths: Vec<String> = errors.iter().map(|i| i.path.to_string()).collect();
    assert_eq!(paths, vec!["email", "age", "tags[1]"]);
}

#[test]
fn test_non_object_input() {
    let cases = [
        (json!(null), "null"),
        (json!([1]), "array"),
        (json!("x"), "string"),
    ];
    for (value, received) in cases {
        let errors = unwrap_failure(person().safe_parse(&value));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().kind, IssueKind::invalid_type("object", received));
    }

    let errors = unwrap_failure(person().error("expected a person").safe_parse(&json!(1)));
    assert_eq!(errors.first().message, "expected a person");
}

#[test]
fn test_optional_and_default_fields() {
    let schema = Schema::object()
        .field("name", Schema::string())
        .optional_field("nickname", Schema::string())
        .field("role", Schema::string().default(json!("user")).unwrap());

    let output = unwrap_success(schema.safe_parse(&json!({"name": "Ada"})));
    assert_eq!(output, json!({"name": "Ada", "role": "user"}));

    let input = json!({"name": "Ada", "nickname": "A", "role": "admin"});
    let output = unwrap_success(schema.safe_parse(&input));
    assert_eq!(output, json!({"name": "Ada", "nickname": "A", "role": "admin"}));
}

#[test]
fn test_output_follows_shape_order() {
    let schema = person().passthrough();
    let output = unwrap_success(schema.safe_parse(&json!({"zeta": 1, "age": 2, "name": "n"})));
    let keys: Vec<&String> = output.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["name", "age", "zeta"]);
}

// ====== Unknown Key Tests ======

#[test]
fn test_strip_is_the_default() {
    let input = json!({"name": "a", "age": 1, "extra": true});
    let output = unwrap_success(person().safe_parse(&input));
    assert_eq!(output, json!({"name": "a", "age": 1}));
}

#[test]
fn test_strict_reports_one_issue_naming_all_unknown_keys() {
    let errors = unwrap_failure(
        person()
            .strict()
            .safe_parse(&json!({"name": "a", "age": 1, "x": 1, "y": 2})),
    );

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.first().kind,
        IssueKind::UnrecognizedKeys {
            keys: vec!["x".to_string(), "y".to_string()]
        }
    );
    assert_eq!(errors.first().path, JsonPath::root());
    assert_eq!(errors.first().message, r#"Unrecognized keys: "x", "y""#);
}

#[test]
fn test_passthrough_never_copies_reserved_keys() {
    let schema = Schema::object().field("name", Schema::string()).passthrough();
    let raw = concat!(
        r#"{"name": "x", "__proto__": {"polluted": true}, "#,
        r#""constructor": 1, "prototype": 2, "kept": 3}"#,
    );
    let input: Value = serde_json::from_str(raw).unwrap();

    let output = unwrap_success(schema.safe_parse(&input));
    assert_eq!(output, json!({"name": "x", "kept": 3}));

    let loose = Schema::loose_object().field("name", Schema::string());
    let input = json!({"name": "x", "__proto__": {"polluted": true}});
    let output = unwrap_success(loose.safe_parse(&input));
    assert_eq!(output, json!({"name": "x"}));
}

#[test]
fn test_catchall_validates_unknown_keys() {
    let schema = Schema::object()
        .field("id", Schema::string())
        .catchall(Schema::number());

    let output = unwrap_success(schema.safe_parse(&json!({"id": "a", "x": 1})));
    assert_eq!(output, json!({"id": "a", "x": 1}));

    let errors = unwrap_failure(schema.safe_parse(&json!({"id": "a", "x": "no"})));
    assert_eq!(errors.first().path, JsonPath::from_field("x"));
}

#[test]
fn test_strict_object_factory() {
    let schema = Schema::strict_object().field("a", Schema::any());
    assert!(schema.safe_parse(&json!({"a": 1, "b": 2})).is_failure());
}

// ====== Shape Operation Tests ======

#[test]
fn test_partial_then_required_round_trips() {
    let base = person();
    let partial = base.partial();

    assert_eq!(unwrap_success(partial.safe_parse(&json!({}))), json!({}));

    let original = unwrap_failure(base.safe_parse(&json!({})));
    let restored = unwrap_failure(partial.required().safe_parse(&json!({})));
    assert_eq!(original, restored);
}

#[test]
fn test_required_removes_every_optional_layer() {
    let schema = Schema::object()
        .field("name", Schema::string())
        .optional_field("nick", Schema::string());
    let input = json!({"name": "a"});

    let direct = unwrap_failure(schema.required().safe_parse(&input));
    let through_partial = unwrap_failure(schema.partial().required().safe_parse(&input));

    assert_eq!(direct, through_partial);
    assert_eq!(through_partial.len(), 1);
    assert_eq!(through_partial.first().path, JsonPath::from_field("nick"));
    assert_eq!(
        through_partial.first().kind,
        IssueKind::invalid_type("string", "undefined")
    );
}

#[test]
fn test_partial_keys() {
    let schema = person().partial_keys(&["age"]);
    assert!(schema.safe_parse(&json!({"name": "a"})).is_success());
    assert!(schema.safe_parse(&json!({"age": 1})).is_failure());
}

#[test]
fn test_shape_operations_leave_the_original_untouched() {
    let base = person();
    let _ = base.partial();
    let _ = base.omit(&["age"]);
    let _ = base.extend(&Schema::object().field("age", Schema::string()));

    assert!(base.safe_parse(&json!({"name": "a"})).is_failure());
    assert!(base.safe_parse(&json!({"name": "a", "age": 1})).is_success());
}

#[test]
fn test_extend_new_field_wins() {
    let extended = person().extend(&Schema::object().field("age", Schema::string()));
    assert!(extended.safe_parse(&json!({"name": "a", "age": "old"})).is_success());
    assert!(extended.safe_parse(&json!({"name": "a", "age": 1})).is_failure());
}

#[test]
fn test_safe_extend_rejects_collisions_at_build_time() {
    let result = person().safe_extend(&Schema::object().field("age", Schema::string()));
    match result {
        Err(SchemaBuildError::KeyCollision(key)) => assert_eq!(key, "age"),
        other => panic!("expected key collision, got {:?}", other.map(|s| s.len())),
    }

    let ok = person()
        .safe_extend(&Schema::object().field("email", Schema::string()))
        .unwrap();
    assert_eq!(ok.keys().collect::<Vec<_>>(), vec!["name", "age", "email"]);
}

#[test]
fn test_merge_takes_other_policy() {
    let merged = person().merge(&Schema::object().field("email", Schema::string()).strict());
    let input = json!({"name": "a", "age": 1, "email": "e", "x": 0});
    let errors = unwrap_failure(merged.safe_parse(&input));
    assert_eq!(errors.first().code(), "unrecognized_keys");
}

#[test]
fn test_pick_omit_keyof() {
    let schema = person().field("email", Schema::string());

    let picked = schema.pick(&["email", "name"]);
    assert_eq!(picked.keys().collect::<Vec<_>>(), vec!["name", "email"]);

    let omitted = schema.omit(&["name"]);
    assert_eq!(omitted.keys().collect::<Vec<_>>(), vec!["age", "email"]);

    let keys = schema.keyof();
    assert!(keys.safe_parse(&json!("age")).is_success());
    assert_eq!(
        unwrap_failure(keys.safe_parse(&json!("other"))).first().code(),
        "invalid_enum_value"
    );
}

#[test]
fn test_shape_introspection() {
    let schema = person();
    assert_eq!(schema.len(), 2);
    assert_eq!(schema.kind(), SchemaKind::Object);
    assert_eq!(schema.get("name").map(|s| s.kind()), Some(SchemaKind::String));
    assert!(schema.get("missing").is_none());
}

// ====== Fast Path Tests ======

#[test]
fn test_fast_path_fields_behave_like_full_validation() {
    let fast = Schema::object()
        .field("s", Schema::string())
        .field("n", Schema::number())
        .field("b", Schema::boolean());
    let slow = Schema::object()
        .field("s", Schema::string().max_len(1000))
        .field("n", Schema::number().max(f64::MAX))
        .field("b", Schema::boolean().refine(|_| true, "unused"));

    for input in [
        json!({"s": "x", "n": 1, "b": true}),
        json!({"s": 1, "n": "x", "b": null}),
        json!({"s": "x"}),
    ] {
        assert_eq!(fast.parse(&input), slow.parse(&input));
    }
}
