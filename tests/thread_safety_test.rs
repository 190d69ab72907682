//! Tests for sharing schemas across threads.

use inquest::{DynSchema, Schema, SchemaExt, SchemaLike};
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;

fn user() -> DynSchema {
    Schema::object()
        .field("name", Schema::string())
        .field("age", Schema::int().positive())
        .into_shared()
}

#[test]
fn test_concurrent_validation() {
    let schema = user();

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let result = schema.safe_parse(&json!({
                    "name": format!("User{}", i),
                    "age": 20 + i
                }));
                assert!(result.is_success());
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_concurrent_failures_are_independent() {
    let schema = user();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let input = if i % 2 == 0 {
                    json!({"name": "ok", "age": 1})
                } else {
                    json!({"name": i, "age": -i})
                };
                let result = schema.parse(&input);
                (i, result.map_err(|e| e.len()))
            })
        })
        .collect();

    for handle in handles {
        let (i, result) = handle.join().unwrap();
        if i % 2 == 0 {
            assert!(result.is_ok());
        } else {
            assert_eq!(result, Err(2));
        }
    }
}

#[test]
fn test_lazy_schema_initializes_once_under_contention() {
    let schema = Arc::new(Schema::lazy(|| Schema::string().min_len(2).into_shared()));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || schema.safe_parse(&json!("ab")).is_success())
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert!(schema.is_initialized());
}

#[test]
fn test_recursive_schema_across_threads() {
    let tree: DynSchema = Schema::recursive(|node| {
        Schema::object()
            .field("value", Schema::number())
            .optional_field("children", Schema::array(node))
    })
    .into_shared();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let input = json!({"value": i, "children": [{"value": i + 1}]});
                tree.safe_parse(&input).is_success()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn test_parallel_batch_keeps_input_order() {
    let schema = Schema::int().non_negative();
    let inputs: Vec<Value> = (0..200)
        .map(|i| if i % 7 == 0 { json!(-1) } else { json!(i) })
        .collect();

    let results = schema.safe_parse_par(&inputs);

    assert_eq!(results.len(), inputs.len());
    for (i, result) in results.into_iter().enumerate() {
        match result.into_result() {
            Ok(value) => assert_eq!(value, json!(i)),
            Err(errors) => {
                assert_eq!(i % 7, 0);
                assert_eq!(errors.first().code(), "too_small");
            }
        }
    }
}
