//! Key/value map validation.

use futures::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};
use stillwater::Validation;

use crate::error::{finish, Issue, IssueKind};
use crate::path::JsonPath;
use crate::schema::object::is_reserved;
use crate::schema::traits::{type_mismatch, DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// How a record treats its key schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    /// Keys must pass the key schema. A literal or enum key schema makes the
    /// record exhaustive.
    Standard,
    /// Like `Standard`, but never exhaustive.
    Partial,
    /// Entries whose key fails the key schema pass through unchanged.
    Loose,
}

/// What happened to one input entry.
enum Entry {
    Keep(String, Value),
    Skip,
    Fail(Vec<Issue>),
}

/// A schema for objects used as maps from keys to values.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let scores = Schema::record(Schema::string().min_len(2), Schema::number());
/// assert!(scores.parse(&json!({"ada": 3, "bob": 5})).is_ok());
///
/// let err = scores.parse(&json!({"x": 1})).unwrap_err();
/// assert_eq!(err.first().code(), "invalid_key");
///
/// // Enum keys make the record exhaustive.
/// let flags = Schema::record(Schema::enumeration(["on", "off"]), Schema::boolean());
/// let err = flags.parse(&json!({"on": true})).unwrap_err();
/// assert_eq!(err.first().path.to_string(), "off");
/// ```
#[derive(Clone)]
pub struct RecordSchema {
    key: DynSchema,
    value: DynSchema,
    mode: RecordMode,
    type_error_message: Option<String>,
}

impl RecordSchema {
    pub(crate) fn new(key: DynSchema, value: DynSchema, mode: RecordMode) -> Self {
        Self {
            key,
            value,
            mode,
            type_error_message: None,
        }
    }

    /// Sets the message used when the input is not an object.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.type_error_message = Some(message.into());
        self
    }

    /// The key/value mode.
    pub fn mode(&self) -> RecordMode {
        self.mode
    }

    /// The keys an exhaustive record requires, in declaration order.
    fn exhaustive_keys(&self) -> Option<Vec<String>> {
        if self.mode != RecordMode::Standard {
            return None;
        }
        let values = self.key.discriminator_values()?;
        values
            .iter()
            .map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect()
    }

    /// Resolves the output key, or the entry outcome if the key failed.
    fn key_outcome(
        &self,
        key: &str,
        value: &Value,
        result: ValidationResult<Value>,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Result<String, Entry> {
        match result {
            Validation::Success(Value::String(s)) => Ok(s),
            Validation::Success(other) => Ok(other.to_string()),
            Validation::Failure(_) if self.mode == RecordMode::Loose => {
                if is_reserved(key) {
                    Err(Entry::Skip)
                } else {
                    Err(Entry::Keep(key.to_string(), value.clone()))
                }
            }
            Validation::Failure(err) => {
                let kind = IssueKind::InvalidKey {
                    issues: err.into_vec(),
                };
                let key_input = Value::String(key.to_string());
                Err(Entry::Fail(vec![ctx.issue(kind, path, Some(&key_input))]))
            }
        }
    }

    fn value_outcome(key: String, result: ValidationResult<Value>) -> Entry {
        match result {
            Validation::Success(v) => Entry::Keep(key, v),
            Validation::Failure(err) => Entry::Fail(err.into_vec()),
        }
    }

    fn entry(&self, key: &str, value: &Value, path: &JsonPath, ctx: &ValidationContext) -> Entry {
        let entry_path = path.push_field(key);
        let key_value = Value::String(key.to_string());
        let key_result = self.key.validate(&key_value, &entry_path, ctx);
        match self.key_outcome(key, value, key_result, &entry_path, ctx) {
            Ok(out_key) => {
                Self::value_outcome(out_key, self.value.validate(value, &entry_path, ctx))
            }
            Err(entry) => entry,
        }
    }

    async fn entry_async(
        &self,
        key: &str,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Entry {
        let entry_path = path.push_field(key);
        let key_value = Value::String(key.to_string());
        let key_result = self.key.validate_async(&key_value, &entry_path, ctx).await;
        match self.key_outcome(key, value, key_result, &entry_path, ctx) {
            Ok(out_key) => {
                let result = self.value.validate_async(value, &entry_path, ctx).await;
                Self::value_outcome(out_key, result)
            }
            Err(entry) => entry,
        }
    }

    fn exhaustive_entry(
        &self,
        key: &str,
        obj: &Map<String, Value>,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Entry {
        let entry_path = path.push_field(key);
        match obj.get(key) {
            Some(v) => {
                Self::value_outcome(key.to_string(), self.value.validate(v, &entry_path, ctx))
            }
            None => Self::missing_outcome(key, self.value.validate_missing(&entry_path, ctx)),
        }
    }

    async fn exhaustive_entry_async(
        &self,
        key: &str,
        obj: &Map<String, Value>,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Entry {
        let entry_path = path.push_field(key);
        match obj.get(key) {
            Some(v) => {
                let result = self.value.validate_async(v, &entry_path, ctx).await;
                Self::value_outcome(key.to_string(), result)
            }
            None => {
                let result = self.value.validate_missing_async(&entry_path, ctx).await;
                Self::missing_outcome(key, result)
            }
        }
    }

    fn missing_outcome(key: &str, result: ValidationResult<Option<Value>>) -> Entry {
        match result {
            Validation::Success(Some(v)) => Entry::Keep(key.to_string(), v),
            Validation::Success(None) => Entry::Skip,
            Validation::Failure(err) => Entry::Fail(err.into_vec()),
        }
    }

    fn unrecognized(
        keys: &[String],
        obj: &Map<String, Value>,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Option<Issue> {
        let unknown: Vec<String> = obj
            .keys()
            .filter(|k| !keys.contains(*k))
            .cloned()
            .collect();
        (!unknown.is_empty())
            .then(|| ctx.issue(IssueKind::UnrecognizedKeys { keys: unknown }, path, Some(value)))
    }

    fn assemble(entries: Vec<Entry>, extra: Option<Issue>) -> ValidationResult<Value> {
        let mut output = Map::new();
        let mut issues = Vec::new();
        for entry in entries {
            match entry {
                Entry::Keep(key, v) => {
                    output.insert(key, v);
                }
                Entry::Skip => {}
                Entry::Fail(found) => issues.extend(found),
            }
        }
        issues.extend(extra);
        finish(Value::Object(output), issues)
    }

    fn type_error<T>(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        type_mismatch("record", value, path, ctx, self.type_error_message.as_deref())
    }
}

impl SchemaLike for RecordSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let obj = match value.as_object() {
            Some(o) => o,
            None => return self.type_error(value, path, ctx),
        };

        match self.exhaustive_keys() {
            Some(keys) => {
                let entries = keys
                    .iter()
                    .map(|key| self.exhaustive_entry(key, obj, path, ctx))
                    .collect();
                Self::assemble(entries, Self::unrecognized(&keys, obj, value, path, ctx))
            }
            None => {
                let entries = obj
                    .iter()
                    .map(|(key, v)| self.entry(key, v, path, ctx))
                    .collect();
                Self::assemble(entries, None)
            }
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let obj = match value.as_object() {
                Some(o) => o,
                None => return self.type_error(value, path, ctx),
            };

            match self.exhaustive_keys() {
                Some(keys) => {
                    let entries = future::join_all(
                        keys.iter()
                            .map(|key| self.exhaustive_entry_async(key, obj, path, ctx)),
                    )
                    .await;
                    Self::assemble(entries, Self::unrecognized(&keys, obj, value, path, ctx))
                }
                None => {
                    let pending = obj.iter().map(|(key, v)| self.entry_async(key, v, path, ctx));
                    let entries = future::join_all(pending).await;
                    Self::assemble(entries, None)
                }
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Record
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::SchemaExt;
    use serde_json::json;

    #[test]
    fn test_key_failure_is_invalid_key_at_entry() {
        let key = Schema::string().pattern("^[a-z]+$").unwrap();
        let schema = Schema::record(key, Schema::number());
        let err = schema.parse(&json!({"ok": 1, "NO": 2})).unwrap_err();
        assert_eq!(err.len(), 1);
        let issue = err.first();
        assert_eq!(issue.path, JsonPath::from_field("NO"));
        match &issue.kind {
            IssueKind::InvalidKey { issues } => assert_eq!(issues[0].code(), "invalid_format"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_key_schema_can_rewrite_keys() {
        let schema = Schema::record(
            Schema::string().map(|k| json!(k.as_str().map(str::to_uppercase))),
            Schema::any(),
        );
        assert_eq!(schema.parse(&json!({"a": 1})).unwrap(), json!({"A": 1}));
    }

    #[test]
    fn test_exhaustive_record_reports_missing_and_unknown() {
        let schema = Schema::record(Schema::enumeration(["a", "b"]), Schema::number());
        let err = schema.parse(&json!({"a": 1, "z": 0})).unwrap_err();
        let codes: Vec<&str> = err.iter().map(|i| i.code()).collect();
        assert_eq!(codes, vec!["invalid_type", "unrecognized_keys"]);
        assert_eq!(err.first().path, JsonPath::from_field("b"));
    }

    #[test]
    fn test_partial_record_is_not_exhaustive() {
        let schema = Schema::partial_record(Schema::enumeration(["a", "b"]), Schema::number());
        assert_eq!(schema.parse(&json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(
            schema.parse(&json!({"c": 1})).unwrap_err().first().code(),
            "invalid_key"
        );
    }

    #[test]
    fn test_loose_record_passes_failing_keys_through() {
        let key = Schema::string().pattern("^n_").unwrap();
        let schema = Schema::loose_record(key, Schema::number());
        let out = schema
            .parse(&json!({"n_a": 1, "other": "kept", "__proto__": 1}))
            .unwrap();
        assert_eq!(out, json!({"n_a": 1, "other": "kept"}));
        assert!(schema.parse(&json!({"n_a": "x"})).is_err());
    }
}
