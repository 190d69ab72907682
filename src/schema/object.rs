//! Object schema validation.
//!
//! This module provides [`ObjectSchema`] for validating JSON objects against a
//! shape of named fields, with a configurable policy for keys outside the
//! shape and operations that derive new shapes from existing ones.

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::{Map, Value};
use stillwater::Validation;

use crate::error::{finish, Issue, IssueKind, SchemaBuildError};
use crate::path::JsonPath;
use crate::schema::primitive::EnumSchema;
use crate::schema::traits::{type_mismatch, DynSchema, FastCheck, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::schema::wrappers::OptionalSchema;
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// Keys never copied from input into output, whatever the unknown-key mode.
pub(crate) const RESERVED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

pub(crate) fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Definition of a field within an object schema.
#[derive(Clone)]
struct FieldDef {
    schema: DynSchema,
    fast: Option<FastCheck>,
}

impl FieldDef {
    fn new(schema: DynSchema) -> Self {
        let fast = schema.fast_check();
        Self { schema, fast }
    }

    fn passes_fast(&self, value: &Value) -> bool {
        self.fast.is_some_and(|fast| fast.check(value))
    }

    fn validate(
        &self,
        value: Option<&Value>,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        match value {
            Some(v) if self.passes_fast(v) => Validation::Success(Some(v.clone())),
            Some(v) => match self.schema.validate(v, path, ctx) {
                Validation::Success(out) => Validation::Success(Some(out)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            None => self.schema.validate_missing(path, ctx),
        }
    }

    async fn validate_async(
        &self,
        value: Option<&Value>,
        path: JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        match value {
            Some(v) if self.passes_fast(v) => Validation::Success(Some(v.clone())),
            Some(v) => match self.schema.validate_async(v, &path, ctx).await {
                Validation::Success(out) => Validation::Success(Some(out)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            None => self.schema.validate_missing_async(&path, ctx).await,
        }
    }
}

/// How to handle keys not declared in the shape.
#[derive(Clone, Default)]
pub enum UnknownKeys {
    /// Drop unknown keys from the output.
    #[default]
    Strip,
    /// Report unknown keys as one `unrecognized_keys` issue.
    Strict,
    /// Copy unknown keys into the output unchanged.
    Passthrough,
    /// Validate unknown keys against a schema.
    Catchall(DynSchema),
}

/// A schema for validating JSON objects.
///
/// Every declared field is validated, and all field failures are accumulated
/// rather than short-circuiting on the first bad field. Absent keys are
/// validated as absent, so only fields whose schema accepts absence may be
/// left out.
///
/// The output holds the declared fields in shape order followed by any
/// surviving unknown keys in input order.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::json;
///
/// let user = Schema::object()
///     .field("name", Schema::string().min_len(1))
///     .field("age", Schema::int().positive())
///     .optional_field("email", Schema::string())
///     .strict();
///
/// assert!(user.parse(&json!({"name": "Alice", "age": 30})).is_ok());
///
/// let err = user.parse(&json!({"name": "", "age": -1, "extra": true})).unwrap_err();
/// assert_eq!(err.len(), 3);
/// ```
#[derive(Clone, Default)]
pub struct ObjectSchema {
    fields: IndexMap<String, FieldDef>,
    unknown: UnknownKeys,
    type_error_message: Option<String>,
}

impl ObjectSchema {
    /// Creates a new object schema with no fields.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_fields(&self, fields: IndexMap<String, FieldDef>) -> Self {
        Self {
            fields,
            unknown: self.unknown.clone(),
            type_error_message: self.type_error_message.clone(),
        }
    }

    /// Adds a field, replacing any existing field of the same name.
    ///
    /// The key must be present unless `schema` accepts absence, e.g. through
    /// [`optional`](crate::SchemaExt::optional) or
    /// [`default`](crate::SchemaExt::default).
    pub fn field<S>(mut self, name: impl Into<String>, schema: S) -> Self
    where
        S: SchemaLike + 'static,
    {
        self.fields
            .insert(name.into(), FieldDef::new(schema.into_shared()));
        self
    }

    /// Adds a field that may be absent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde_json::json;
    ///
    /// let schema = Schema::object().optional_field("nickname", Schema::string());
    /// assert_eq!(schema.parse(&json!({})).unwrap(), json!({}));
    /// ```
    pub fn optional_field<S>(self, name: impl Into<String>, schema: S) -> Self
    where
        S: SchemaLike + 'static,
    {
        self.field(name, OptionalSchema::new(schema.into_shared()))
    }

    /// Rejects keys outside the shape.
    pub fn strict(mut self) -> Self {
        self.unknown = UnknownKeys::Strict;
        self
    }

    /// Drops keys outside the shape. This is the default.
    pub fn strip(mut self) -> Self {
        self.unknown = UnknownKeys::Strip;
        self
    }

    /// Copies keys outside the shape into the output.
    ///
    /// The keys `__proto__`, `constructor` and `prototype` are never copied.
    pub fn passthrough(mut self) -> Self {
        self.unknown = UnknownKeys::Passthrough;
        self
    }

    /// Validates keys outside the shape against `schema`.
    pub fn catchall<S>(mut self, schema: S) -> Self
    where
        S: SchemaLike + 'static,
    {
        self.unknown = UnknownKeys::Catchall(schema.into_shared());
        self
    }

    /// Sets the message used when the input is not an object.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.type_error_message = Some(message.into());
        self
    }

    /// A new schema where every field may be absent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde_json::json;
    ///
    /// let user = Schema::object().field("name", Schema::string());
    /// let patch = user.partial();
    ///
    /// assert!(user.parse(&json!({})).is_err());
    /// assert!(patch.parse(&json!({})).is_ok());
    /// assert!(patch.required().parse(&json!({})).is_err());
    /// ```
    pub fn partial(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, def)| {
                let optional = OptionalSchema::new(def.schema.clone()).into_shared();
                (name.clone(), FieldDef::new(optional))
            })
            .collect();
        self.with_fields(fields)
    }

    /// A new schema where the named fields may be absent.
    pub fn partial_keys(&self, keys: &[&str]) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, def)| {
                let def = if keys.contains(&name.as_str()) {
                    FieldDef::new(OptionalSchema::new(def.schema.clone()).into_shared())
                } else {
                    def.clone()
                };
                (name.clone(), def)
            })
            .collect();
        self.with_fields(fields)
    }

    /// A new schema with every `optional` wrapper removed from every field.
    pub fn required(&self) -> Self {
        let fields = self
            .fields
            .iter()
            .map(|(name, def)| {
                let mut schema = def.schema.clone();
                while let Some(inner) = schema.unwrap_optional() {
                    schema = inner;
                }
                (name.clone(), FieldDef::new(schema))
            })
            .collect();
        self.with_fields(fields)
    }

    /// A new schema with the fields of `more` added; colliding keys take the
    /// field from `more`.
    pub fn extend(&self, more: &ObjectSchema) -> Self {
        let mut fields = self.fields.clone();
        for (name, def) in &more.fields {
            fields.insert(name.clone(), def.clone());
        }
        self.with_fields(fields)
    }

    /// Like [`extend`](Self::extend), but refuses to shadow existing keys.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaBuildError::KeyCollision`] naming the first key of
    /// `more` that the shape already declares.
    pub fn safe_extend(&self, more: &ObjectSchema) -> Result<Self, SchemaBuildError> {
        if let Some(name) = more.fields.keys().find(|name| self.fields.contains_key(*name)) {
            tracing::debug!(key = name.as_str(), "safe_extend rejected a colliding key");
            return Err(SchemaBuildError::KeyCollision(name.clone()));
        }
        Ok(self.extend(more))
    }

    /// A new schema combining both shapes, taking the unknown-key policy of
    /// `other`.
    pub fn merge(&self, other: &ObjectSchema) -> Self {
        let mut merged = self.extend(other);
        merged.unknown = other.unknown.clone();
        merged
    }

    /// A new schema keeping only the named fields, in shape order.
    pub fn pick(&self, keys: &[&str]) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| keys.contains(&name.as_str()))
            .map(|(name, def)| (name.clone(), def.clone()))
            .collect();
        self.with_fields(fields)
    }

    /// A new schema without the named fields.
    pub fn omit(&self, keys: &[&str]) -> Self {
        let fields = self
            .fields
            .iter()
            .filter(|(name, _)| !keys.contains(&name.as_str()))
            .map(|(name, def)| (name.clone(), def.clone()))
            .collect();
        self.with_fields(fields)
    }

    /// An enum of the declared keys, in shape order.
    pub fn keyof(&self) -> EnumSchema {
        EnumSchema::new(self.fields.keys().map(|k| Value::String(k.clone())).collect())
    }

    /// The declared fields and their schemas, in shape order.
    pub fn shape(&self) -> impl Iterator<Item = (&str, &DynSchema)> {
        self.fields.iter().map(|(name, def)| (name.as_str(), &def.schema))
    }

    /// The schema of one field.
    pub fn get(&self, name: &str) -> Option<&DynSchema> {
        self.fields.get(name).map(|def| &def.schema)
    }

    /// The declared keys, in shape order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The policy for keys outside the shape.
    pub fn unknown_keys(&self) -> &UnknownKeys {
        &self.unknown
    }

    fn extras<'v>(
        &'v self,
        obj: &'v Map<String, Value>,
    ) -> impl Iterator<Item = (&'v String, &'v Value)> {
        obj.iter().filter(|(key, _)| !self.fields.contains_key(key.as_str()))
    }

    /// Builds the output from per-field results and, for catchall mode,
    /// per-key results of the unknown keys.
    fn assemble(
        &self,
        value: &Value,
        obj: &Map<String, Value>,
        field_results: Vec<ValidationResult<Option<Value>>>,
        catchall_results: Vec<(String, ValidationResult<Value>)>,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let mut output = Map::new();
        let mut issues: Vec<Issue> = Vec::new();

        for (name, result) in self.fields.keys().zip(field_results) {
            match result {
                Validation::Success(Some(v)) => {
                    output.insert(name.clone(), v);
                }
                Validation::Success(None) => {}
                Validation::Failure(err) => issues.extend(err),
            }
        }

        match &self.unknown {
            UnknownKeys::Strip => {}
            UnknownKeys::Strict => {
                let keys: Vec<String> = self.extras(obj).map(|(key, _)| key.clone()).collect();
                if !keys.is_empty() {
                    issues.push(ctx.issue(IssueKind::UnrecognizedKeys { keys }, path, Some(value)));
                }
            }
            UnknownKeys::Passthrough => {
                for (key, v) in self.extras(obj) {
                    if !is_reserved(key) {
                        output.insert(key.clone(), v.clone());
                    }
                }
            }
            UnknownKeys::Catchall(_) => {
                for (key, result) in catchall_results {
                    match result {
                        Validation::Success(v) => {
                            output.insert(key, v);
                        }
                        Validation::Failure(err) => issues.extend(err),
                    }
                }
            }
        }

        finish(Value::Object(output), issues)
    }

    fn catchall_targets<'v>(&'v self, obj: &'v Map<String, Value>) -> Vec<(&'v String, &'v Value)> {
        match self.unknown {
            UnknownKeys::Catchall(_) => {
                self.extras(obj).filter(|(key, _)| !is_reserved(key)).collect()
            }
            _ => Vec::new(),
        }
    }

    fn type_error<T>(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        type_mismatch("object", value, path, ctx, self.type_error_message.as_deref())
    }
}

impl SchemaLike for ObjectSchema {
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

        let field_results = self
            .fields
            .iter()
            .map(|(name, def)| def.validate(obj.get(name), &path.push_field(name), ctx))
            .collect();

        let catchall_results = match &self.unknown {
            UnknownKeys::Catchall(schema) => self
                .catchall_targets(obj)
                .into_iter()
                .map(|(key, v)| (key.clone(), schema.validate(v, &path.push_field(key), ctx)))
                .collect(),
            _ => Vec::new(),
        };

        self.assemble(value, obj, field_results, catchall_results, path, ctx)
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

            let field_results = future::join_all(self.fields.iter().map(|(name, def)| {
                def.validate_async(obj.get(name), path.push_field(name), ctx)
            }))
            .await;

            let catchall_results = match &self.unknown {
                UnknownKeys::Catchall(schema) => {
                    let targets = self.catchall_targets(obj);
                    future::join_all(targets.into_iter().map(|(key, v)| async move {
                        let key_path = path.push_field(key);
                        (key.clone(), schema.validate_async(v, &key_path, ctx).await)
                    }))
                    .await
                }
                _ => Vec::new(),
            };

            self.assemble(value, obj, field_results, catchall_results, path, ctx)
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Object
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Object)
    }

    fn as_object(&self) -> Option<&ObjectSchema> {
        Some(self)
    }
}
