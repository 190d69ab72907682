//! Tagged unions dispatched on a discriminator field.

use std::collections::HashMap;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{IssueKind, SchemaBuildError};
use crate::path::JsonPath;
use crate::schema::traits::{type_mismatch, DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::{TypeSet, ValueType};
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// Index key for a discriminator value. Numbers are keyed by value so `1` and
/// `1.0` select the same option.
fn index_key(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) => format!("{f}"),
            None => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// A union whose option is selected by the value of one field.
///
/// Every option must be an object schema declaring the discriminator with a
/// literal or enum schema, and no two options may share a discriminator
/// value. These rules are checked when the union is built. Dispatch is a
/// single hash lookup, whatever the number of options.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt, SchemaLike};
/// use serde_json::json;
///
/// let shape = Schema::discriminated_union("type", vec![
///     Schema::object()
///         .field("type", Schema::literal(json!("circle")))
///         .field("radius", Schema::number().positive())
///         .into_shared(),
///     Schema::object()
///         .field("type", Schema::literal(json!("square")))
///         .field("side", Schema::number().positive())
///         .into_shared(),
/// ])
/// .unwrap();
///
/// assert!(shape.parse(&json!({"type": "circle", "radius": 1})).is_ok());
///
/// let err = shape.parse(&json!({"type": "square", "side": -1})).unwrap_err();
/// assert_eq!(err.first().path.to_string(), "side");
///
/// let err = shape.parse(&json!({"type": "hexagon"})).unwrap_err();
/// assert_eq!(err.first().code(), "invalid_discriminator");
/// ```
#[derive(Clone)]
pub struct DiscriminatedUnionSchema {
    discriminator: String,
    options: Vec<DynSchema>,
    values: Vec<Value>,
    index: HashMap<String, usize>,
}

impl DiscriminatedUnionSchema {
    pub(crate) fn new(
        discriminator: impl Into<String>,
        options: Vec<DynSchema>,
    ) -> Result<Self, SchemaBuildError> {
        let discriminator = discriminator.into();
        let mut values = Vec::new();
        let mut index = HashMap::new();

        for (position, option) in options.iter().enumerate() {
            let object = option
                .as_object()
                .ok_or(SchemaBuildError::OptionNotObject { index: position })?;
            let field = object
                .get(&discriminator)
                .ok_or_else(|| SchemaBuildError::MissingDiscriminator {
                    index: position,
                    discriminator: discriminator.clone(),
                })?;
            let option_values = field
                .discriminator_values()
                .ok_or_else(|| SchemaBuildError::DiscriminatorNotLiteral {
                    index: position,
                    discriminator: discriminator.clone(),
                })?;

            for value in option_values {
                if index.insert(index_key(&value), position).is_some() {
                    tracing::debug!(
                        discriminator = discriminator.as_str(),
                        %value,
                        "duplicate discriminator value"
                    );
                    return Err(SchemaBuildError::DuplicateDiscriminator {
                        discriminator,
                        value,
                    });
                }
                values.push(value);
            }
        }

        Ok(Self {
            discriminator,
            options,
            values,
            index,
        })
    }

    /// The discriminator field name.
    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// The options in declaration order.
    pub fn options(&self) -> &[DynSchema] {
        &self.options
    }

    /// Every discriminator value, in declaration order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Selects the option for `value`, or reports why none applies.
    fn select(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<&DynSchema> {
        let obj = match value.as_object() {
            Some(o) => o,
            None => return type_mismatch("object", value, path, ctx, None),
        };
        let tag = obj.get(&self.discriminator);
        if let Some(option) = tag
            .and_then(|t| self.index.get(&index_key(t)))
            .and_then(|&i| self.options.get(i))
        {
            return Validation::Success(option);
        }

        tracing::trace!(
            discriminator = self.discriminator.as_str(),
            tag = ?tag,
            "no option for discriminator value"
        );
        ctx.fail(
            IssueKind::InvalidDiscriminator {
                discriminator: self.discriminator.clone(),
                options: self.values.clone(),
            },
            &path.push_field(&self.discriminator),
            tag,
        )
    }
}

impl SchemaLike for DiscriminatedUnionSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.select(value, path, ctx) {
            Validation::Success(option) => option.validate(value, path, ctx),
            Validation::Failure(err) => Validation::Failure(err),
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            match self.select(value, path, ctx) {
                Validation::Success(option) => option.validate_async(value, path, ctx).await,
                Validation::Failure(err) => Validation::Failure(err),
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::DiscriminatedUnion
    }

    fn accepts(&self) -> TypeSet {
        TypeSet::only(ValueType::Object)
    }
}
