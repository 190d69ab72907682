//! Schema definitions.
//!
//! Every schema implements [`SchemaLike`] and gains the entry points and
//! combinators of [`SchemaExt`]. [`Schema`] is the factory for every schema
//! kind. Schemas are immutable once built and are shared across threads as
//! [`DynSchema`].
//!
//! # Example
//!
//! ```rust
//! use inquest::{Schema, SchemaExt};
//! use serde_json::json;
//!
//! let user = Schema::object()
//!     .field("name", Schema::string().min_len(1))
//!     .field("tags", Schema::array(Schema::string()).max_len(3))
//!     .optional_field("age", Schema::int().non_negative());
//!
//! assert!(user.parse(&json!({"name": "Ada", "tags": []})).is_ok());
//!
//! let err = user.parse(&json!({"name": "", "tags": [1]})).unwrap_err();
//! assert_eq!(err.len(), 2);
//! ```

mod array;
mod codec;
mod custom;
mod discriminated;
mod effects;
mod ext;
mod intersection;
mod lazy;
mod numeric;
mod object;
mod pipe;
mod primitive;
mod record;
mod string;
mod traits;
mod tuple;
mod types;
mod union;
mod wrappers;

use std::fmt::Display;
use std::future::Future;

use serde_json::Value;

use crate::error::SchemaBuildError;

pub use array::ArraySchema;
pub use codec::CodecSchema;
pub use custom::CustomSchema;
pub use discriminated::DiscriminatedUnionSchema;
pub use effects::{
    PreprocessSchema, RefineOptions, RefineSchema, RefinementCtx, SuperRefineSchema,
    TransformSchema,
};
pub use ext::SchemaExt;
pub use intersection::IntersectionSchema;
pub use lazy::LazySchema;
pub use numeric::NumberSchema;
pub use object::{ObjectSchema, UnknownKeys};
pub use pipe::PipeSchema;
pub use primitive::{AnySchema, BooleanSchema, EnumSchema, LiteralSchema, NeverSchema, NullSchema};
pub use record::{RecordMode, RecordSchema};
pub use string::StringSchema;
pub use traits::{DynSchema, FastCheck, SchemaKind, SchemaLike};
pub use tuple::TupleSchema;
pub use types::{type_name, TypeSet, ValueType};
pub use union::{UnionSchema, XorSchema};
pub use wrappers::{
    BrandSchema, Branded, CatchSchema, DefaultSchema, NullableSchema, NullishSchema, OptionalSchema,
    PrefaultSchema, ReadonlySchema,
};

use effects::{Callback, Predicate};

/// Entry point for creating schemas.
///
/// Each factory returns a concrete schema type that carries its own builder
/// methods. Aggregates take their children either generically or as
/// [`DynSchema`] lists built with [`into_shared`](SchemaLike::into_shared).
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt, SchemaLike};
/// use serde_json::json;
///
/// let id = Schema::union(vec![
///     Schema::string().min_len(1).into_shared(),
///     Schema::int().positive().into_shared(),
/// ]);
///
/// assert!(id.parse(&json!("a-1")).is_ok());
/// assert!(id.parse(&json!(7)).is_ok());
/// assert_eq!(id.parse(&json!(-7)).unwrap_err().first().code(), "invalid_union");
/// ```
pub struct Schema;

impl Schema {
    /// A string schema.
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde_json::json;
    ///
    /// let schema = Schema::string().min_len(5);
    /// assert!(schema.parse(&json!("hello")).is_ok());
    /// assert!(schema.parse(&json!("hi")).is_err());
    /// ```
    pub fn string() -> StringSchema {
        StringSchema::new()
    }

    /// A finite number schema.
    pub fn number() -> NumberSchema {
        NumberSchema::new()
    }

    /// A number schema that rejects fractions.
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde_json::json;
    ///
    /// let schema = Schema::int().range(0.0..=100.0);
    /// assert!(schema.parse(&json!(50)).is_ok());
    /// assert!(schema.parse(&json!(-5)).is_err());
    /// assert!(schema.parse(&json!(1.5)).is_err());
    /// ```
    pub fn int() -> NumberSchema {
        NumberSchema::new().int()
    }

    pub fn boolean() -> BooleanSchema {
        BooleanSchema::new()
    }

    pub fn null() -> NullSchema {
        NullSchema
    }

    /// Accepts every value, including an absent one.
    pub fn any() -> AnySchema {
        AnySchema
    }

    /// Same as [`any`](Schema::any).
    pub fn unknown() -> AnySchema {
        AnySchema
    }

    /// Rejects every value.
    pub fn never() -> NeverSchema {
        NeverSchema
    }

    /// Accepts exactly `value`.
    pub fn literal(value: Value) -> LiteralSchema {
        LiteralSchema::new(vec![value])
    }

    /// Accepts any one of `values`.
    pub fn literals(values: Vec<Value>) -> LiteralSchema {
        LiteralSchema::new(values)
    }

    /// Accepts one of a fixed set of options.
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt};
    /// use serde_json::json;
    ///
    /// let level = Schema::enumeration(["low", "high"]);
    /// assert!(level.parse(&json!("low")).is_ok());
    /// assert_eq!(level.parse(&json!("mid")).unwrap_err().first().code(), "invalid_enum_value");
    /// ```
    pub fn enumeration<I, V>(options: I) -> EnumSchema
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        EnumSchema::new(options.into_iter().map(Into::into).collect())
    }

    /// An object schema that strips unknown keys.
    pub fn object() -> ObjectSchema {
        ObjectSchema::new()
    }

    /// An object schema that rejects unknown keys.
    pub fn strict_object() -> ObjectSchema {
        ObjectSchema::new().strict()
    }

    /// An object schema that keeps unknown keys.
    pub fn loose_object() -> ObjectSchema {
        ObjectSchema::new().passthrough()
    }

    pub fn array<S: SchemaLike + 'static>(item: S) -> ArraySchema {
        ArraySchema::new(item.into_shared())
    }

    /// A fixed-length array with one schema per position.
    ///
    /// ```rust
    /// use inquest::{Schema, SchemaExt, SchemaLike};
    /// use serde_json::json;
    ///
    /// let pair = Schema::tuple(vec![
    ///     Schema::string().into_shared(),
    ///     Schema::number().into_shared(),
    /// ]);
    /// assert!(pair.parse(&json!(["a", 1])).is_ok());
    /// assert!(pair.parse(&json!(["a"])).is_err());
    /// ```
    pub fn tuple(items: Vec<DynSchema>) -> TupleSchema {
        TupleSchema::new(items)
    }

    /// A map whose keys and values are validated. Literal or enum keys make
    /// every listed key required.
    pub fn record<K, V>(key: K, value: V) -> RecordSchema
    where
        K: SchemaLike + 'static,
        V: SchemaLike + 'static,
    {
        RecordSchema::new(key.into_shared(), value.into_shared(), RecordMode::Standard)
    }

    /// A record whose literal or enum keys are all optional.
    pub fn partial_record<K, V>(key: K, value: V) -> RecordSchema
    where
        K: SchemaLike + 'static,
        V: SchemaLike + 'static,
    {
        RecordSchema::new(key.into_shared(), value.into_shared(), RecordMode::Partial)
    }

    /// A record that passes entries with non-matching keys through.
    pub fn loose_record<K, V>(key: K, value: V) -> RecordSchema
    where
        K: SchemaLike + 'static,
        V: SchemaLike + 'static,
    {
        RecordSchema::new(key.into_shared(), value.into_shared(), RecordMode::Loose)
    }

    /// The first option to pass wins.
    pub fn union(options: Vec<DynSchema>) -> UnionSchema {
        UnionSchema::new(options)
    }

    /// Exactly one option must pass.
    pub fn xor(options: Vec<DynSchema>) -> XorSchema {
        XorSchema::new(options)
    }

    /// A union dispatched on the `discriminator` field of object options.
    pub fn discriminated_union(
        discriminator: impl Into<String>,
        options: Vec<DynSchema>,
    ) -> Result<DiscriminatedUnionSchema, SchemaBuildError> {
        DiscriminatedUnionSchema::new(discriminator, options)
    }

    pub fn intersection<A, B>(left: A, right: B) -> IntersectionSchema
    where
        A: SchemaLike + 'static,
        B: SchemaLike + 'static,
    {
        IntersectionSchema::new(left.into_shared(), right.into_shared())
    }

    /// A schema built on first use.
    pub fn lazy<F>(init: F) -> LazySchema
    where
        F: Fn() -> DynSchema + Send + Sync + 'static,
    {
        LazySchema::from_thunk(init)
    }

    /// A self-referential schema. `build` receives a handle to the schema
    /// being defined.
    pub fn recursive<F, S>(build: F) -> LazySchema
    where
        F: FnOnce(DynSchema) -> S,
        S: SchemaLike + 'static,
    {
        LazySchema::recursive(|handle| build(handle).into_shared())
    }

    /// Converts between `input` and `output` with a pair of functions.
    pub fn codec<I, O, D, E, DE, EE>(input: I, output: O, decode: D, encode: E) -> CodecSchema
    where
        I: SchemaLike + 'static,
        O: SchemaLike + 'static,
        D: Fn(Value) -> Result<Value, DE> + Send + Sync + 'static,
        E: Fn(Value) -> Result<Value, EE> + Send + Sync + 'static,
        DE: Display,
        EE: Display,
    {
        CodecSchema::new(
            input.into_shared(),
            output.into_shared(),
            Callback::fallible(decode),
            Callback::fallible(encode),
        )
    }

    /// A codec whose conversions are async. Sync entry points report
    /// `async_unsupported`.
    pub fn codec_async<I, O, D, DF, E, EF, DE, EE>(
        input: I,
        output: O,
        decode: D,
        encode: E,
    ) -> CodecSchema
    where
        I: SchemaLike + 'static,
        O: SchemaLike + 'static,
        D: Fn(Value) -> DF + Send + Sync + 'static,
        DF: Future<Output = Result<Value, DE>> + Send + 'static,
        E: Fn(Value) -> EF + Send + Sync + 'static,
        EF: Future<Output = Result<Value, EE>> + Send + 'static,
        DE: Display,
        EE: Display,
    {
        CodecSchema::new(
            input.into_shared(),
            output.into_shared(),
            Callback::asynchronous(decode),
            Callback::asynchronous(encode),
        )
    }

    /// Accepts any value the predicate approves.
    pub fn custom<F>(check: F) -> CustomSchema
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        CustomSchema::new(Predicate::sync(check))
    }

    pub fn custom_async<F, Fut>(check: F) -> CustomSchema
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        CustomSchema::new(Predicate::asynchronous(check))
    }

    /// Applies `f` to the raw input before `schema` validates it.
    pub fn preprocess<F, E, S>(f: F, schema: S) -> PreprocessSchema
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Display,
        S: SchemaLike + 'static,
    {
        PreprocessSchema::new(Callback::fallible(f), schema.into_shared())
    }
}
