//! Bidirectional conversion between two validated representations.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::IssueKind;
use crate::path::JsonPath;
use crate::schema::effects::{CallError, Callback};
use crate::schema::traits::{DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::TypeSet;
use crate::validation::ValidationContext;
use crate::ValidationResult;

/// The schemas and function for one direction of a codec.
struct Leg<'s> {
    from: &'s DynSchema,
    to: &'s DynSchema,
    convert: &'s Callback,
    label: &'static str,
    failed: fn(String) -> IssueKind,
}

impl Leg<'_> {
    fn failure<T>(
        &self,
        err: CallError,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        let kind = match err {
            CallError::Failed(reason) => (self.failed)(reason),
            CallError::Async => IssueKind::AsyncUnsupported,
        };
        ctx.fail(kind, path, Some(value))
    }

    fn run(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.convert.call(self.label, value.clone()) {
            Ok(converted) => self.to.validate(&converted, path, ctx),
            Err(err) => self.failure(err, &value, path, ctx),
        }
    }

    async fn run_async(
        &self,
        value: Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        match self.convert.call_async(self.label, value.clone()).await {
            Ok(converted) => self.to.validate_async(&converted, path, ctx).await,
            Err(reason) => self.failure(CallError::Failed(reason), &value, path, ctx),
        }
    }
}

fn decode_failed(reason: String) -> IssueKind {
    IssueKind::DecodeFailed { reason }
}

fn encode_failed(reason: String) -> IssueKind {
    IssueKind::EncodeFailed { reason }
}

/// Converts between an input representation and an output representation.
///
/// Decoding validates the input side, calls `decode`, then validates the
/// output side. Encoding runs the mirror image: output side, `encode`, input
/// side. A failing or panicking conversion is reported as `decode_failed` or
/// `encode_failed`. An absent value stays absent without calling either
/// function.
///
/// # Example
///
/// ```rust
/// use inquest::{Schema, SchemaExt};
/// use serde_json::{json, Value};
///
/// // "3" on the wire, 3 in memory.
/// let count = Schema::codec(
///     Schema::string(),
///     Schema::int(),
///     |v| v.as_str().and_then(|s| s.parse::<i64>().ok()).map(Value::from).ok_or("not a number"),
///     |v| Ok::<_, String>(Value::String(v.to_string())),
/// );
///
/// assert_eq!(count.parse(&json!("3")).unwrap(), json!(3));
/// assert_eq!(count.encode(&json!(3)).unwrap(), json!("3"));
/// assert_eq!(count.parse(&json!("x")).unwrap_err().first().code(), "decode_failed");
/// ```
#[derive(Clone)]
pub struct CodecSchema {
    input: DynSchema,
    output: DynSchema,
    decode: Callback,
    encode: Callback,
}

impl CodecSchema {
    pub(crate) fn new(
        input: DynSchema,
        output: DynSchema,
        decode: Callback,
        encode: Callback,
    ) -> Self {
        Self {
            input,
            output,
            decode,
            encode,
        }
    }

    /// The schema of the external representation.
    pub fn input(&self) -> &DynSchema {
        &self.input
    }

    /// The schema of the internal representation.
    pub fn output(&self) -> &DynSchema {
        &self.output
    }

    fn leg(&self, ctx: &ValidationContext) -> Leg<'_> {
        if ctx.is_encoding() {
            Leg {
                from: &self.output,
                to: &self.input,
                convert: &self.encode,
                label: "encode",
                failed: encode_failed,
            }
        } else {
            Leg {
                from: &self.input,
                to: &self.output,
                convert: &self.decode,
                label: "decode",
                failed: decode_failed,
            }
        }
    }
}

impl SchemaLike for CodecSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let leg = self.leg(ctx);
        match leg.from.validate(value, path, ctx) {
            Validation::Success(checked) => leg.run(checked, path, ctx),
            failure => failure,
        }
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        let leg = self.leg(ctx);
        match leg.from.validate_missing(path, ctx) {
            Validation::Success(Some(checked)) => match leg.run(checked, path, ctx) {
                Validation::Success(v) => Validation::Success(Some(v)),
                Validation::Failure(err) => Validation::Failure(err),
            },
            other => other,
        }
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let leg = self.leg(ctx);
            match leg.from.validate_async(value, path, ctx).await {
                Validation::Success(checked) => leg.run_async(checked, path, ctx).await,
                failure => failure,
            }
        }
        .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        async move {
            let leg = self.leg(ctx);
            match leg.from.validate_missing_async(path, ctx).await {
                Validation::Success(Some(checked)) => {
                    match leg.run_async(checked, path, ctx).await {
                        Validation::Success(v) => Validation::Success(Some(v)),
                        Validation::Failure(err) => Validation::Failure(err),
                    }
                }
                other => other,
            }
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Codec
    }

    fn accepts(&self) -> TypeSet {
        self.input.accepts()
    }

    fn accepts_missing(&self) -> bool {
        self.input.accepts_missing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::SchemaExt;
    use serde_json::json;

    fn cents() -> CodecSchema {
        Schema::codec(
            Schema::number(),
            Schema::int(),
            |v| Ok::<_, String>(json!((v.as_f64().unwrap_or(0.0) * 100.0).round() as i64)),
            |v| Ok::<_, String>(json!(v.as_f64().unwrap_or(0.0) / 100.0)),
        )
    }

    #[test]
    fn test_decode_then_validate_output() {
        assert_eq!(cents().parse(&json!(1.25)).unwrap(), json!(125));
        assert_eq!(cents().parse(&json!("1")).unwrap_err().first().code(), "invalid_type");
    }

    #[test]
    fn test_encode_validates_output_side_first() {
        assert_eq!(cents().encode(&json!(125)).unwrap(), json!(1.25));
        let err = cents().encode(&json!(1.5)).unwrap_err();
        assert_eq!(err.first().kind, IssueKind::invalid_type("int", "number"));
    }

    #[test]
    fn test_panicking_decoder_becomes_issue() {
        let schema = Schema::codec(
            Schema::string(),
            Schema::string(),
            |_| -> Result<Value, String> { panic!("bad bytes") },
            |v| Ok::<_, String>(v),
        );
        let err = schema.parse(&json!("x")).unwrap_err();
        assert_eq!(
            err.first().kind,
            IssueKind::DecodeFailed {
                reason: "bad bytes".to_string()
            }
        );
    }

    #[test]
    fn test_async_codec_from_sync_entry() {
        let schema = Schema::codec_async(
            Schema::string(),
            Schema::string(),
            |v| async move { Ok::<_, String>(v) },
            |v| async move { Ok::<_, String>(v) },
        );
        let err = schema.parse(&json!("x")).unwrap_err();
        assert_eq!(err.first().code(), "async_unsupported");

        let value = futures::executor::block_on(schema.parse_async(&json!("x"))).unwrap();
        assert_eq!(value, json!("x"));
        let encoded = futures::executor::block_on(schema.encode_async(&json!("y"))).unwrap();
        assert_eq!(encoded, json!("y"));
    }
}
