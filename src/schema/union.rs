//! Inclusive and exclusive unions.
//!
//! Candidates are tried in declaration order. While decoding, a candidate
//! whose [`accepts`](SchemaLike::accepts) set excludes the input's JSON type
//! is not invoked; its failure is reported as a synthesized `invalid_type`
//! issue instead. Skipping never changes which candidate succeeds.

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use stillwater::Validation;

use crate::error::{Issue, IssueKind, ValidationError};
use crate::path::JsonPath;
use crate::schema::traits::{DynSchema, SchemaKind, SchemaLike};
use crate::schema::types::{type_name, TypeSet};
use crate::validation::ValidationContext;
use crate::ValidationResult;

#[derive(Clone)]
struct Candidate {
    schema: DynSchema,
    accepts: TypeSet,
}

impl Candidate {
    fn new(schema: DynSchema) -> Self {
        let accepts = schema.accepts();
        Self { schema, accepts }
    }

    /// The synthesized failure of a skipped candidate, if it can be skipped.
    fn skip(&self, value: &Value, path: &JsonPath, ctx: &ValidationContext) -> Option<Vec<Issue>> {
        if ctx.is_encoding() || self.accepts.admits(value) {
            return None;
        }
        let kind = IssueKind::invalid_type(self.accepts.to_string(), type_name(value));
        Some(vec![ctx.issue(kind, path, Some(value))])
    }
}

fn candidates(options: Vec<DynSchema>) -> Vec<Candidate> {
    options.into_iter().map(Candidate::new).collect()
}

fn union_failure<T>(
    errors: Vec<Vec<Issue>>,
    note: Option<String>,
    path: &JsonPath,
    input: Option<&Value>,
    ctx: &ValidationContext,
) -> ValidationResult<T> {
    ctx.fail(IssueKind::InvalidUnion { errors, note }, path, input)
}

fn accepts_any(options: &[Candidate]) -> TypeSet {
    options
        .iter()
        .fold(TypeSet::EMPTY, |acc, c| acc.union(c.accepts))
}

/// Accepts the output of the first candidate that succeeds.
///
/// When every candidate fails, the result is a single `invalid_union` issue
/// whose `errors` hold each candidate's issues in declaration order.
///
/// # Example
///
/// ```rust
/// use inquest::{IssueKind, Schema, SchemaExt, SchemaLike};
/// use serde_json::json;
///
/// let id = Schema::union(vec![
///     Schema::string().min_len(1).into_shared(),
///     Schema::int().positive().into_shared(),
/// ]);
///
/// assert!(id.parse(&json!("abc")).is_ok());
/// assert!(id.parse(&json!(42)).is_ok());
///
/// let err = id.parse(&json!(true)).unwrap_err();
/// assert_eq!(err.len(), 1);
/// assert!(matches!(
///     &err.first().kind,
///     IssueKind::InvalidUnion { errors, .. } if errors.len() == 2
/// ));
/// ```
#[derive(Clone)]
pub struct UnionSchema {
    options: Vec<Candidate>,
}

impl UnionSchema {
    pub(crate) fn new(options: Vec<DynSchema>) -> Self {
        Self {
            options: candidates(options),
        }
    }

    /// The candidates in declaration order.
    pub fn options(&self) -> impl Iterator<Item = &DynSchema> {
        self.options.iter().map(|c| &c.schema)
    }
}

impl SchemaLike for UnionSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let mut errors = Vec::with_capacity(self.options.len());
        for option in &self.options {
            if let Some(skipped) = option.skip(value, path, ctx) {
                errors.push(skipped);
                continue;
            }
            match option.schema.validate(value, path, ctx) {
                Validation::Success(output) => return Validation::Success(output),
                Validation::Failure(err) => errors.push(err.into_vec()),
            }
        }
        union_failure(errors, None, path, Some(value), ctx)
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        let mut errors = Vec::with_capacity(self.options.len());
        for option in &self.options {
            match option.schema.validate_missing(path, ctx) {
                Validation::Success(output) => return Validation::Success(output),
                Validation::Failure(err) => errors.push(err.into_vec()),
            }
        }
        union_failure(errors, None, path, None, ctx)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let mut errors = Vec::with_capacity(self.options.len());
            for option in &self.options {
                if let Some(skipped) = option.skip(value, path, ctx) {
                    errors.push(skipped);
                    continue;
                }
                match option.schema.validate_async(value, path, ctx).await {
                    Validation::Success(output) => return Validation::Success(output),
                    Validation::Failure(err) => errors.push(err.into_vec()),
                }
            }
            union_failure(errors, None, path, Some(value), ctx)
        }
        .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        async move {
            let mut errors = Vec::with_capacity(self.options.len());
            for option in &self.options {
                match option.schema.validate_missing_async(path, ctx).await {
                    Validation::Success(output) => return Validation::Success(output),
                    Validation::Failure(err) => errors.push(err.into_vec()),
                }
            }
            union_failure(errors, None, path, None, ctx)
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Union
    }

    fn accepts(&self) -> TypeSet {
        accepts_any(&self.options)
    }

    fn accepts_missing(&self) -> bool {
        self.options.iter().any(|c| c.schema.accepts_missing())
    }
}

/// Accepts input matched by exactly one candidate.
///
/// Zero matches fail like [`UnionSchema`]; several matches fail with an
/// `invalid_union` issue whose `note` names the matching candidates.
///
/// # Example
///
/// ```rust
/// use inquest::{IssueKind, Schema, SchemaExt, SchemaLike};
/// use serde_json::json;
///
/// let exclusive = Schema::xor(vec![
///     Schema::number().min(0.0).into_shared(),
///     Schema::number().max(10.0).into_shared(),
/// ]);
///
/// assert!(exclusive.parse(&json!(-5)).is_ok());
/// let err = exclusive.parse(&json!(5)).unwrap_err();
/// assert!(matches!(&err.first().kind, IssueKind::InvalidUnion { note: Some(_), .. }));
/// ```
#[derive(Clone)]
pub struct XorSchema {
    options: Vec<Candidate>,
}

impl XorSchema {
    pub(crate) fn new(options: Vec<DynSchema>) -> Self {
        Self {
            options: candidates(options),
        }
    }

    fn decide<T>(
        results: Vec<ValidationResult<T>>,
        path: &JsonPath,
        input: Option<&Value>,
        ctx: &ValidationContext,
    ) -> ValidationResult<T> {
        let mut errors = Vec::new();
        let mut matches = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Validation::Success(output) => matches.push((index, output)),
                Validation::Failure(err) => errors.push(err.into_vec()),
            }
        }
        match matches.len() {
            0 => union_failure(errors, None, path, input, ctx),
            1 => match matches.pop() {
                Some((_, output)) => Validation::Success(output),
                None => union_failure(errors, None, path, input, ctx),
            },
            _ => {
                let indices: Vec<String> = matches.iter().map(|(i, _)| i.to_string()).collect();
                let note = format!("input matched options {}", indices.join(", "));
                union_failure(Vec::new(), Some(note), path, input, ctx)
            }
        }
    }

    fn skipped(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> Vec<Option<ValidationError>> {
        self.options
            .iter()
            .map(|option| {
                option
                    .skip(value, path, ctx)
                    .and_then(ValidationError::from_issues)
            })
            .collect()
    }
}

impl SchemaLike for XorSchema {
    fn validate(
        &self,
        value: &Value,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Value> {
        let results = self
            .options
            .iter()
            .zip(self.skipped(value, path, ctx))
            .map(|(option, skipped)| match skipped {
                Some(err) => Validation::Failure(err),
                None => option.schema.validate(value, path, ctx),
            })
            .collect();
        Self::decide(results, path, Some(value), ctx)
    }

    fn validate_missing(
        &self,
        path: &JsonPath,
        ctx: &ValidationContext,
    ) -> ValidationResult<Option<Value>> {
        let results = self
            .options
            .iter()
            .map(|option| option.schema.validate_missing(path, ctx))
            .collect();
        Self::decide(results, path, None, ctx)
    }

    fn validate_async<'a>(
        &'a self,
        value: &'a Value,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Value>> {
        async move {
            let mut results = Vec::with_capacity(self.options.len());
            for (option, skipped) in self.options.iter().zip(self.skipped(value, path, ctx)) {
                let result = match skipped {
                    Some(err) => Validation::Failure(err),
                    None => option.schema.validate_async(value, path, ctx).await,
                };
                results.push(result);
            }
            Self::decide(results, path, Some(value), ctx)
        }
        .boxed()
    }

    fn validate_missing_async<'a>(
        &'a self,
        path: &'a JsonPath,
        ctx: &'a ValidationContext,
    ) -> BoxFuture<'a, ValidationResult<Option<Value>>> {
        async move {
            let mut results = Vec::with_capacity(self.options.len());
            for option in &self.options {
                results.push(option.schema.validate_missing_async(path, ctx).await);
            }
            Self::decide(results, path, None, ctx)
        }
        .boxed()
    }

    fn kind(&self) -> SchemaKind {
        SchemaKind::Xor
    }

    fn accepts(&self) -> TypeSet {
        accepts_any(&self.options)
    }
}
