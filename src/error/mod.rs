//! Error types.
//!
//! Validation failures are [`Issue`]s collected into a non-empty
//! [`ValidationError`]; schema definition mistakes are [`SchemaBuildError`]s.
//! [`TypedParseError`] adds deserialization failures for typed parsing.
//! The [`format`] module derives tree, flattened and pretty views.

mod build_error;
pub mod format;
mod issue;
mod parse_error;
mod validation_error;

pub use build_error::SchemaBuildError;
pub use format::{flatten, format_nested, prettify, to_json, treeify, ErrorTree, FlattenedError};
pub use issue::{Issue, IssueKind, SizeOrigin};
pub use parse_error::TypedParseError;
pub use validation_error::ValidationError;

pub(crate) use issue::format_number;
pub(crate) use validation_error::finish;
