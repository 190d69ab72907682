//! The aggregate validation failure.

use std::fmt::{self, Display};

use stillwater::{NonEmptyVec, Semigroup, Validation};

use crate::error::issue::Issue;
use crate::path::JsonPath;

/// A non-empty, ordered collection of [`Issue`]s.
///
/// `ValidationError` wraps a `NonEmptyVec<Issue>`, so a failure without at
/// least one issue cannot be represented. Errors from independent validations
/// are merged with [`Semigroup::combine`], preserving order.
///
/// # Example
///
/// ```rust
/// use inquest::{Issue, IssueKind, JsonPath, ValidationError};
/// use stillwater::Semigroup;
///
/// let name = ValidationError::single(Issue::new(
///     IssueKind::custom(),
///     JsonPath::from_field("name"),
///     "required",
/// ));
/// let email = ValidationError::single(Issue::new(
///     IssueKind::custom(),
///     JsonPath::from_field("email"),
///     "invalid",
/// ));
///
/// let combined = name.combine(email);
/// assert_eq!(combined.len(), 2);
/// assert_eq!(combined.messages(), vec!["required", "invalid"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError(NonEmptyVec<Issue>);

impl ValidationError {
    /// Creates an error holding a single issue.
    pub fn single(issue: Issue) -> Self {
        Self(NonEmptyVec::singleton(issue))
    }

    /// Creates an error from a `NonEmptyVec` of issues.
    pub fn from_non_empty(issues: NonEmptyVec<Issue>) -> Self {
        Self(issues)
    }

    /// Creates an error from a list of issues, or None if the list is empty.
    pub fn from_issues(issues: Vec<Issue>) -> Option<Self> {
        NonEmptyVec::from_vec(issues).map(Self)
    }

    /// Returns the number of issues.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: a `ValidationError` holds at least one issue.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns an iterator over the issues in order.
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.0.iter()
    }

    /// Returns the issues as references, in order.
    pub fn issues(&self) -> Vec<&Issue> {
        self.0.iter().collect()
    }

    /// Returns the first issue.
    pub fn first(&self) -> &Issue {
        self.0.head()
    }

    /// Returns every issue message, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|issue| issue.message.as_str()).collect()
    }

    /// Returns all issues at exactly `path`.
    pub fn at_path(&self, path: &JsonPath) -> Vec<&Issue> {
        self.0.iter().filter(|issue| &issue.path == path).collect()
    }

    /// Returns all issues with the given code.
    pub fn with_code(&self, code: &str) -> Vec<&Issue> {
        self.0.iter().filter(|issue| issue.code() == code).collect()
    }

    /// Converts into the underlying issues.
    pub fn into_vec(self) -> Vec<Issue> {
        self.0.into_vec()
    }

    /// Returns the underlying `NonEmptyVec`.
    pub fn as_non_empty_vec(&self) -> &NonEmptyVec<Issue> {
        &self.0
    }
}

impl Semigroup for ValidationError {
    fn combine(self, other: Self) -> Self {
        ValidationError(self.0.combine(other.0))
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Validation failed with {} issue(s):", self.len())?;
        for (i, issue) in self.iter().enumerate() {
            writeln!(f, "  {}. {}", i + 1, issue)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

impl IntoIterator for ValidationError {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_vec().into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationError {
    type Item = &'a Issue;
    type IntoIter = Box<dyn Iterator<Item = &'a Issue> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.0.iter())
    }
}

/// Turns accumulated issues into a result: success when nothing was collected.
pub(crate) fn finish<T>(value: T, issues: Vec<Issue>) -> Validation<T, ValidationError> {
    match ValidationError::from_issues(issues) {
        Some(error) => Validation::Failure(error),
        None => Validation::Success(value),
    }
}

const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}
    assert_send::<ValidationError>();
    assert_sync::<ValidationError>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::issue::IssueKind;

    fn issue(path: JsonPath, message: &str) -> Issue {
        Issue::new(IssueKind::custom(), path, message)
    }

    #[test]
    fn test_from_issues_rejects_empty() {
        assert!(ValidationError::from_issues(Vec::new()).is_none());
        let err = ValidationError::from_issues(vec![issue(JsonPath::root(), "x")]).unwrap();
        assert_eq!(err.len(), 1);
        assert!(!err.is_empty());
    }

    #[test]
    fn test_finish_succeeds_without_issues() {
        let ok = finish(1, Vec::new());
        assert!(ok.is_success());

        let failed = finish(1, vec![issue(JsonPath::root(), "x")]);
        assert!(failed.is_failure());
    }

    #[test]
    fn test_at_path_and_with_code() {
        let a = JsonPath::from_field("a");
        let err = ValidationError::single(issue(a.clone(), "one"))
            .combine(ValidationError::single(issue(a.clone(), "two")))
            .combine(ValidationError::single(Issue::new(
                IssueKind::invalid_type("string", "null"),
                JsonPath::from_field("b"),
                "three",
            )));

        assert_eq!(err.at_path(&a).len(), 2);
        assert_eq!(err.with_code("invalid_type").len(), 1);
        assert_eq!(err.first().message, "one");
    }

    #[test]
    fn test_combine_is_associative() {
        let e1 = ValidationError::single(issue(JsonPath::root(), "1"));
        let e2 = ValidationError::single(issue(JsonPath::root(), "2"));
        let e3 = ValidationError::single(issue(JsonPath::root(), "3"));

        let left = e1.clone().combine(e2.clone()).combine(e3.clone());
        let right = e1.combine(e2.combine(e3));
        assert_eq!(left.messages(), right.messages());
    }

    #[test]
    fn test_display_numbers_issues() {
        let err = ValidationError::single(issue(JsonPath::from_field("name"), "required"))
            .combine(ValidationError::single(issue(JsonPath::root(), "bad")));
        let display = err.to_string();
        assert!(display.contains("2 issue(s)"));
        assert!(display.contains("1. name: required"));
        assert!(display.contains("2. (root): bad"));
    }
}
