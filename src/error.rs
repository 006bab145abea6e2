use thiserror::Error;

/// Errors the planner surfaces to callers.
///
/// Expected conditions (empty queries, idempotent deletes) are not errors;
/// only mutations aimed at a missing target and malformed boundary input
/// produce one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The mutation target id is absent from the index. Recoverable; the
    /// collection is left unchanged.
    #[error("no task with id `{0}`")]
    NotFound(String),
    /// An id prefix matched more than one stored task.
    #[error("task id `{0}` is ambiguous, give more characters")]
    AmbiguousId(String),
    /// A date string that is not `YYYY-MM-DD`.
    #[error("`{0}` is not a date in YYYY-MM-DD form")]
    MalformedDate(String),
    /// A time string that is not 24-hour `HH:MM`.
    #[error("`{0}` is not a time in HH:MM form")]
    MalformedTime(String),
}
