pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Harness failures carry one preformatted message; callers only report them.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Error(pub String);
