//! Error types for repatch-core.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repatch-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required request field is missing or malformed. Reported before any
    /// git operation runs.
    #[error("invalid request: {0}")]
    Config(String),

    /// Git operation error, already classified by the adapter.
    #[error(transparent)]
    Git(#[from] repatch_git::Error),
}
