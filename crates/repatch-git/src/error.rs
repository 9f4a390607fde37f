//! Error types for repatch-git.
//!
//! Every operation that touches the network classifies its failure before it
//! crosses the crate boundary, so callers can branch on error class (retry
//! transient network failures, never retry authentication failures) without
//! inspecting libgit2 internals.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during git operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transient network failure (connectivity, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// Credential or permission failure.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A ref named in the request does not exist on the remote.
    #[error("unknown ref: {0}")]
    UnknownRef(String),

    /// Remote not configured in the repository.
    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    /// Branch not found.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// A replay operation was invoked with no replay in progress.
    #[error("no replay in progress")]
    NoReplayInProgress,

    /// The index still carries conflict entries.
    #[error("index has unresolved conflicts")]
    ConflictsUnresolved,

    /// Underlying git2 error that fits no classified category.
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
}

impl Error {
    /// Classify a git2 error from a network-facing operation (fetch/push).
    pub(crate) fn classify(err: git2::Error) -> Self {
        use git2::{ErrorClass, ErrorCode};

        match (err.class(), err.code()) {
            (_, ErrorCode::Auth) | (ErrorClass::Ssh, _) => Self::Auth(err.message().to_string()),
            (ErrorClass::Net | ErrorClass::Http | ErrorClass::Ssl, _) => {
                Self::Network(err.message().to_string())
            }
            (_, ErrorCode::NotFound) => Self::UnknownRef(err.message().to_string()),
            _ => Self::Git(err),
        }
    }

    /// Whether retrying the operation could reasonably succeed.
    ///
    /// Only network failures are transient; authentication and ref errors are
    /// stable until the environment changes.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
