//! The validated request a single rebase run operates on.
//!
//! Constructed by the external configuration loader (the CLI crate here) and
//! validated before any git operation. The engine owns the request for the
//! duration of one run; nothing outlives the invocation.

use std::path::PathBuf;

use repatch_git::RetryPolicy;

use crate::error::{Error, Result};

/// One git remote and the branch of interest on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSpec {
    /// Remote name as configured in the local repository.
    pub name: String,
    /// Remote URL.
    pub url: String,
    /// Branch on the remote.
    pub branch: String,
}

impl RemoteSpec {
    /// Create a remote spec.
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            branch: branch.into(),
        }
    }

    fn validate(&self, label: &str) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config(format!("{label} remote URL is empty")));
        }
        if self.branch.trim().is_empty() {
            return Err(Error::Config(format!("{label} branch is empty")));
        }
        Ok(())
    }
}

/// Committer identity for replayed commits.
///
/// Each replayed commit keeps its original author and message; this identity
/// becomes the committer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

/// Everything one rebase run needs, validated up front.
#[derive(Debug, Clone)]
pub struct RebaseRequest {
    /// Path to the local working repository.
    pub repo_path: PathBuf,
    /// Remote the new base commits come from.
    pub upstream: RemoteSpec,
    /// Remote carrying the downstream patch branch; the rebase result is
    /// published here.
    pub patches: RemoteSpec,
    /// Committer identity for replayed commits.
    pub author: AuthorIdentity,
    /// Report the would-be result without publishing.
    pub dry_run: bool,
    /// Retry policy for network-facing operations.
    pub retry: RetryPolicy,
    /// Optional SSH private key; without it the agent and credential helper
    /// chain is used.
    pub ssh_key: Option<PathBuf>,
}

impl RebaseRequest {
    /// Check that every required field is present and non-empty.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.repo_path.as_os_str().is_empty() {
            return Err(Error::Config("repository path is empty".into()));
        }
        self.upstream.validate("upstream")?;
        self.patches.validate("patches")?;
        if self.author.name.trim().is_empty() {
            return Err(Error::Config("author name is empty".into()));
        }
        if self.author.email.trim().is_empty() {
            return Err(Error::Config("author email is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> RebaseRequest {
        RebaseRequest {
            repo_path: PathBuf::from("/srv/build/project"),
            upstream: RemoteSpec::new("upstream", "https://example.org/project.git", "main"),
            patches: RemoteSpec::new(
                "patches",
                "ssh://git@example.org/project-patches.git",
                "patches",
            ),
            author: AuthorIdentity {
                name: "Rebase Bot".into(),
                email: "bot@example.org".into(),
            },
            dry_run: false,
            retry: RetryPolicy::default(),
            ssh_key: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_empty_repo_path_rejected() {
        let mut req = request();
        req.repo_path = PathBuf::new();
        assert!(matches!(req.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut req = request();
        req.upstream.url = "  ".into();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("upstream"));
    }

    #[test]
    fn test_empty_branch_rejected() {
        let mut req = request();
        req.patches.branch = String::new();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("patches"));
    }

    #[test]
    fn test_empty_author_rejected() {
        let mut req = request();
        req.author.email = String::new();
        assert!(matches!(req.validate(), Err(Error::Config(_))));
    }
}
