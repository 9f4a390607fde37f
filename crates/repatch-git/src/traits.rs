//! Trait abstraction for git operations.
//!
//! This module defines the `GitOps` trait which abstracts the repository
//! operations the rebase engine drives, enabling dependency injection and
//! testability with mock implementations.

use git2::Oid;

use crate::Result;

/// Outcome of replaying a single commit onto the current replay head.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// The commit applied cleanly; the new commit id is returned.
    Applied(Oid),

    /// The commit could not be applied; the working tree is left in the
    /// paused replay state with these conflicting paths.
    Conflict(Vec<String>),
}

/// Outcome of a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushResult {
    /// The remote accepted the push; the branch now points at this tip.
    Pushed(Oid),

    /// The remote refused the update (non-fast-forward); the tip observed on
    /// the remote at rejection time is returned.
    Rejected {
        /// Tip currently on the remote branch.
        remote_tip: Oid,
    },
}

/// Trait for git repository operations.
///
/// This trait abstracts git operations, allowing for:
/// - Dependency injection in the rebase engine
/// - Mock implementations for testing
///
/// Operations are synchronous since git2 is a synchronous library. Side
/// effects are confined to the repository the implementation was opened on
/// and the remotes named in each call.
#[allow(clippy::missing_errors_doc)]
pub trait GitOps {
    // === Remote Operations ===

    /// Create the named remote, or re-point it if it exists with another URL.
    fn ensure_remote(&self, name: &str, url: &str) -> Result<()>;

    /// Fetch one branch from a remote and return the remote-tracking tip.
    ///
    /// Failures are classified (`Network`, `Auth`, `UnknownRef`) before they
    /// leave the adapter.
    fn fetch(&self, remote: &str, branch: &str) -> Result<Oid>;

    /// Push a branch (and optionally one tag) to a remote.
    ///
    /// A non-fast-forward refusal is a [`PushResult::Rejected`] value, not an
    /// error.
    fn push(&self, remote: &str, branch: &str, tag: Option<&str>, force: bool)
    -> Result<PushResult>;

    // === History Queries ===

    /// Find the merge base of two commits.
    fn merge_base(&self, one: Oid, two: Oid) -> Result<Oid>;

    /// List commits reachable from `to` but not from `from`, topologically
    /// ordered oldest to newest. Merge commits are excluded.
    fn commits_between(&self, from: Oid, to: Oid) -> Result<Vec<Oid>>;

    // === Replay Operations ===

    /// Check if a replay (or any paused git operation) is in progress.
    fn in_replay(&self) -> bool;

    /// Begin a replay by checking out `onto` on a detached HEAD.
    fn start_replay(&self, onto: Oid) -> Result<()>;

    /// Apply one commit onto the current replay head.
    ///
    /// On conflict the working tree is left paused for inspection; nothing is
    /// aborted automatically.
    fn apply_next(&self, commit: Oid) -> Result<ReplayStep>;

    /// Commit a manually staged conflict resolution, preserving the original
    /// author and message of the paused commit. Returns the new commit id.
    fn continue_replay(&self) -> Result<Oid>;

    /// Abort a paused replay and restore a clean working tree.
    fn abort_replay(&self) -> Result<()>;

    // === Branch and Tag Operations ===

    /// Move (or create) a local branch ref to point at `target`.
    fn reset_branch(&self, branch: &str, target: Oid) -> Result<()>;

    /// Checkout a local branch.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Create a lightweight tag at `target`.
    fn tag_lightweight(&self, name: &str, target: Oid) -> Result<()>;

    /// Delete a local tag.
    fn delete_tag(&self, name: &str) -> Result<()>;
}
