//! Patch range resolution.
//!
//! Computes the ordered list of downstream commits that must be replayed,
//! given the patches branch tip and the new upstream tip. The "previous
//! upstream tip" is not persisted anywhere; it is re-derived as the merge
//! base of the two tips, so range resolution can never drift from the
//! repository's actual history.

use repatch_git::{GitOps, Oid};

use crate::error::Result;

/// Ordered sequence of patch commits, oldest first.
///
/// An empty range is the valid no-op outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitRange {
    commits: Vec<Oid>,
}

impl CommitRange {
    /// Wrap an oldest-first commit list.
    #[must_use]
    pub const fn new(commits: Vec<Oid>) -> Self {
        Self { commits }
    }

    /// The empty range.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            commits: Vec::new(),
        }
    }

    /// Number of commits to replay.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether there is nothing to replay.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Iterate the commits oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Oid> {
        self.commits.iter()
    }
}

/// Compute the commits to replay onto the new upstream tip.
///
/// Policy:
/// - merge-base == patches tip: every downstream commit is already upstream,
///   nothing to rebase;
/// - merge-base == upstream tip: the patches branch already descends from the
///   new upstream tip, nothing to rebase;
/// - otherwise: the commits reachable from the patches tip but not from the
///   merge base, in original order. No reordering, no squashing - each
///   original commit becomes exactly one replayed commit.
///
/// # Errors
/// Returns error if the merge base or the commit walk fails.
pub fn resolve_range<G: GitOps>(
    git: &G,
    patches_tip: Oid,
    upstream_tip: Oid,
) -> Result<CommitRange> {
    let base = git.merge_base(patches_tip, upstream_tip)?;

    if base == patches_tip || base == upstream_tip {
        return Ok(CommitRange::empty());
    }

    let commits = git.commits_between(base, patches_tip)?;
    Ok(CommitRange::new(commits))
}
