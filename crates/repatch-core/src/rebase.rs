//! The rebase engine.
//!
//! Drives one run end to end: fetch both remotes, resolve the patch range,
//! replay it onto the new upstream tip, classify the result, and publish or
//! stop. The run moves through fetch, range resolution, and replay, and ends
//! in exactly one terminal outcome: published, dry-run complete, no patches,
//! conflict, rejected, or aborted.
//!
//! Two behaviors here are deliberate and load-bearing:
//!
//! - On conflict the working tree is left in the paused replay state. External
//!   tooling and operators inspect it; resetting here would erase that window.
//! - Before publishing, the patches remote is fetched a second time. If its
//!   tip moved while we were replaying, the run reports the observed tip and
//!   pushes nothing, so concurrent external updates are never overwritten.

use chrono::Utc;
use repatch_git::{GitOps, Oid, PushResult, ReplayStep, with_retry};

use crate::error::{Error, Result};
use crate::range::resolve_range;
use crate::request::{RebaseRequest, RemoteSpec};

/// Terminal outcome of one rebase run. Produced exactly once per invocation.
#[derive(Debug)]
pub enum RebaseOutcome {
    /// The patch range was empty; the repository is untouched.
    NoPatches,

    /// Replay succeeded and the result was pushed to the patches remote.
    Published {
        /// Tip of the replayed branch.
        new_tip: Oid,
        /// Number of commits replayed.
        replayed: usize,
    },

    /// Replay succeeded but nothing was pushed (dry run).
    DryRunComplete {
        /// Tip the branch would have been pushed at.
        new_tip: Oid,
        /// Number of commits replayed.
        replayed: usize,
    },

    /// A commit did not apply cleanly. The working tree is left paused at the
    /// failed pick for inspection; nothing was pushed.
    Conflict {
        /// The original commit that failed to apply.
        commit: Oid,
        /// Paths git reported as conflicting.
        files: Vec<String>,
    },

    /// The patches branch moved on the remote while we were working; nothing
    /// was pushed.
    Rejected {
        /// Tip observed on the remote.
        remote_tip: Oid,
    },

    /// The run failed before reaching any other terminal outcome.
    Aborted(Error),
}

/// Drives one rebase run against a [`GitOps`] implementation.
pub struct Orchestrator<'a, G: GitOps> {
    git: &'a G,
    request: &'a RebaseRequest,
}

impl<'a, G: GitOps> Orchestrator<'a, G> {
    /// Create an orchestrator for one run.
    #[must_use]
    pub const fn new(git: &'a G, request: &'a RebaseRequest) -> Self {
        Self { git, request }
    }

    /// Run to a terminal outcome. Never panics, never returns an error: any
    /// failure that fits no other terminal outcome becomes [`RebaseOutcome::Aborted`]
    /// with the classified cause attached.
    pub fn run(&self) -> RebaseOutcome {
        match self.try_run() {
            Ok(outcome) => outcome,
            Err(error) => RebaseOutcome::Aborted(error),
        }
    }

    fn try_run(&self) -> Result<RebaseOutcome> {
        self.request.validate()?;

        // A killed prior run may have left a paused replay behind; a new
        // range cannot be resolved on top of it.
        if self.git.in_replay() {
            self.git.abort_replay()?;
        }

        let upstream_tip = self.fetch_remote(&self.request.upstream)?;
        let patches_tip = self.fetch_remote(&self.request.patches)?;

        let range = resolve_range(self.git, patches_tip, upstream_tip)?;
        if range.is_empty() {
            return Ok(RebaseOutcome::NoPatches);
        }

        self.git.start_replay(upstream_tip)?;
        let mut tip = upstream_tip;
        for &commit in range.iter() {
            match self.git.apply_next(commit)? {
                ReplayStep::Applied(new_tip) => tip = new_tip,
                ReplayStep::Conflict(files) => {
                    // Working tree stays paused at the failed pick.
                    return Ok(RebaseOutcome::Conflict { commit, files });
                }
            }
        }

        if self.request.dry_run {
            return Ok(RebaseOutcome::DryRunComplete {
                new_tip: tip,
                replayed: range.len(),
            });
        }

        self.publish(patches_tip, tip, range.len())
    }

    fn fetch_remote(&self, spec: &RemoteSpec) -> Result<Oid> {
        self.git.ensure_remote(&spec.name, &spec.url)?;
        Ok(with_retry(&self.request.retry, || {
            self.git.fetch(&spec.name, &spec.branch)
        })?)
    }

    fn publish(&self, old_remote_tip: Oid, new_tip: Oid, replayed: usize) -> Result<RebaseOutcome> {
        let patches = &self.request.patches;

        // Re-fetch before pushing: the replay rewrote history, so the push
        // must be forced, and the only protection against clobbering a
        // concurrent external update is comparing tips first.
        let observed = with_retry(&self.request.retry, || {
            self.git.fetch(&patches.name, &patches.branch)
        })?;
        if observed != old_remote_tip {
            return Ok(RebaseOutcome::Rejected {
                remote_tip: observed,
            });
        }

        self.git.reset_branch(&patches.branch, new_tip)?;
        self.git.checkout(&patches.branch)?;

        // Keep the pre-rebase tip reachable on the remote.
        let tag = previous_tip_tag();
        self.git.tag_lightweight(&tag, old_remote_tip)?;

        let pushed = with_retry(&self.request.retry, || {
            self.git.push(&patches.name, &patches.branch, Some(&tag), true)
        })?;

        match pushed {
            PushResult::Pushed(tip) => Ok(RebaseOutcome::Published {
                new_tip: tip,
                replayed,
            }),
            PushResult::Rejected { remote_tip } => {
                self.git.delete_tag(&tag)?;
                Ok(RebaseOutcome::Rejected { remote_tip })
            }
        }
    }
}

fn previous_tip_tag() -> String {
    format!("repatch/previous-{}", Utc::now().format("%Y%m%d%H%M%S"))
}
