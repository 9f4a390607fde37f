//! Outcome reporting: stable exit codes and summaries.
//!
//! Every [`RebaseOutcome`] variant maps to exactly one exit code and one
//! summary shape. Pipeline branching depends on the codes staying stable
//! across releases.

use repatch_core::{Error, RebaseOutcome};
use repatch_git::Oid;
use serde::Serialize;

use crate::output;

/// Nothing to do, or rebased and published (also dry-run success).
pub const EXIT_SUCCESS: i32 = 0;
/// Replay stopped on a conflict; manual intervention required.
pub const EXIT_CONFLICT: i32 = 2;
/// The remote patches branch moved concurrently; nothing was published.
pub const EXIT_REJECTED: i32 = 3;
/// Fatal error: network, authentication, or misconfiguration.
pub const EXIT_FATAL: i32 = 4;

/// Map an outcome to its process exit code.
#[must_use]
pub const fn exit_code(outcome: &RebaseOutcome) -> i32 {
    match outcome {
        RebaseOutcome::NoPatches
        | RebaseOutcome::Published { .. }
        | RebaseOutcome::DryRunComplete { .. } => EXIT_SUCCESS,
        RebaseOutcome::Conflict { .. } => EXIT_CONFLICT,
        RebaseOutcome::Rejected { .. } => EXIT_REJECTED,
        RebaseOutcome::Aborted(_) => EXIT_FATAL,
    }
}

/// Machine-readable summary of a run, printed with `--json`.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replayed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_tip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Summary {
    /// Build the summary for an outcome.
    #[must_use]
    pub fn from_outcome(outcome: &RebaseOutcome) -> Self {
        let mut summary = Self {
            status: status_label(outcome),
            new_tip: None,
            replayed: None,
            commit: None,
            files: Vec::new(),
            remote_tip: None,
            error: None,
        };
        match outcome {
            RebaseOutcome::NoPatches => {}
            RebaseOutcome::Published { new_tip, replayed }
            | RebaseOutcome::DryRunComplete { new_tip, replayed } => {
                summary.new_tip = Some(new_tip.to_string());
                summary.replayed = Some(*replayed);
            }
            RebaseOutcome::Conflict { commit, files } => {
                summary.commit = Some(commit.to_string());
                summary.files = files.clone();
            }
            RebaseOutcome::Rejected { remote_tip } => {
                summary.remote_tip = Some(remote_tip.to_string());
            }
            RebaseOutcome::Aborted(error) => {
                summary.error = Some(error.to_string());
            }
        }
        summary
    }
}

const fn status_label(outcome: &RebaseOutcome) -> &'static str {
    match outcome {
        RebaseOutcome::NoPatches => "no-patches",
        RebaseOutcome::Published { .. } => "published",
        RebaseOutcome::DryRunComplete { .. } => "dry-run",
        RebaseOutcome::Conflict { .. } => "conflict",
        RebaseOutcome::Rejected { .. } => "rejected",
        RebaseOutcome::Aborted(_) => "aborted",
    }
}

/// Render the outcome: JSON summary or human-readable report.
pub fn render(outcome: &RebaseOutcome, json: bool) {
    if json {
        let summary = Summary::from_outcome(outcome);
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => output::essential(&text),
            Err(e) => output::error(&format!("cannot serialize summary: {e}")),
        }
        return;
    }

    match outcome {
        RebaseOutcome::NoPatches => {
            output::success("Nothing to rebase - patches branch is up to date with upstream");
        }
        RebaseOutcome::Published { new_tip, replayed } => {
            output::success(&format!(
                "Published {replayed} replayed commit(s), new tip {}",
                short(*new_tip)
            ));
        }
        RebaseOutcome::DryRunComplete { new_tip, replayed } => {
            output::success(&format!(
                "Dry run - would publish {replayed} replayed commit(s) at {}",
                short(*new_tip)
            ));
        }
        RebaseOutcome::Conflict { commit, files } => {
            output::warn(&format!("Conflict while applying {}", short(*commit)));
            output::info("Conflicting files:");
            for file in files {
                output::detail(&format!("  → {file}"));
            }
            output::info("Replay left paused for inspection - resolve or abort before the next run.");
        }
        RebaseOutcome::Rejected { remote_tip } => {
            output::warn(&format!(
                "Push rejected - remote patches branch moved to {}",
                short(*remote_tip)
            ));
            output::info("Nothing was published; the next run will pick up the new tip.");
        }
        RebaseOutcome::Aborted(error) => {
            output::error(&format!("Rebase aborted: {error}"));
        }
    }
}

fn short(oid: Oid) -> String {
    let full = oid.to_string();
    full[..8.min(full.len())].to_string()
}
