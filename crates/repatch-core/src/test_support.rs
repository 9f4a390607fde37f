//! Scripted mock of `GitOps` for engine tests.
//!
//! The mock records every call in an event log so tests can assert both the
//! outcome and the exact sequence of repository mutations (or their absence).

#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use repatch_git::{Error as GitError, GitOps, Oid, PushResult, ReplayStep, Result as GitResult};

/// Build a deterministic fake commit id.
pub fn oid(n: u32) -> Oid {
    Oid::from_str(&format!("{n:040x}")).unwrap()
}

/// Scripted outcome for one fetch of a remote.
#[derive(Debug, Clone)]
pub enum MockFetch {
    Tip(Oid),
    Network,
    Auth,
    UnknownRef,
}

/// Scripted outcome for a push.
#[derive(Debug, Clone)]
pub enum MockPush {
    Pushed(Oid),
    Rejected(Oid),
    Network,
}

pub struct MockGit {
    /// Per-remote fetch script; the last entry repeats once the queue drains.
    pub fetch_script: RefCell<HashMap<String, VecDeque<MockFetch>>>,
    pub merge_base: RefCell<Option<Oid>>,
    pub commits: RefCell<Vec<Oid>>,
    /// Commit that conflicts during replay, with the conflicting paths.
    pub conflict_on: RefCell<Option<(Oid, Vec<String>)>>,
    pub push_script: RefCell<VecDeque<MockPush>>,
    pub replay_paused: RefCell<bool>,
    pub applied: RefCell<u32>,
    pub log: RefCell<Vec<String>>,
}

impl Default for MockGit {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGit {
    pub fn new() -> Self {
        Self {
            fetch_script: RefCell::new(HashMap::new()),
            merge_base: RefCell::new(None),
            commits: RefCell::new(Vec::new()),
            conflict_on: RefCell::new(None),
            push_script: RefCell::new(VecDeque::new()),
            replay_paused: RefCell::new(false),
            applied: RefCell::new(0),
            log: RefCell::new(Vec::new()),
        }
    }

    pub fn queue_fetch(&self, remote: &str, outcome: MockFetch) {
        self.fetch_script
            .borrow_mut()
            .entry(remote.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn with_merge_base(self, base: Oid) -> Self {
        *self.merge_base.borrow_mut() = Some(base);
        self
    }

    pub fn with_commits(self, commits: Vec<Oid>) -> Self {
        *self.commits.borrow_mut() = commits;
        self
    }

    pub fn with_conflict_on(self, commit: Oid, files: Vec<String>) -> Self {
        *self.conflict_on.borrow_mut() = Some((commit, files));
        self
    }

    pub fn queue_push(&self, outcome: MockPush) {
        self.push_script.borrow_mut().push_back(outcome);
    }

    pub fn events(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    pub fn event_count(&self, prefix: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    fn record(&self, event: impl Into<String>) {
        self.log.borrow_mut().push(event.into());
    }
}

impl GitOps for MockGit {
    fn ensure_remote(&self, name: &str, url: &str) -> GitResult<()> {
        self.record(format!("ensure_remote:{name}:{url}"));
        Ok(())
    }

    fn fetch(&self, remote: &str, branch: &str) -> GitResult<Oid> {
        self.record(format!("fetch:{remote}/{branch}"));
        let mut script = self.fetch_script.borrow_mut();
        let queue = script
            .get_mut(remote)
            .unwrap_or_else(|| panic!("no fetch script for remote {remote}"));
        let outcome = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| panic!("fetch script for {remote} is empty"))
        };
        match outcome {
            MockFetch::Tip(tip) => Ok(tip),
            MockFetch::Network => Err(GitError::Network("mock network failure".into())),
            MockFetch::Auth => Err(GitError::Auth("mock auth failure".into())),
            MockFetch::UnknownRef => Err(GitError::UnknownRef(format!("{remote}/{branch}"))),
        }
    }

    fn push(
        &self,
        remote: &str,
        branch: &str,
        tag: Option<&str>,
        force: bool,
    ) -> GitResult<PushResult> {
        self.record(format!(
            "push:{remote}/{branch}:force={force}:tag={}",
            tag.is_some()
        ));
        match self.push_script.borrow_mut().pop_front() {
            Some(MockPush::Pushed(tip)) => Ok(PushResult::Pushed(tip)),
            Some(MockPush::Rejected(remote_tip)) => Ok(PushResult::Rejected { remote_tip }),
            Some(MockPush::Network) => Err(GitError::Network("mock network failure".into())),
            None => panic!("unexpected push"),
        }
    }

    fn merge_base(&self, _one: Oid, _two: Oid) -> GitResult<Oid> {
        self.record("merge_base");
        self.merge_base
            .borrow()
            .ok_or_else(|| GitError::UnknownRef("merge base".into()))
    }

    fn commits_between(&self, _from: Oid, _to: Oid) -> GitResult<Vec<Oid>> {
        self.record("commits_between");
        Ok(self.commits.borrow().clone())
    }

    fn in_replay(&self) -> bool {
        *self.replay_paused.borrow()
    }

    fn start_replay(&self, onto: Oid) -> GitResult<()> {
        self.record(format!("start_replay:{onto}"));
        Ok(())
    }

    fn apply_next(&self, commit: Oid) -> GitResult<ReplayStep> {
        self.record(format!("apply:{commit}"));
        if let Some((conflicting, files)) = self.conflict_on.borrow().as_ref() {
            if *conflicting == commit {
                *self.replay_paused.borrow_mut() = true;
                return Ok(ReplayStep::Conflict(files.clone()));
            }
        }
        let n = *self.applied.borrow() + 1;
        *self.applied.borrow_mut() = n;
        Ok(ReplayStep::Applied(oid(0x1000 + n)))
    }

    fn continue_replay(&self) -> GitResult<Oid> {
        self.record("continue_replay");
        *self.replay_paused.borrow_mut() = false;
        Ok(oid(0x2000))
    }

    fn abort_replay(&self) -> GitResult<()> {
        self.record("abort_replay");
        *self.replay_paused.borrow_mut() = false;
        Ok(())
    }

    fn reset_branch(&self, branch: &str, target: Oid) -> GitResult<()> {
        self.record(format!("reset_branch:{branch}:{target}"));
        Ok(())
    }

    fn checkout(&self, branch: &str) -> GitResult<()> {
        self.record(format!("checkout:{branch}"));
        Ok(())
    }

    fn tag_lightweight(&self, name: &str, target: Oid) -> GitResult<()> {
        self.record(format!("tag:{name}:{target}"));
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> GitResult<()> {
        self.record(format!("delete_tag:{name}"));
        Ok(())
    }
}
