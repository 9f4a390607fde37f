//! Repository wrapper providing the high-level git operations the rebase
//! engine needs: fetching configured remotes, history queries, cherry-pick
//! based replay, and publishing.

use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{BranchType, Oid, RepositoryState, Signature};

use crate::error::{Error, Result};
use crate::traits::{GitOps, PushResult, ReplayStep};

/// High-level wrapper around a git repository.
///
/// Authentication context (an optional SSH key path and the committer
/// identity used for replayed commits) is injected at construction time so
/// the engine never reaches into the process environment.
pub struct Repository {
    inner: git2::Repository,
    ssh_key: Option<PathBuf>,
    committer: Option<(String, String)>,
}

impl Repository {
    /// Open the repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository exists at the path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::open(path)?;
        Ok(Self {
            inner,
            ssh_key: None,
            committer: None,
        })
    }

    /// Use this private key for SSH authentication instead of the agent.
    #[must_use]
    pub fn with_ssh_key(mut self, key: Option<PathBuf>) -> Self {
        self.ssh_key = key;
        self
    }

    /// Use this identity as the committer for replayed commits.
    ///
    /// Without it, the repository's configured `user.name`/`user.email` is
    /// used.
    #[must_use]
    pub fn with_committer(mut self, name: &str, email: &str) -> Self {
        self.committer = Some((name.to_string(), email.to_string()));
        self
    }

    /// Get the path to the repository workdir.
    #[must_use]
    pub fn workdir(&self) -> Option<&Path> {
        self.inner.workdir()
    }

    fn committer_signature(&self) -> Result<Signature<'static>> {
        match &self.committer {
            Some((name, email)) => Ok(Signature::now(name, email)?),
            None => Ok(self.inner.signature()?),
        }
    }

    /// Credential chain: explicit key if configured, then SSH agent, then the
    /// git credential helper, then libgit2's default.
    ///
    /// The returned callbacks own their captures, so they satisfy any caller
    /// lifetime.
    fn callbacks<'cb>(&self) -> git2::RemoteCallbacks<'cb> {
        let cfg = self.inner.config().ok();
        let ssh_key = self.ssh_key.clone();

        let mut cb = git2::RemoteCallbacks::new();
        cb.credentials(move |url, username_from_url, allowed| {
            if allowed.is_ssh_key() {
                if let Some(key) = ssh_key.as_deref() {
                    return git2::Cred::ssh_key(
                        username_from_url.unwrap_or("git"),
                        None,
                        key,
                        None,
                    );
                }
                if let Some(user) = username_from_url {
                    return git2::Cred::ssh_key_from_agent(user);
                }
            }
            if allowed.is_user_pass_plaintext() {
                if let Some(cfg) = cfg.as_ref() {
                    if let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url) {
                        return Ok(cred);
                    }
                }
            }
            git2::Cred::default()
        });
        cb
    }

    fn remote_tracking_tip(&self, remote: &str, branch: &str) -> Result<Oid> {
        let refname = format!("refs/remotes/{remote}/{branch}");
        self.inner
            .refname_to_id(&refname)
            .map_err(|_| Error::UnknownRef(format!("{remote}/{branch}")))
    }

    /// Best-effort read of the remote tip after a push rejection; a rejected
    /// push must always report the tip that beat us.
    fn observed_remote_tip(&self, remote: &str, branch: &str) -> Oid {
        self.fetch(remote, branch)
            .or_else(|_| self.remote_tracking_tip(remote, branch))
            .unwrap_or_else(|_| Oid::zero())
    }
}

impl GitOps for Repository {
    fn ensure_remote(&self, name: &str, url: &str) -> Result<()> {
        match self.inner.find_remote(name) {
            Ok(remote) => {
                if remote.url() != Some(url) {
                    self.inner.remote_set_url(name, url)?;
                }
            }
            Err(_) => {
                self.inner.remote(name, url)?;
            }
        }
        Ok(())
    }

    fn fetch(&self, remote: &str, branch: &str) -> Result<Oid> {
        let mut remote_handle = self
            .inner
            .find_remote(remote)
            .map_err(|_| Error::RemoteNotFound(remote.to_string()))?;

        let mut opts = git2::FetchOptions::new();
        opts.remote_callbacks(self.callbacks());

        let refspec = format!("+refs/heads/{branch}:refs/remotes/{remote}/{branch}");
        remote_handle
            .fetch(&[refspec.as_str()], Some(&mut opts), None)
            .map_err(Error::classify)?;

        self.remote_tracking_tip(remote, branch)
    }

    fn push(
        &self,
        remote: &str,
        branch: &str,
        tag: Option<&str>,
        force: bool,
    ) -> Result<PushResult> {
        let mut remote_handle = self
            .inner
            .find_remote(remote)
            .map_err(|_| Error::RemoteNotFound(remote.to_string()))?;

        let rejected = std::cell::RefCell::new(false);
        let mut cb = self.callbacks();
        cb.push_update_reference(|_refname, status| {
            if status.is_some() {
                *rejected.borrow_mut() = true;
            }
            Ok(())
        });

        let mut opts = git2::PushOptions::new();
        opts.remote_callbacks(cb);

        let prefix = if force { "+" } else { "" };
        let mut refspecs = vec![format!("{prefix}refs/heads/{branch}:refs/heads/{branch}")];
        if let Some(tag) = tag {
            refspecs.push(format!("refs/tags/{tag}:refs/tags/{tag}"));
        }

        let result = remote_handle.push(&refspecs, Some(&mut opts));
        let was_rejected = *rejected.borrow();

        match result {
            Ok(()) if !was_rejected => {
                let tip = self
                    .inner
                    .refname_to_id(&format!("refs/heads/{branch}"))
                    .map_err(|_| Error::BranchNotFound(branch.to_string()))?;
                Ok(PushResult::Pushed(tip))
            }
            Ok(()) => Ok(PushResult::Rejected {
                remote_tip: self.observed_remote_tip(remote, branch),
            }),
            Err(e) if e.code() == git2::ErrorCode::NotFastForward || was_rejected => {
                Ok(PushResult::Rejected {
                    remote_tip: self.observed_remote_tip(remote, branch),
                })
            }
            Err(e) => Err(Error::classify(e)),
        }
    }

    fn merge_base(&self, one: Oid, two: Oid) -> Result<Oid> {
        Ok(self.inner.merge_base(one, two)?)
    }

    fn commits_between(&self, from: Oid, to: Oid) -> Result<Vec<Oid>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.push(to)?;
        revwalk.hide(from)?;
        revwalk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            // A replayed history is linear; merges have no replay counterpart.
            if self.inner.find_commit(oid)?.parent_count() > 1 {
                continue;
            }
            commits.push(oid);
        }
        Ok(commits)
    }

    fn in_replay(&self) -> bool {
        matches!(
            self.inner.state(),
            RepositoryState::CherryPick
                | RepositoryState::CherryPickSequence
                | RepositoryState::Rebase
                | RepositoryState::RebaseInteractive
                | RepositoryState::RebaseMerge
        )
    }

    fn start_replay(&self, onto: Oid) -> Result<()> {
        let object = self.inner.find_object(onto, Some(git2::ObjectType::Commit))?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner.checkout_tree(&object, Some(&mut checkout))?;
        self.inner.set_head_detached(onto)?;
        Ok(())
    }

    fn apply_next(&self, commit: Oid) -> Result<ReplayStep> {
        let picked = self.inner.find_commit(commit)?;
        self.inner.cherrypick(&picked, None)?;

        let mut index = self.inner.index()?;
        if index.has_conflicts() {
            let mut files = Vec::new();
            for conflict in index.conflicts()? {
                let conflict = conflict?;
                let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
                if let Some(entry) = entry {
                    files.push(String::from_utf8_lossy(&entry.path).into_owned());
                }
            }
            files.sort();
            files.dedup();
            // Working tree intentionally left paused for inspection.
            return Ok(ReplayStep::Conflict(files));
        }

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;
        let head = self.inner.head()?.peel_to_commit()?;
        let committer = self.committer_signature()?;

        let new_oid = self.inner.commit(
            Some("HEAD"),
            &picked.author(),
            &committer,
            picked.message().unwrap_or(""),
            &tree,
            &[&head],
        )?;
        self.inner.cleanup_state()?;

        Ok(ReplayStep::Applied(new_oid))
    }

    fn continue_replay(&self) -> Result<Oid> {
        let picked = self
            .inner
            .find_reference("CHERRY_PICK_HEAD")
            .map_err(|_| Error::NoReplayInProgress)?
            .peel_to_commit()?;

        let mut index = self.inner.index()?;
        if index.has_conflicts() {
            return Err(Error::ConflictsUnresolved);
        }

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;
        let head = self.inner.head()?.peel_to_commit()?;
        let committer = self.committer_signature()?;

        let new_oid = self.inner.commit(
            Some("HEAD"),
            &picked.author(),
            &committer,
            picked.message().unwrap_or(""),
            &tree,
            &[&head],
        )?;
        self.inner.cleanup_state()?;

        Ok(new_oid)
    }

    fn abort_replay(&self) -> Result<()> {
        self.inner.cleanup_state()?;
        let head = self.inner.head()?.peel_to_commit()?;
        self.inner
            .reset(head.as_object(), git2::ResetType::Hard, None)?;
        Ok(())
    }

    fn reset_branch(&self, branch: &str, target: Oid) -> Result<()> {
        let reference_name = format!("refs/heads/{branch}");
        self.inner.reference(
            &reference_name,
            target,
            true, // force
            &format!("repatch: reset to {}", &target.to_string()[..8]),
        )?;
        Ok(())
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        let branch_ref = self
            .inner
            .find_branch(branch, BranchType::Local)
            .map_err(|_| Error::BranchNotFound(branch.to_string()))?;

        let object = branch_ref.get().peel(git2::ObjectType::Commit)?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner.checkout_tree(&object, Some(&mut checkout))?;
        self.inner.set_head(&format!("refs/heads/{branch}"))?;
        Ok(())
    }

    fn tag_lightweight(&self, name: &str, target: Oid) -> Result<()> {
        let object = self
            .inner
            .find_object(target, Some(git2::ObjectType::Commit))?;
        self.inner.tag_lightweight(name, &object, true)?;
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        Ok(self.inner.tag_delete(name)?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.inner.path())
            .finish()
    }
}
