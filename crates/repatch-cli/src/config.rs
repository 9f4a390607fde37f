//! Configuration loading for the repatch CLI.
//!
//! The configuration file names the two remotes, the committer identity, and
//! the run options. Loading produces a validated [`RebaseRequest`]; the core
//! engine never sees the file format.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use repatch_core::{AuthorIdentity, RebaseRequest, RemoteSpec};
use repatch_git::RetryPolicy;
use serde::Deserialize;

/// Remote names the engine configures in the local repository.
pub const UPSTREAM_REMOTE: &str = "upstream";
pub const PATCHES_REMOTE: &str = "patches";

/// Configuration loaded from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Remote the new base commits come from.
    pub upstream: RemoteConfig,

    /// Remote carrying the downstream patch branch.
    pub patches: RemoteConfig,

    /// Committer identity for replayed commits.
    pub author: AuthorConfig,

    /// Run options.
    #[serde(default)]
    pub run: RunConfig,
}

/// One remote: URL plus branch of interest.
#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    pub url: String,
    pub branch: String,
}

/// Committer identity.
#[derive(Debug, Deserialize)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
}

/// Run options, all optional in the file.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    /// Report the would-be result without pushing.
    #[serde(default)]
    pub dry_run: bool,

    /// Attempts for network-facing operations, including the first.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Sleep between attempts.
    #[serde(default = "default_retry_backoff_seconds")]
    pub retry_backoff_seconds: u64,

    /// SSH private key to authenticate with; the agent and credential helper
    /// chain is used when absent.
    #[serde(default)]
    pub ssh_key_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            retry_count: default_retry_count(),
            retry_backoff_seconds: default_retry_backoff_seconds(),
            ssh_key_path: None,
        }
    }
}

const fn default_retry_count() -> u32 {
    3
}

const fn default_retry_backoff_seconds() -> u64 {
    5
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("cannot parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Turn the loaded configuration into a rebase request.
    ///
    /// `dry_run_override` comes from the command line and wins over the file.
    #[must_use]
    pub fn into_request(self, repo_path: PathBuf, dry_run_override: bool) -> RebaseRequest {
        RebaseRequest {
            repo_path,
            upstream: RemoteSpec::new(UPSTREAM_REMOTE, self.upstream.url, self.upstream.branch),
            patches: RemoteSpec::new(PATCHES_REMOTE, self.patches.url, self.patches.branch),
            author: AuthorIdentity {
                name: self.author.name,
                email: self.author.email,
            },
            dry_run: self.run.dry_run || dry_run_override,
            retry: RetryPolicy::new(
                self.run.retry_count,
                Duration::from_secs(self.run.retry_backoff_seconds),
            ),
            ssh_key: self.run.ssh_key_path,
        }
    }
}
