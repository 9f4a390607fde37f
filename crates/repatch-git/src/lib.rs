//! # repatch-git
//!
//! Git operations abstraction layer for repatch, built on git2-rs.
//! Provides the narrow capability interface the rebase engine drives:
//! fetching configured remotes, history queries, cherry-pick based replay,
//! and publishing, with every network failure classified before it leaves
//! this crate.

mod error;
mod repository;
mod retry;
mod traits;

pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::Repository;
pub use retry::{RetryPolicy, with_retry};
pub use traits::{GitOps, PushResult, ReplayStep};
