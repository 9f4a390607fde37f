//! Fixed-count retry for transient network failures.

use std::time::Duration;

use crate::error::{Error, Result};

/// Retry policy for network-facing operations.
///
/// Only errors for which [`Error::is_transient`] holds are retried;
/// authentication and ref errors surface immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Always at least 1.
    pub attempts: u32,
    /// Sleep between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given attempt count and backoff.
    #[must_use]
    pub const fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

/// Run `op`, retrying transient network errors per `policy`.
///
/// # Errors
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error immediately.
pub fn with_retry<T, F>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let attempts = policy.attempts.max(1);
    let mut tried = 0;

    loop {
        tried += 1;
        match op() {
            Err(e) if e.is_transient() && tried < attempts => {
                std::thread::sleep(policy.backoff);
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    const NO_BACKOFF: RetryPolicy = RetryPolicy::new(3, Duration::ZERO);

    #[test]
    fn test_success_first_try() {
        let calls = Cell::new(0);
        let result = with_retry(&NO_BACKOFF, || {
            calls.set(calls.get() + 1);
            Ok(42)
        });
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_network_error_retried_until_success() {
        let calls = Cell::new(0);
        let result = with_retry(&NO_BACKOFF, || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(Error::Network("connection reset".into()))
            } else {
                Ok("tip")
            }
        });
        assert_eq!(result.unwrap(), "tip");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_network_error_exhausts_attempts() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&NO_BACKOFF, || {
            calls.set(calls.get() + 1);
            Err(Error::Network("timeout".into()))
        });
        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_auth_error_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&NO_BACKOFF, || {
            calls.set(calls.get() + 1);
            Err(Error::Auth("bad key".into()))
        });
        assert!(matches!(result, Err(Error::Auth(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(0, Duration::ZERO);
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&policy, || {
            calls.set(calls.get() + 1);
            Err(Error::Network("down".into()))
        });
        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }
}
