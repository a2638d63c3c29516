//! Syncer and lock configuration types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use validator::Validate;

/// Upper bound for every delay in seconds (one year). Deadlines are computed
/// as `now + delay` and must stay representable.
pub const MAX_DELAY_SECS: u64 = 31_536_000;

/// Whole seconds, rounding any fraction up so a delay never shrinks.
fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs().saturating_add(u64::from(duration.subsec_nanos() > 0))
}

/// Options for the distributed lock guarding destination writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct LockOptions {
    /// Lock key shared by all replicas syncing the same destination
    #[validate(length(min = 1))]
    pub key: String,
    /// Lease lifetime in seconds
    #[validate(range(min = 1_u64, max = 31_536_000_u64))]
    #[serde(default = "default_lock_ttl")]
    pub ttl_secs: u64,
}

impl LockOptions {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self { key: key.into(), ttl_secs: ceil_secs(ttl) }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for LockOptions {
    fn default() -> Self {
        Self { key: default_lock_key(), ttl_secs: default_lock_ttl() }
    }
}

/// What the leadership lifecycle does when a term stops on its own.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TermFailurePolicy {
    /// Keep the lock and start a fresh term after `term_restart_delay_secs`
    #[default]
    Restart,
    /// Stop the syncer, releasing the lock
    Abort,
}

impl fmt::Display for TermFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Restart => write!(f, "restart"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Syncer configuration. Loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct SyncConfig {
    #[validate(nested)]
    #[serde(default)]
    pub lock_options: LockOptions,
    /// Grace period before a target missing from the source is removed
    #[validate(range(max = 31_536_000_u64))]
    #[serde(default)]
    pub remove_delay_secs: u64,
    /// Wait before retrying a failed removal
    #[validate(range(min = 1_u64, max = 31_536_000_u64))]
    #[serde(default = "default_remove_retry_delay")]
    pub remove_retry_delay_secs: u64,
    /// Bound of the reconciler → scheduler notification channel
    #[validate(range(min = 1_usize))]
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Scheduler wake-up interval while nothing is pending
    #[validate(range(min = 1_u64, max = 31_536_000_u64))]
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default)]
    pub on_term_failure: TermFailurePolicy,
    #[validate(range(max = 31_536_000_u64))]
    #[serde(default = "default_term_restart_delay")]
    pub term_restart_delay_secs: u64,
}

impl SyncConfig {
    pub fn new(lock_options: LockOptions, remove_delay: Duration) -> Self {
        Self { lock_options, remove_delay_secs: ceil_secs(remove_delay), ..Self::default() }
    }

    pub fn remove_delay(&self) -> Duration {
        Duration::from_secs(self.remove_delay_secs)
    }

    pub fn remove_retry_delay(&self) -> Duration {
        Duration::from_secs(self.remove_retry_delay_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn term_restart_delay(&self) -> Duration {
        Duration::from_secs(self.term_restart_delay_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lock_options: LockOptions::default(),
            remove_delay_secs: 0,
            remove_retry_delay_secs: default_remove_retry_delay(),
            channel_capacity: default_channel_capacity(),
            idle_timeout_secs: default_idle_timeout(),
            on_term_failure: TermFailurePolicy::default(),
            term_restart_delay_secs: default_term_restart_delay(),
        }
    }
}

fn default_lock_key() -> String {
    "targetsync/leader".to_string()
}

fn default_lock_ttl() -> u64 {
    15
}

fn default_remove_retry_delay() -> u64 {
    1
}

fn default_channel_capacity() -> usize {
    100
}

fn default_idle_timeout() -> u64 {
    3600
}

fn default_term_restart_delay() -> u64 {
    5
}
