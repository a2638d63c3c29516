//! Daemon and syncer configuration models.

mod app;
mod consul;
mod sync;

pub use app::{AppConfig, DestinationConfig, LockerConfig};
pub use consul::ConsulConfig;
pub use sync::{LockOptions, SyncConfig, TermFailurePolicy, MAX_DELAY_SECS};
