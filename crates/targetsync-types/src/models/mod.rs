//! Core domain models for targetsync.

mod config;
mod snapshot;
mod target;

pub use config::{
    AppConfig, ConsulConfig, DestinationConfig, LockOptions, LockerConfig, SyncConfig,
    TermFailurePolicy, MAX_DELAY_SECS,
};
pub use snapshot::Snapshot;
pub use target::Target;
