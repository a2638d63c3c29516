//! # targetsync Core
//!
//! Keeps a load-balancer destination in step with a discovered source while
//! only one replica writes at a time.
//!
//! ```text
//! targetsync-core/src/
//! ├── sync/       # reconciler, removal scheduler, leader terms, lifecycle
//! ├── consul/     # Consul catalog source and session lock
//! └── modules/    # config loading, in-memory destination, static locker
//! ```
//!
//! The engine only talks to collaborators through the [`TargetSource`],
//! [`TargetDestination`] and [`Locker`] traits; every adapter is injected.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod consul;
pub mod error;
pub mod modules;
pub mod sync;

pub use error::{ConsulError, DestinationError, DestinationResult, SyncError, SyncResult};
pub use sync::{
    LeadershipStream, Locker, SnapshotStream, Syncer, SyncerState, TargetDestination,
    TargetSource,
};
pub use targetsync_types::{LockOptions, Snapshot, SyncConfig, Target};
