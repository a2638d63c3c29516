//! # targetsync Types
//!
//! Core types, config models, and error definitions for targetsync.
//!
//! - **`error`** - Typed errors for configuration and target parsing
//! - **`models`** - Domain models (Target, Snapshot, SyncConfig, AppConfig)
//!
//! ## Architecture Role
//!
//! `targetsync-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!         targetsync-types (this crate)
//!                 │
//!                 ▼
//!          targetsync-core
//!                 │
//!                 ▼
//!         targetsync-server
//! ```

pub mod error;
pub mod models;

pub use error::{ConfigError, TargetParseError};

pub use models::{
    AppConfig, ConsulConfig, DestinationConfig, LockOptions, LockerConfig, Snapshot, SyncConfig,
    Target, TermFailurePolicy, MAX_DELAY_SECS,
};
