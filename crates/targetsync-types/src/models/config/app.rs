//! Top-level daemon configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{ConsulConfig, SyncConfig};

/// Which destination implementation the daemon writes to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DestinationConfig {
    /// In-process set that logs every change (dry run)
    #[default]
    Memory,
}

/// Which leader-election backend gates destination writes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockerConfig {
    /// Consul session + KV lock
    #[default]
    Consul,
    /// Always leader; only for single-replica deployments
    #[serde(alias = "none")]
    Static,
}

/// Full daemon configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
pub struct AppConfig {
    #[validate(nested)]
    #[serde(default)]
    pub syncer: SyncConfig,
    #[validate(nested)]
    #[serde(default)]
    pub consul: ConsulConfig,
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub locker: LockerConfig,
}
