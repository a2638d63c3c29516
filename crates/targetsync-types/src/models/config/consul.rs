//! Consul source and locker configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::Validate;

/// Connection and query settings for the Consul catalog/session adapters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct ConsulConfig {
    /// Agent HTTP address, e.g. `http://127.0.0.1:8500`
    #[validate(url)]
    #[serde(default = "default_address")]
    pub address: String,
    /// Service whose passing instances make up the source membership
    #[validate(length(min = 1))]
    #[serde(default)]
    pub service_name: String,
    /// Only include instances carrying this tag
    #[serde(default)]
    pub tag: Option<String>,
    /// ACL token sent as `X-Consul-Token`
    #[serde(default)]
    pub token: Option<String>,
    /// Blocking query wait time in seconds
    #[validate(range(min = 1_u64, max = 600_u64))]
    #[serde(default = "default_wait")]
    pub wait_secs: u64,
    /// Delay before retrying a failed Consul request
    #[validate(range(max = 31_536_000_u64))]
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl ConsulConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_secs(self.wait_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            service_name: String::new(),
            tag: None,
            token: None,
            wait_secs: default_wait(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

fn default_address() -> String {
    "http://127.0.0.1:8500".to_string()
}

fn default_wait() -> u64 {
    300
}

fn default_retry_delay() -> u64 {
    1
}
