//! A single load-balancer target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TargetParseError;

/// One `address:port` endpoint that may be a member of the destination.
///
/// Equality, hashing and ordering follow the identity key, so two targets with
/// the same address but different ports are distinct members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    /// IP address or hostname
    pub address: String,
    /// Port the target listens on
    pub port: u16,
}

impl Target {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self { address: address.into(), port }
    }

    /// Canonical identity key, `"<address>:<port>"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

impl FromStr for Target {
    type Err = TargetParseError;

    /// Accepts `host:port`, `1.2.3.4:port` and bracketed IPv6 `[::1]:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = s
            .rsplit_once(':')
            .ok_or_else(|| TargetParseError::MissingPort { input: s.to_string() })?;
        let port: u16 =
            port.parse().map_err(|_| TargetParseError::InvalidPort { input: s.to_string() })?;
        let address = address.strip_prefix('[').and_then(|a| a.strip_suffix(']')).unwrap_or(address);
        if address.is_empty() {
            return Err(TargetParseError::EmptyAddress { input: s.to_string() });
        }
        Ok(Self::new(address, port))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_includes_port() {
        let target = Target::new("10.0.0.1", 8080);
        assert_eq!(target.key(), "10.0.0.1:8080");
        assert_eq!(target.to_string(), target.key());
    }

    #[test]
    fn test_identity_is_by_value() {
        let a = Target::new("10.0.0.1", 80);
        let b = Target::new(String::from("10.0.0.1"), 80);
        let c = Target::new("10.0.0.1", 81);

        let set: HashSet<Target> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&a));
    }

    #[test]
    fn test_parse() {
        assert_eq!("10.0.0.1:443".parse::<Target>().unwrap(), Target::new("10.0.0.1", 443));
        assert_eq!("[::1]:80".parse::<Target>().unwrap(), Target::new("::1", 80));
        assert_eq!("web-1.internal:8080".parse::<Target>().unwrap().address, "web-1.internal");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "10.0.0.1".parse::<Target>(),
            Err(TargetParseError::MissingPort { .. })
        ));
        assert!(matches!(
            "10.0.0.1:99999".parse::<Target>(),
            Err(TargetParseError::InvalidPort { .. })
        ));
        assert!(matches!(":80".parse::<Target>(), Err(TargetParseError::EmptyAddress { .. })));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_value(Target::new("10.0.0.1", 80)).unwrap();
        assert_eq!(json, serde_json::json!({"address": "10.0.0.1", "port": 80}));
    }
}
