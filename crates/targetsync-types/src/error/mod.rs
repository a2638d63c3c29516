//! Typed error definitions for targetsync.
//!
//! All errors here are serializable, tagged by `type` with the payload under
//! `details`.

mod config;
mod target;

pub use config::ConfigError;
pub use target::TargetParseError;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = ConfigError::ValidationError {
            field: "lock_options".to_string(),
            message: "ttl_secs must be at least 1".to_string(),
        };

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("ValidationError"));
        assert!(json.contains("lock_options"));

        let deserialized: ConfigError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_error_display() {
        let err = TargetParseError::InvalidPort { input: "10.0.0.1:http".to_string() };

        let msg = format!("{}", err);
        assert!(msg.contains("10.0.0.1:http"));
    }
}
