use std::fs;
use std::path::Path;
use validator::Validate;

use targetsync_types::{AppConfig, ConfigError};

/// Read, parse and validate the daemon config at `path`.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let shown = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::from_io_error(&shown, &e))?;

    let config = parse_config(&content)?;
    tracing::info!(
        "[Config] Loaded {} (service={}, locker={:?}, remove_delay={}s)",
        shown,
        config.consul.service_name,
        config.locker,
        config.syncer.remove_delay_secs
    );
    Ok(config)
}

/// Parse and validate a JSON config document.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig =
        serde_json::from_str(content).map_err(|e| ConfigError::from_json_error(&e))?;
    config.validate().map_err(|e| ConfigError::from_validation_errors(&e))?;
    Ok(config)
}
