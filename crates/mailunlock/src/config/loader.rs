use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;
use crate::secrets::imap_has_password;

const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.loop_config.interval == 0 {
        return Err(validation("loop.interval must be at least 1 second"));
    }

    for (name, dir) in [
        ("unprocessed", &config.directories.unprocessed),
        ("success", &config.directories.success),
        ("failed", &config.directories.failed),
    ] {
        if dir.as_os_str().is_empty() {
            return Err(validation(format!("directories.{} must not be empty", name)));
        }
    }

    let dirs = &config.directories;
    if dirs.unprocessed == dirs.success
        || dirs.unprocessed == dirs.failed
        || dirs.success == dirs.failed
    {
        return Err(validation("directories must be three distinct paths"));
    }

    if !LOG_LEVELS.contains(&config.log.level.to_lowercase().as_str()) {
        return Err(validation(format!(
            "Unknown log.level '{}'",
            config.log.level
        )));
    }

    if config.imap.url.trim().is_empty() {
        return Err(validation("imap.url must not be empty"));
    }

    if config.imap.batch_size == 0 {
        return Err(validation("imap.batchSize must be at least 1"));
    }

    if !imap_has_password(&config.imap) {
        return Err(validation(
            "imap needs one of password, passwordFile or passwordEnvVar",
        ));
    }

    if config.uptime.monitor
        && config
            .uptime
            .endpoint
            .as_deref()
            .map_or(true, |e| e.trim().is_empty())
    {
        return Err(validation("uptime.endpoint is required when uptime.monitor is true"));
    }

    Ok(())
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}
