//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (UAM_ACCESS_*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::{AppConfig, MAX_USER_LEVEL};
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "uam-access.toml",
    ".uam-access.toml",
    "~/.config/uam-access/config.toml",
    "/etc/uam-access/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g., UAM_ACCESS__ACCESS__FULL_ACCESS_LEVEL, UAM_ACCESS__SNAPSHOT__PATH
    // Double underscore (__) maps to nested keys (access.full_access_level)
    builder = builder.add_source(
        Environment::with_prefix("UAM_ACCESS")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    if let Some(path) = app_config.snapshot.path.take() {
        app_config.snapshot.path = Some(shellexpand::tilde(&path).into_owned());
    }

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.access.full_access_level > MAX_USER_LEVEL {
        return Err(ConfigError::Invalid {
            message: format!(
                "access.full_access_level must be between 0 and {}, got: {}",
                MAX_USER_LEVEL, config.access.full_access_level
            ),
        });
    }

    if let Some(path) = &config.snapshot.path
        && path.trim().is_empty()
    {
        return Err(ConfigError::Missing {
            field: "snapshot.path".to_string(),
        });
    }

    Ok(())
}
