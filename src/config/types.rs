//! Configuration types for uam-access
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use serde::Deserialize;

/// Highest privilege level a user can have
pub const MAX_USER_LEVEL: u32 = 10;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Access decision options
    pub access: AccessOptions,

    /// Where the group/hierarchy snapshot comes from
    pub snapshot: SnapshotConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Options that shape access decisions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessOptions {
    /// Users at or above this level bypass all groups
    pub full_access_level: u32,

    /// Whether authors may always access their own posts
    pub authors_has_access_to_own: bool,
}

impl Default for AccessOptions {
    fn default() -> Self {
        Self {
            full_access_level: MAX_USER_LEVEL,
            authors_has_access_to_own: true,
        }
    }
}

/// Snapshot source configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Path to a JSON or TOML snapshot file
    pub path: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.access.full_access_level, 10);
        assert!(config.access.authors_has_access_to_own);
        assert!(config.snapshot.path.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_deserialize_log_format() {
        let format: LogFormat = serde_json::from_str(r#""json""#).unwrap();
        assert_eq!(format, LogFormat::Json);

        let format: LogFormat = serde_json::from_str(r#""pretty""#).unwrap();
        assert_eq!(format, LogFormat::Pretty);
    }

    #[test]
    fn test_partial_access_options() {
        let options: AccessOptions =
            serde_json::from_str(r#"{ "authors_has_access_to_own": false }"#).unwrap();
        assert_eq!(options.full_access_level, MAX_USER_LEVEL);
        assert!(!options.authors_has_access_to_own);
    }
}
