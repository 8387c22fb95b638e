//! Error types for uam-access
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors that are part of the API;
//! the binary wraps them in `anyhow` at the boundary.

use crate::user_group::GroupId;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Group store error: {0}")]
    Store(#[from] StoreError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

/// Configuration-related errors
///
/// Also covers malformed collaborator data (tree maps, IP ranges, scopes),
/// since acting on it would produce an incorrect verdict.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid IP range '{range}': {reason}")]
    InvalidIpRange { range: String, reason: String },

    #[error("Malformed tree map at '{path}': {reason}")]
    MalformedTreeMap { path: String, reason: String },

    #[error("Unknown object type: {0}")]
    UnknownObjectType(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the group persistence collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to load user groups: {0}")]
    Load(String),

    #[error("Failed to delete user group {group_id}: {reason}")]
    Delete { group_id: GroupId, reason: String },
}

/// Access denied for an object
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Access denied to {object_type} '{object_id}': {reason}")]
pub struct AccessDeniedError {
    pub object_type: String,
    pub object_id: String,
    pub reason: String,
}

impl AccessDeniedError {
    pub fn new(
        object_type: impl Into<String>,
        object_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
            reason: reason.into(),
        }
    }
}

/// Errors surfaced by the access decision engine
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Denied(#[from] AccessDeniedError),
}

impl AccessError {
    /// Whether this error is a plain deny rather than a failure to decide
    pub fn is_denied(&self) -> bool {
        matches!(self, AccessError::Denied(_))
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for engine operations
pub type AccessResult<T> = std::result::Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_display() {
        let err = AccessDeniedError::new("post", "42", "not a member of any gating group");
        assert_eq!(
            err.to_string(),
            "Access denied to post '42': not a member of any gating group"
        );
    }

    #[test]
    fn test_access_error_is_denied() {
        let denied: AccessError = AccessDeniedError::new("post", "1", "nope").into();
        assert!(denied.is_denied());

        let store: AccessError = StoreError::Load("db down".into()).into();
        assert!(!store.is_denied());
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AppError = ConfigError::UnknownObjectType("widget".into()).into();
        assert!(matches!(err, AppError::Config(ConfigError::UnknownObjectType(_))));
        assert!(err.to_string().contains("widget"));
    }
}
