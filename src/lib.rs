//! User Access Manager decision engine
//!
//! Decides whether an actor may access a hierarchical content object (post,
//! page, category, user) that is guarded by user groups.
//!
//! ## Features
//!
//! - **Recursive membership** through the parent/child object hierarchy
//! - **Override rules** for administrators, authors, IP ranges and group members
//! - **Open groups** that only restrict access in one mode (read or write)
//! - **Session caches** for object groups and verdicts, dropped on any change
//!
//! ## Decision Model
//!
//! ```text
//! no groups → full access level → author → group IP / member → open groups → deny
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [access]
//! full_access_level = 10          # Administrators bypass all groups
//! authors_has_access_to_own = true
//!
//! [snapshot]
//! path = "snapshot.json"          # Groups, hierarchy and authors
//! ```

pub mod access_control;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod tree_map;
pub mod user_group;

// Re-export main types
pub use access_control::{AccessDecision, AccessEngine, AccessMode, ActorContext, ObjectType};
pub use config::{AppConfig, load_config};
pub use error::{AccessError, AppError, ConfigError, Result};
pub use snapshot::Snapshot;
pub use tree_map::TreeMap;
pub use user_group::{GroupRegistry, UserGroup};
