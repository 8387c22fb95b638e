//! Session snapshots
//!
//! A snapshot bundles what the host hands over for one evaluation session:
//! the user groups, the object hierarchy and post authorship. It is read from
//! a JSON file, or a TOML file when the extension says so.
//!
//! ```json
//! {
//!   "groups": [
//!     { "id": 1, "name": "Staff", "read_access": "restricted",
//!       "ip_ranges": ["10.0.0.1-10.0.0.255"],
//!       "objects": { "category": ["7"], "user": ["20"] } }
//!   ],
//!   "tree_map": {
//!     "parents":  { "post": { "12": { "7": "category" } } },
//!     "children": { "category": { "7": { "12": "post" } } }
//!   },
//!   "authors": { "12": "20" }
//! }
//! ```

use crate::access_control::engine::AccessEngine;
use crate::access_control::types::ObjectId;
use crate::config::{AccessOptions, AppConfig};
use crate::error::{self, ConfigError};
use crate::tree_map::TreeMap;
use crate::user_group::{GroupDefinition, MemoryGroupStore, UserGroup};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    groups: Vec<GroupDefinition>,

    #[serde(default)]
    tree_map: Value,

    #[serde(default)]
    authors: HashMap<ObjectId, ObjectId>,
}

/// Groups, hierarchy and authorship for one session
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub groups: Vec<UserGroup>,
    pub tree_map: TreeMap,
    pub authors: HashMap<ObjectId, ObjectId>,
}

impl Snapshot {
    /// Parse a JSON snapshot
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: SnapshotFile = serde_json::from_str(content)
            .map_err(|e| ConfigError::Load(format!("invalid snapshot: {}", e)))?;
        Self::from_file(file)
    }

    /// Parse a TOML snapshot
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: SnapshotFile = toml::from_str(content)
            .map_err(|e| ConfigError::Load(format!("invalid snapshot: {}", e)))?;
        Self::from_file(file)
    }

    /// Read a snapshot file; `.toml` files are parsed as TOML, anything else as JSON
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let snapshot = if is_toml {
            Self::from_toml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };

        info!(
            path = %path.display(),
            groups = snapshot.groups.len(),
            "Loaded snapshot"
        );
        Ok(snapshot)
    }

    /// Load the snapshot a configuration points at
    ///
    /// `path_override` (e.g. from the command line) takes precedence over
    /// `snapshot.path`.
    pub fn load_configured(config: &AppConfig, path_override: Option<&str>) -> error::Result<Self> {
        let path = path_override
            .or(config.snapshot.path.as_deref())
            .ok_or_else(|| ConfigError::Missing {
                field: "snapshot.path".to_string(),
            })?;

        Ok(Self::load(Path::new(path))?)
    }

    fn from_file(file: SnapshotFile) -> Result<Self, ConfigError> {
        let tree_map = match &file.tree_map {
            Value::Null => TreeMap::new(),
            value => TreeMap::from_value(value)?,
        };

        let mut seen = BTreeSet::new();
        let mut groups = Vec::with_capacity(file.groups.len());
        for definition in file.groups {
            if !seen.insert(definition.id) {
                return Err(ConfigError::Invalid {
                    message: format!("duplicate group id {} in snapshot", definition.id),
                });
            }
            groups.push(UserGroup::try_from(definition)?);
        }

        Ok(Self {
            groups,
            tree_map,
            authors: file.authors,
        })
    }

    /// Build an access engine for a session over this snapshot
    pub fn into_engine(self, options: AccessOptions) -> AccessEngine {
        let store = Arc::new(MemoryGroupStore::new(self.groups));
        AccessEngine::new(options, store, self.tree_map).with_authors(self.authors)
    }
}
