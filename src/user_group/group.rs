//! The user group entity

use crate::access_control::ip_range::IpRangeMatcher;
use crate::access_control::types::{AccessMode, AccessScope, ObjectId, ObjectType};
use crate::error::{ConfigError, StoreError};
use crate::user_group::assignment::{AssignmentInformation, ObjectSet};
use crate::user_group::store::GroupStore;
use crate::user_group::GroupId;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// One access group: scopes, IP ranges and directly assigned objects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserGroup {
    id: GroupId,
    name: String,
    description: String,
    read_access: AccessScope,
    write_access: AccessScope,
    ip_ranges: IpRangeMatcher,
    objects: BTreeMap<ObjectType, BTreeSet<ObjectId>>,
}

impl UserGroup {
    /// Create a restricted group with no ranges and no objects
    pub fn new(id: GroupId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            read_access: AccessScope::Restricted,
            write_access: AccessScope::Restricted,
            ip_ranges: IpRangeMatcher::empty(),
            objects: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn read_access(&self) -> AccessScope {
        self.read_access
    }

    pub fn write_access(&self) -> AccessScope {
        self.write_access
    }

    /// The scope that applies in `mode`
    pub fn scope_for(&self, mode: AccessMode) -> AccessScope {
        match mode {
            AccessMode::Read => self.read_access,
            AccessMode::Write => self.write_access,
        }
    }

    pub fn ip_ranges(&self) -> &IpRangeMatcher {
        &self.ip_ranges
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_read_access(&mut self, scope: AccessScope) {
        self.read_access = scope;
    }

    pub fn set_write_access(&mut self, scope: AccessScope) {
        self.write_access = scope;
    }

    /// Replace the IP ranges; the group is left untouched if any range is invalid
    pub fn set_ip_ranges(&mut self, ranges: &[String]) -> Result<(), ConfigError> {
        self.ip_ranges = IpRangeMatcher::new(ranges)?;
        Ok(())
    }

    /// Assign an object directly. Returns false if it already was.
    pub fn add_object(&mut self, object_type: ObjectType, object_id: impl Into<ObjectId>) -> bool {
        self.objects
            .entry(object_type)
            .or_default()
            .insert(object_id.into())
    }

    /// Drop a direct assignment. Returns false if there was none.
    pub fn remove_object(&mut self, object_type: ObjectType, object_id: &str) -> bool {
        let Some(ids) = self.objects.get_mut(&object_type) else {
            return false;
        };
        let removed = ids.remove(object_id);
        if ids.is_empty() {
            self.objects.remove(&object_type);
        }
        removed
    }

    pub fn with_read_access(mut self, scope: AccessScope) -> Self {
        self.read_access = scope;
        self
    }

    pub fn with_write_access(mut self, scope: AccessScope) -> Self {
        self.write_access = scope;
        self
    }

    pub fn with_ip_ranges(mut self, ranges: &[&str]) -> Result<Self, ConfigError> {
        let ranges: Vec<String> = ranges.iter().map(|r| r.to_string()).collect();
        self.set_ip_ranges(&ranges)?;
        Ok(self)
    }

    pub fn with_object(mut self, object_type: ObjectType, object_id: impl Into<ObjectId>) -> Self {
        self.add_object(object_type, object_id);
        self
    }

    /// Direct assignment check, with the information that produced it
    pub fn is_assigned_directly(
        &self,
        object_type: ObjectType,
        object_id: &str,
    ) -> Option<AssignmentInformation> {
        self.is_member(object_type, object_id)
            .then(AssignmentInformation::direct)
    }

    /// Simple membership test: is the object itself assigned to this group
    pub fn is_member(&self, object_type: ObjectType, object_id: &str) -> bool {
        self.objects
            .get(&object_type)
            .is_some_and(|ids| ids.contains(object_id))
    }

    /// Directly assigned objects of one type
    pub fn assigned_objects(&self, object_type: ObjectType) -> ObjectSet {
        self.objects
            .get(&object_type)
            .map(|ids| ids.iter().map(|id| (id.clone(), object_type)).collect())
            .unwrap_or_default()
    }

    /// Delete this group's stored state
    pub fn delete(&self, store: &dyn GroupStore) -> Result<(), StoreError> {
        store.delete_group(self)
    }
}

/// Serialized form of a group, as found in snapshots
#[derive(Debug, Clone, Deserialize)]
pub struct GroupDefinition {
    pub id: GroupId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub read_access: AccessScope,

    #[serde(default)]
    pub write_access: AccessScope,

    /// Ranges like `10.0.0.1-10.0.0.255` or a single address
    #[serde(default)]
    pub ip_ranges: Vec<String>,

    /// Directly assigned object ids, keyed by object type name
    #[serde(default)]
    pub objects: BTreeMap<String, Vec<ObjectId>>,
}

impl TryFrom<GroupDefinition> for UserGroup {
    type Error = ConfigError;

    fn try_from(definition: GroupDefinition) -> Result<Self, Self::Error> {
        let mut group = UserGroup::new(definition.id, definition.name)
            .with_read_access(definition.read_access)
            .with_write_access(definition.write_access);
        group.set_description(definition.description);
        group.set_ip_ranges(&definition.ip_ranges)?;

        for (type_name, ids) in definition.objects {
            let object_type = ObjectType::try_parse(&type_name)
                .ok_or(ConfigError::UnknownObjectType(type_name))?;
            for id in ids {
                group.add_object(object_type, id);
            }
        }

        Ok(group)
    }
}
