//! Why an object belongs to a group

use crate::access_control::types::{ObjectId, ObjectType};
use std::collections::BTreeMap;

/// Objects keyed by id, each with its own type
pub type ObjectSet = BTreeMap<ObjectId, ObjectType>;

/// Ancestors that made an object a member: type -> ancestor id -> info
pub type RecursiveMembership = BTreeMap<ObjectType, BTreeMap<ObjectId, AssignmentInformation>>;

/// Assignment details produced by one membership resolution
///
/// An empty `recursive_membership` means the object is a member only because
/// it is assigned directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentInformation {
    pub recursive_membership: RecursiveMembership,
}

impl AssignmentInformation {
    /// Information for a plain direct assignment
    pub fn direct() -> Self {
        Self::default()
    }

    pub fn with_recursive_membership(mut self, recursive_membership: RecursiveMembership) -> Self {
        self.recursive_membership = recursive_membership;
        self
    }

    /// Whether membership was inherited from at least one ancestor
    pub fn is_recursive(&self) -> bool {
        !self.recursive_membership.is_empty()
    }

    /// The ancestors membership was inherited through
    pub fn ancestors(&self) -> impl Iterator<Item = (ObjectType, &str)> + '_ {
        self.recursive_membership
            .iter()
            .flat_map(|(object_type, ids)| ids.keys().map(move |id| (*object_type, id.as_str())))
    }

    /// Whether `object_id` of `object_type` contributed to the membership
    pub fn has_ancestor(&self, object_type: ObjectType, object_id: &str) -> bool {
        self.recursive_membership
            .get(&object_type)
            .is_some_and(|ids| ids.contains_key(object_id))
    }
}
