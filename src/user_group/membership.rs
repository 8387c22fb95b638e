//! Object membership resolution
//!
//! Every object type resolves membership the same way, against the hierarchy
//! snapshot: an object belongs to a group if it is assigned directly or if
//! one of its listed ancestors is. [`ObjectMembershipHandler`] carries that
//! algorithm once; [`TreeMapResolver`] holds one handler per object type and
//! is what the engine talks to through [`MembershipResolver`].
//!
//! Only the entries the map lists for the node being resolved are visited.
//! There is no upward walk, so a cyclic map cannot cause a loop.

use crate::access_control::types::ObjectType;
use crate::tree_map::TreeMap;
use crate::user_group::assignment::{AssignmentInformation, ObjectSet, RecursiveMembership};
use crate::user_group::group::UserGroup;
use std::sync::Arc;
use tracing::trace;

/// Membership resolution for one object type, backed by a tree map
pub trait ObjectMembershipHandler {
    /// The object type this handler resolves
    fn object_type(&self) -> ObjectType;

    /// The hierarchy snapshot
    fn tree_map(&self) -> &TreeMap;

    /// Decide whether `object_id` belongs to `group`
    ///
    /// Without `recursive` this is the group's direct assignment check. With
    /// it, every ancestor that is itself directly assigned is recorded in the
    /// returned information, whether or not the object is also assigned.
    fn resolve_membership(
        &self,
        group: &UserGroup,
        object_id: &str,
        recursive: bool,
    ) -> Option<AssignmentInformation> {
        let object_type = self.object_type();

        if !recursive {
            return group.is_assigned_directly(object_type, object_id);
        }

        let mut recursive_membership = RecursiveMembership::new();

        if let Some(parents) = self.tree_map().parents_of(object_type, object_id) {
            for (ancestor_id, ancestor_type) in parents {
                // a node listed as its own ancestor
                if *ancestor_type == object_type && ancestor_id == object_id {
                    continue;
                }

                if let Some(info) = group.is_assigned_directly(*ancestor_type, ancestor_id) {
                    trace!(
                        group_id = group.id(),
                        object = object_id,
                        ancestor = %ancestor_id,
                        ancestor_type = %ancestor_type,
                        "Membership through ancestor"
                    );
                    recursive_membership
                        .entry(*ancestor_type)
                        .or_default()
                        .insert(ancestor_id.clone(), info);
                }
            }
        }

        let direct = group.is_assigned_directly(object_type, object_id);

        if direct.is_none() && recursive_membership.is_empty() {
            return None;
        }

        Some(
            direct
                .unwrap_or_default()
                .with_recursive_membership(recursive_membership),
        )
    }

    /// All objects of this type the group covers
    ///
    /// Starts from the directly assigned objects. With `recursive`, children
    /// of those objects are added when the child is itself a simple member of
    /// the group under its own type. Only children of directly assigned
    /// objects are visited. Ids are unique in the result: a member child whose
    /// id is already present replaces that entry's type with its own.
    fn resolve_full_object_set(&self, group: &UserGroup, recursive: bool) -> ObjectSet {
        let object_type = self.object_type();
        let mut objects = group.assigned_objects(object_type);

        if !recursive {
            return objects;
        }

        let Some(children) = self.tree_map().children(object_type) else {
            return objects;
        };

        let descendants: Vec<_> = children
            .iter()
            .filter(|(root, _)| objects.contains_key(*root))
            .flat_map(|(_, descendants)| descendants)
            .filter(|(descendant_id, descendant_type)| {
                group.is_member(**descendant_type, descendant_id)
            })
            .collect();

        for (descendant_id, descendant_type) in descendants {
            objects.insert(descendant_id.clone(), *descendant_type);
        }

        objects
    }
}

/// Handler for one object type over a shared tree map
#[derive(Debug, Clone)]
pub struct MapMembershipHandler {
    object_type: ObjectType,
    map: Arc<TreeMap>,
}

impl MapMembershipHandler {
    pub fn new(object_type: ObjectType, map: Arc<TreeMap>) -> Self {
        Self { object_type, map }
    }
}

impl ObjectMembershipHandler for MapMembershipHandler {
    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn tree_map(&self) -> &TreeMap {
        &self.map
    }
}

/// What the access engine needs from membership resolution
pub trait MembershipResolver: Send + Sync {
    /// Direct or recursive membership of one object in one group
    fn resolve_membership(
        &self,
        group: &UserGroup,
        object_type: ObjectType,
        object_id: &str,
        recursive: bool,
    ) -> Option<AssignmentInformation>;

    /// Objects of one type the group covers
    fn resolve_full_object_set(
        &self,
        group: &UserGroup,
        object_type: ObjectType,
        recursive: bool,
    ) -> ObjectSet;

    /// Swap in a new hierarchy snapshot
    fn replace_tree_map(&mut self, map: TreeMap);
}

/// Resolver holding one map-backed handler per object type
#[derive(Debug, Clone)]
pub struct TreeMapResolver {
    post: MapMembershipHandler,
    page: MapMembershipHandler,
    category: MapMembershipHandler,
    user: MapMembershipHandler,
    role: MapMembershipHandler,
}

impl TreeMapResolver {
    pub fn new(map: TreeMap) -> Self {
        let map = Arc::new(map);
        let handler = |object_type| MapMembershipHandler::new(object_type, Arc::clone(&map));

        Self {
            post: handler(ObjectType::Post),
            page: handler(ObjectType::Page),
            category: handler(ObjectType::Category),
            user: handler(ObjectType::User),
            role: handler(ObjectType::Role),
        }
    }

    /// The handler for an object type
    pub fn handler(&self, object_type: ObjectType) -> &MapMembershipHandler {
        match object_type {
            ObjectType::Post => &self.post,
            ObjectType::Page => &self.page,
            ObjectType::Category => &self.category,
            ObjectType::User => &self.user,
            ObjectType::Role => &self.role,
        }
    }
}

impl Default for TreeMapResolver {
    fn default() -> Self {
        Self::new(TreeMap::new())
    }
}

impl MembershipResolver for TreeMapResolver {
    fn resolve_membership(
        &self,
        group: &UserGroup,
        object_type: ObjectType,
        object_id: &str,
        recursive: bool,
    ) -> Option<AssignmentInformation> {
        self.handler(object_type)
            .resolve_membership(group, object_id, recursive)
    }

    fn resolve_full_object_set(
        &self,
        group: &UserGroup,
        object_type: ObjectType,
        recursive: bool,
    ) -> ObjectSet {
        self.handler(object_type)
            .resolve_full_object_set(group, recursive)
    }

    fn replace_tree_map(&mut self, map: TreeMap) {
        *self = Self::new(map);
    }
}
