//! User groups and object membership
//!
//! A user group collects objects (posts, categories, users, ...) under one set
//! of access rules. Membership of an object is either direct, when the object
//! itself is assigned to the group, or recursive, when one of its ancestors in
//! the [`TreeMap`](crate::tree_map::TreeMap) is.

pub mod assignment;
pub mod group;
pub mod membership;
pub mod registry;
pub mod store;

/// Identifier of a user group
pub type GroupId = u64;

pub use assignment::{AssignmentInformation, ObjectSet};
pub use group::{GroupDefinition, UserGroup};
pub use membership::{
    MapMembershipHandler, MembershipResolver, ObjectMembershipHandler, TreeMapResolver,
};
pub use registry::GroupRegistry;
pub use store::{GroupStore, MemoryGroupStore};
