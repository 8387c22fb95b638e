//! Access control types
//!
//! Core types used by the access control system.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

/// Identifier of a protected object (post id, category id, user id, role name)
pub type ObjectId = String;

/// Kind of object that can be assigned to a user group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectType {
    Post,
    Page,
    Category,
    User,
    Role,
}

impl ObjectType {
    /// Get the object type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Post => "post",
            ObjectType::Page => "page",
            ObjectType::Category => "category",
            ObjectType::User => "user",
            ObjectType::Role => "role",
        }
    }

    /// Try to parse an object type from a string
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "post" => Some(ObjectType::Post),
            "page" => Some(ObjectType::Page),
            "category" => Some(ObjectType::Category),
            "user" => Some(ObjectType::User),
            "role" => Some(ObjectType::Role),
            _ => None,
        }
    }

    /// Get all object types
    pub fn all() -> &'static [ObjectType] {
        &[
            ObjectType::Post,
            ObjectType::Page,
            ObjectType::Category,
            ObjectType::User,
            ObjectType::Role,
        ]
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Context an access decision is made in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AccessMode {
    /// Viewing the object (front end)
    #[default]
    Read,
    /// Administering the object (admin panel)
    Write,
}

impl AccessMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
        }
    }

    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(AccessMode::Read),
            "write" => Some(AccessMode::Write),
            _ => None,
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a group gates access in a given mode
///
/// Older group records spell these `group` and `all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessScope {
    /// Only members (or matching IPs) get through
    #[default]
    #[serde(alias = "group")]
    Restricted,
    /// Anyone qualifies; the group does not gate access in this mode
    #[serde(alias = "all")]
    OpenToAll,
}

impl AccessScope {
    pub const fn is_open(&self) -> bool {
        matches!(self, AccessScope::OpenToAll)
    }
}

/// The actor an access decision is made for
///
/// A missing `level` never satisfies the full-access threshold, and a missing
/// `id` is never a direct group member or an author.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ActorContext {
    pub id: Option<ObjectId>,
    pub level: Option<u32>,
    pub address: Option<Ipv4Addr>,
}

impl ActorContext {
    /// An anonymous visitor with no privileges
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A logged in user
    pub fn user(id: impl Into<ObjectId>, level: Option<u32>) -> Self {
        Self {
            id: Some(id.into()),
            level,
            address: None,
        }
    }

    pub fn with_address(mut self, address: Ipv4Addr) -> Self {
        self.address = Some(address);
        self
    }

    /// Set the address from a raw remote address string.
    ///
    /// A malformed address is dropped, so it will not match any IP range.
    pub fn with_remote_addr(mut self, remote_addr: &str) -> Self {
        self.address = remote_addr.trim().parse().ok();
        self
    }

    /// Whether the actor's level meets `threshold`
    pub fn has_level(&self, threshold: u32) -> bool {
        self.level.is_some_and(|level| level >= threshold)
    }
}

/// Source of post authorship
pub trait AuthorLookup: Send + Sync {
    /// The id of the user who wrote the post, if known
    fn author_of(&self, post_id: &str) -> Option<ObjectId>;
}

impl AuthorLookup for HashMap<ObjectId, ObjectId> {
    fn author_of(&self, post_id: &str) -> Option<ObjectId> {
        self.get(post_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_type_roundtrip() {
        for object_type in ObjectType::all() {
            let s = object_type.as_str();
            let parsed = ObjectType::try_parse(s).unwrap();
            assert_eq!(*object_type, parsed);
        }
        assert_eq!(ObjectType::try_parse("widget"), None);
    }

    #[test]
    fn test_deserialize_scope_with_legacy_names() {
        let scope: AccessScope = serde_json::from_str(r#""open-to-all""#).unwrap();
        assert_eq!(scope, AccessScope::OpenToAll);

        let scope: AccessScope = serde_json::from_str(r#""all""#).unwrap();
        assert_eq!(scope, AccessScope::OpenToAll);

        let scope: AccessScope = serde_json::from_str(r#""group""#).unwrap();
        assert_eq!(scope, AccessScope::Restricted);

        assert!(serde_json::from_str::<AccessScope>(r#""everyone""#).is_err());
    }

    #[test]
    fn test_missing_level_fails_closed() {
        let actor = ActorContext::anonymous();
        assert!(!actor.has_level(0));

        let actor = ActorContext::user("7", Some(10));
        assert!(actor.has_level(10));
        assert!(!actor.has_level(11));
    }

    #[test]
    fn test_malformed_remote_addr_is_dropped() {
        let actor = ActorContext::anonymous().with_remote_addr("10.0.0.300");
        assert_eq!(actor.address, None);

        let actor = ActorContext::anonymous().with_remote_addr(" 10.0.0.5 ");
        assert_eq!(actor.address, Some(Ipv4Addr::new(10, 0, 0, 5)));
    }
}
