//! Access decision engine
//!
//! Decides whether an actor may access an object, with the following
//! precedence (first match wins):
//! 1. The object belongs to no group (unrestricted)
//! 2. The actor's level meets the full-access threshold
//! 3. The object is a post authored by the actor, if authors may access their own
//! 4. Per covering group: the actor's address is in the group's IP ranges,
//!    or the actor is directly assigned to the group
//! 5. Every covering group is open to all in the current mode
//!
//! Anything else is denied. Group sets and verdicts are memoized for the
//! session and dropped whenever groups or the hierarchy change.

use crate::access_control::types::{AccessMode, ActorContext, AuthorLookup, ObjectId, ObjectType};
use crate::config::AccessOptions;
use crate::error::{AccessDeniedError, AccessResult};
use crate::tree_map::TreeMap;
use crate::user_group::{
    AssignmentInformation, GroupId, GroupRegistry, GroupStore, MembershipResolver, ObjectSet,
    TreeMapResolver, UserGroup,
};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};

/// A group covering an object, with the reason it does
///
/// The group is a copy taken when the membership was resolved; changing it
/// does not affect the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectGroup {
    pub group: UserGroup,
    pub assignment: AssignmentInformation,
}

/// Groups covering one object, by group id
pub type ObjectGroups = BTreeMap<GroupId, ObjectGroup>;

/// Why access was granted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantReason {
    /// The object belongs to no group
    Unrestricted,
    /// The actor's level meets the full-access threshold
    FullAccessLevel,
    /// The actor wrote the post
    Author,
    /// The actor's address matched a group's IP range
    IpRange { group_id: GroupId, range: String },
    /// The actor is directly assigned to a covering group
    GroupMember { group_id: GroupId },
    /// Every covering group is open to all in this mode
    OpenGroups,
}

impl fmt::Display for GrantReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrantReason::Unrestricted => write!(f, "object is not restricted by any group"),
            GrantReason::FullAccessLevel => write!(f, "user level grants full access"),
            GrantReason::Author => write!(f, "user is the author"),
            GrantReason::IpRange { group_id, range } => {
                write!(f, "address is in range '{}' of group {}", range, group_id)
            }
            GrantReason::GroupMember { group_id } => {
                write!(f, "user is a member of group {}", group_id)
            }
            GrantReason::OpenGroups => write!(f, "all covering groups are open to all"),
        }
    }
}

/// Result of access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is allowed
    Allowed(GrantReason),
    /// Access is denied with a reason
    Denied(String),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed(_))
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DecisionKey {
    object_type: ObjectType,
    object_id: ObjectId,
    mode: AccessMode,
    actor: ActorContext,
}

/// Everything that changes during a session, behind one lock
struct SessionState {
    registry: GroupRegistry,
    resolver: Box<dyn MembershipResolver>,
    groups_by_object: HashMap<(ObjectType, ObjectId), ObjectGroups>,
    decisions: HashMap<DecisionKey, AccessDecision>,
}

impl SessionState {
    fn clear_caches(&mut self) {
        self.groups_by_object.clear();
        self.decisions.clear();
    }

    fn groups_for_object(
        &mut self,
        object_type: ObjectType,
        object_id: &str,
    ) -> AccessResult<&ObjectGroups> {
        let key = (object_type, object_id.to_string());

        if !self.groups_by_object.contains_key(&key) {
            let mut object_groups = ObjectGroups::new();

            for (group_id, group) in self.registry.all()? {
                if let Some(assignment) =
                    self.resolver
                        .resolve_membership(group, object_type, object_id, true)
                {
                    object_groups.insert(
                        *group_id,
                        ObjectGroup {
                            group: group.clone(),
                            assignment,
                        },
                    );
                }
            }

            trace!(
                object_type = %object_type,
                object_id,
                groups = object_groups.len(),
                "Resolved object groups"
            );
            self.groups_by_object.insert(key.clone(), object_groups);
        }

        Ok(&self.groups_by_object[&key])
    }
}

/// Session-scoped access decision engine
///
/// All methods take `&self`; registry and caches are guarded by a single
/// mutex, so one engine can be shared between threads serving the same
/// session.
pub struct AccessEngine {
    options: AccessOptions,
    authors: Box<dyn AuthorLookup>,
    state: Mutex<SessionState>,
}

impl AccessEngine {
    /// Create an engine resolving membership against `tree_map`
    pub fn new(options: AccessOptions, store: Arc<dyn GroupStore>, tree_map: TreeMap) -> Self {
        Self::with_resolver(options, store, Box::new(TreeMapResolver::new(tree_map)))
    }

    /// Create an engine with a custom membership resolver
    pub fn with_resolver(
        options: AccessOptions,
        store: Arc<dyn GroupStore>,
        resolver: Box<dyn MembershipResolver>,
    ) -> Self {
        Self {
            options,
            authors: Box::new(HashMap::<ObjectId, ObjectId>::new()),
            state: Mutex::new(SessionState {
                registry: GroupRegistry::new(store),
                resolver,
                groups_by_object: HashMap::new(),
                decisions: HashMap::new(),
            }),
        }
    }

    /// Use `authors` to find who wrote a post
    pub fn with_authors(mut self, authors: impl AuthorLookup + 'static) -> Self {
        self.authors = Box::new(authors);
        self
    }

    pub fn options(&self) -> &AccessOptions {
        &self.options
    }

    /// Groups covering an object, directly or through an ancestor
    ///
    /// Objects in no group yield an empty map.
    pub fn groups_for_object(
        &self,
        object_type: ObjectType,
        object_id: &str,
    ) -> AccessResult<ObjectGroups> {
        let mut state = self.lock();
        state.groups_for_object(object_type, object_id).cloned()
    }

    /// Whether `actor` may access the object in `mode`
    pub fn decide(
        &self,
        object_type: ObjectType,
        object_id: &str,
        actor: &ActorContext,
        mode: AccessMode,
    ) -> AccessResult<bool> {
        self.check(object_type, object_id, actor, mode)
            .map(|decision| decision.is_allowed())
    }

    /// Like [`decide`](Self::decide), with the reason for the verdict
    pub fn check(
        &self,
        object_type: ObjectType,
        object_id: &str,
        actor: &ActorContext,
        mode: AccessMode,
    ) -> AccessResult<AccessDecision> {
        debug!(
            object_type = %object_type,
            object_id,
            mode = %mode,
            actor = ?actor.id,
            "Checking access"
        );

        let key = DecisionKey {
            object_type,
            object_id: object_id.to_string(),
            mode,
            actor: actor.clone(),
        };

        let mut state = self.lock();

        if let Some(decision) = state.decisions.get(&key) {
            trace!("Using memoized decision");
            return Ok(decision.clone());
        }

        let membership = state.groups_for_object(object_type, object_id)?;
        let decision = self.evaluate(object_type, object_id, actor, mode, membership);

        debug!(allowed = decision.is_allowed(), ?decision, "Access decided");
        state.decisions.insert(key, decision.clone());
        Ok(decision)
    }

    /// Check access, returning an error if denied
    pub fn require(
        &self,
        object_type: ObjectType,
        object_id: &str,
        actor: &ActorContext,
        mode: AccessMode,
    ) -> AccessResult<()> {
        match self.check(object_type, object_id, actor, mode)? {
            AccessDecision::Allowed(_) => Ok(()),
            AccessDecision::Denied(reason) => {
                Err(AccessDeniedError::new(object_type.as_str(), object_id, reason).into())
            }
        }
    }

    fn evaluate(
        &self,
        object_type: ObjectType,
        object_id: &str,
        actor: &ActorContext,
        mode: AccessMode,
        membership: &ObjectGroups,
    ) -> AccessDecision {
        if membership.is_empty() {
            trace!("Object belongs to no group");
            return AccessDecision::Allowed(GrantReason::Unrestricted);
        }

        if actor.has_level(self.options.full_access_level) {
            trace!(level = ?actor.level, "Actor has full access level");
            return AccessDecision::Allowed(GrantReason::FullAccessLevel);
        }

        if object_type == ObjectType::Post
            && self.options.authors_has_access_to_own
            && let Some(actor_id) = &actor.id
            && self.authors.author_of(object_id).as_deref() == Some(actor_id.as_str())
        {
            trace!("Actor is the author");
            return AccessDecision::Allowed(GrantReason::Author);
        }

        let mut gating = Vec::new();

        for (group_id, entry) in membership {
            if let Some(address) = actor.address
                && let Some(range) = entry.group.ip_ranges().find_match(address)
            {
                trace!(group_id, range, "Matched group IP range");
                return AccessDecision::Allowed(GrantReason::IpRange {
                    group_id: *group_id,
                    range: range.to_string(),
                });
            }

            if let Some(actor_id) = &actor.id
                && entry.group.is_member(ObjectType::User, actor_id)
            {
                trace!(group_id, "Actor is a direct group member");
                return AccessDecision::Allowed(GrantReason::GroupMember {
                    group_id: *group_id,
                });
            }

            if !entry.group.scope_for(mode).is_open() {
                gating.push(group_id.to_string());
            }
        }

        if gating.is_empty() {
            trace!("Only open groups cover the object");
            return AccessDecision::Allowed(GrantReason::OpenGroups);
        }

        AccessDecision::Denied(format!("restricted by group(s) {}", gating.join(", ")))
    }

    /// All registered groups, ordered by id
    pub fn groups(&self) -> AccessResult<Vec<UserGroup>> {
        let mut state = self.lock();
        Ok(state.registry.all()?.values().cloned().collect())
    }

    /// A single registered group
    pub fn group(&self, group_id: GroupId) -> AccessResult<Option<UserGroup>> {
        let mut state = self.lock();
        Ok(state.registry.get(group_id)?.cloned())
    }

    /// Objects of one type a group covers, or `None` for an unknown group
    pub fn objects_for_group(
        &self,
        group_id: GroupId,
        object_type: ObjectType,
        recursive: bool,
    ) -> AccessResult<Option<ObjectSet>> {
        let mut state = self.lock();
        let state = &mut *state;

        let Some(group) = state.registry.get(group_id)? else {
            return Ok(None);
        };

        Ok(Some(state.resolver.resolve_full_object_set(
            group,
            object_type,
            recursive,
        )))
    }

    /// Add or replace a group
    pub fn add_group(&self, group: UserGroup) -> AccessResult<()> {
        let mut state = self.lock();
        state.registry.add(group)?;
        state.clear_caches();
        Ok(())
    }

    /// Remove a group and delete its stored state
    ///
    /// Returns `None` if no such group was registered.
    pub fn remove_group(&self, group_id: GroupId) -> AccessResult<Option<UserGroup>> {
        let mut state = self.lock();
        let removed = state.registry.remove(group_id)?;
        if removed.is_some() {
            state.clear_caches();
        }
        Ok(removed)
    }

    /// Change a registered group's scopes, ranges or assignments
    ///
    /// Returns `None` if no such group was registered.
    pub fn update_group<R>(
        &self,
        group_id: GroupId,
        f: impl FnOnce(&mut UserGroup) -> R,
    ) -> AccessResult<Option<R>> {
        let mut state = self.lock();
        let result = state.registry.update(group_id, f)?;
        if result.is_some() {
            state.clear_caches();
        }
        Ok(result)
    }

    /// Swap in a new hierarchy snapshot
    pub fn replace_tree_map(&self, tree_map: TreeMap) {
        let mut state = self.lock();
        state.resolver.replace_tree_map(tree_map);
        state.clear_caches();
    }

    /// Drop all memoized group sets and decisions
    pub fn clear_cache(&self) {
        self.lock().clear_caches();
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("access session lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
