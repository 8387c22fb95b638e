//! Group persistence collaborator
//!
//! The engine never persists groups itself. It loads them once per session
//! through a [`GroupStore`] and asks the store to delete a group's state when
//! the group is removed.

use crate::error::StoreError;
use crate::user_group::group::UserGroup;
use crate::user_group::GroupId;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Source of truth for user groups
pub trait GroupStore: Send + Sync {
    /// Load every stored group, in storage order
    fn load_all_groups(&self) -> Result<Vec<UserGroup>, StoreError>;

    /// Delete the stored state of a group
    ///
    /// Deleting a group that was never stored succeeds.
    fn delete_group(&self, group: &UserGroup) -> Result<(), StoreError>;
}

/// In-memory group store, used for snapshots and tests
#[derive(Debug, Default)]
pub struct MemoryGroupStore {
    groups: Mutex<BTreeMap<GroupId, UserGroup>>,
    loads: AtomicUsize,
}

impl MemoryGroupStore {
    pub fn new(groups: impl IntoIterator<Item = UserGroup>) -> Self {
        Self {
            groups: Mutex::new(groups.into_iter().map(|g| (g.id(), g)).collect()),
            loads: AtomicUsize::new(0),
        }
    }

    /// How many times the groups were loaded
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    /// Whether a group is still stored
    pub fn contains(&self, group_id: GroupId) -> bool {
        self.lock().contains_key(&group_id)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<GroupId, UserGroup>> {
        self.groups.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("group store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl GroupStore for MemoryGroupStore {
    fn load_all_groups(&self) -> Result<Vec<UserGroup>, StoreError> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(self.lock().values().cloned().collect())
    }

    fn delete_group(&self, group: &UserGroup) -> Result<(), StoreError> {
        if self.lock().remove(&group.id()).is_none() {
            tracing::debug!(group_id = group.id(), "Group was not stored, nothing to delete");
        }
        Ok(())
    }
}
