//! Registry of the groups known to a session

use crate::error::StoreError;
use crate::user_group::group::UserGroup;
use crate::user_group::store::GroupStore;
use crate::user_group::GroupId;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Session-scoped view of all user groups
///
/// Groups are loaded from the store on first use and kept for the rest of the
/// session. The registry does not know about derived membership data; whoever
/// mutates it is responsible for dropping such caches.
pub struct GroupRegistry {
    store: Arc<dyn GroupStore>,
    groups: Option<BTreeMap<GroupId, UserGroup>>,
}

impl GroupRegistry {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self {
            store,
            groups: None,
        }
    }

    /// All groups, ordered by id
    pub fn all(&mut self) -> Result<&BTreeMap<GroupId, UserGroup>, StoreError> {
        self.loaded().map(|groups| &*groups)
    }

    /// Look up a single group
    pub fn get(&mut self, group_id: GroupId) -> Result<Option<&UserGroup>, StoreError> {
        Ok(self.all()?.get(&group_id))
    }

    /// Insert or replace a group
    ///
    /// The bulk load runs first so it cannot overwrite the new entry later.
    pub fn add(&mut self, group: UserGroup) -> Result<(), StoreError> {
        let group_id = group.id();
        if self.loaded()?.insert(group_id, group).is_some() {
            debug!(group_id, "Replaced user group");
        } else {
            debug!(group_id, "Added user group");
        }
        Ok(())
    }

    /// Delete a group's stored state and evict it
    ///
    /// An unknown id is logged and ignored.
    pub fn remove(&mut self, group_id: GroupId) -> Result<Option<UserGroup>, StoreError> {
        let store = Arc::clone(&self.store);
        let groups = self.loaded()?;

        let Some(group) = groups.get(&group_id) else {
            warn!(group_id, "Tried to remove unknown user group");
            return Ok(None);
        };

        group.delete(store.as_ref())?;
        debug!(group_id, "Removed user group");
        Ok(groups.remove(&group_id))
    }

    /// Mutate a registered group in place
    pub fn update<R>(
        &mut self,
        group_id: GroupId,
        f: impl FnOnce(&mut UserGroup) -> R,
    ) -> Result<Option<R>, StoreError> {
        Ok(self.loaded()?.get_mut(&group_id).map(f))
    }

    /// Whether the bulk load has happened
    pub fn is_loaded(&self) -> bool {
        self.groups.is_some()
    }

    fn loaded(&mut self) -> Result<&mut BTreeMap<GroupId, UserGroup>, StoreError> {
        let groups = match self.groups.take() {
            Some(groups) => groups,
            None => {
                let groups: BTreeMap<_, _> = self
                    .store
                    .load_all_groups()?
                    .into_iter()
                    .map(|group| (group.id(), group))
                    .collect();
                info!(count = groups.len(), "Loaded user groups");
                groups
            }
        };

        Ok(self.groups.insert(groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user_group::store::MemoryGroupStore;

    fn registry_with(groups: Vec<UserGroup>) -> (Arc<MemoryGroupStore>, GroupRegistry) {
        let store = Arc::new(MemoryGroupStore::new(groups));
        let registry = GroupRegistry::new(store.clone());
        (store, registry)
    }

    #[test]
    fn test_all_loads_once() {
        let (store, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        assert!(!registry.is_loaded());

        assert_eq!(registry.all().unwrap().len(), 1);
        assert_eq!(registry.all().unwrap().len(), 1);
        assert_eq!(store.load_count(), 1);
        assert!(registry.is_loaded());
    }

    #[test]
    fn test_get() {
        let (_, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        assert_eq!(registry.get(1).unwrap().map(UserGroup::name), Some("a"));
        assert!(registry.get(2).unwrap().is_none());
    }

    #[test]
    fn test_add_loads_first() {
        let (store, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        registry.add(UserGroup::new(2, "b")).unwrap();

        assert_eq!(store.load_count(), 1);
        let ids: Vec<_> = registry.all().unwrap().keys().copied().collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_add_replaces() {
        let (_, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        registry.add(UserGroup::new(1, "renamed")).unwrap();
        assert_eq!(registry.get(1).unwrap().map(UserGroup::name), Some("renamed"));
    }

    #[test]
    fn test_remove_deletes_from_store() {
        let (store, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        let removed = registry.remove(1).unwrap();

        assert_eq!(removed.map(|g| g.id()), Some(1));
        assert!(!store.contains(1));
        assert!(registry.get(1).unwrap().is_none());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let (store, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        assert!(registry.remove(42).unwrap().is_none());
        assert!(store.contains(1));
    }

    #[test]
    fn test_remove_group_added_in_session() {
        let (store, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        registry.add(UserGroup::new(3, "c")).unwrap();

        let removed = registry.remove(3).unwrap();
        assert_eq!(removed.map(|g| g.id()), Some(3));
        assert!(registry.get(3).unwrap().is_none());
        assert!(store.contains(1));
    }

    struct ReadOnlyStore;

    impl GroupStore for ReadOnlyStore {
        fn load_all_groups(&self) -> Result<Vec<UserGroup>, StoreError> {
            Ok(vec![UserGroup::new(1, "a")])
        }

        fn delete_group(&self, group: &UserGroup) -> Result<(), StoreError> {
            Err(StoreError::Delete {
                group_id: group.id(),
                reason: "read-only".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_delete_keeps_group() {
        let mut registry = GroupRegistry::new(Arc::new(ReadOnlyStore));

        assert!(matches!(
            registry.remove(1),
            Err(StoreError::Delete { group_id: 1, .. })
        ));
        assert!(registry.get(1).unwrap().is_some());
    }

    #[test]
    fn test_update() {
        let (_, mut registry) = registry_with(vec![UserGroup::new(1, "a")]);
        let updated = registry
            .update(1, |g| g.set_description("changed"))
            .unwrap();
        assert!(updated.is_some());
        assert_eq!(registry.get(1).unwrap().unwrap().description(), "changed");
        assert!(registry.update(9, |_| ()).unwrap().is_none());
    }
}
