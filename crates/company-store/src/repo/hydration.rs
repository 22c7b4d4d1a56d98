//! Hydration layer - resolves database rows to canonical in-memory objects
//!
//! Each repository owns one `IdentityMap`. Resolving a row whose id is
//! already mapped returns the mapped object unchanged and discards the row's
//! values, so changes made to the database behind the repository's back are
//! not visible for cached ids. Entries are never evicted except by `delete`
//! or an explicit `clear`.

use crate::repo::entity::Entity;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared handle to the canonical object for one row
///
/// Clones point at the same object; use [`EntityRef::ptr_eq`] to test
/// identity.
pub struct EntityRef<E> {
    inner: Arc<RwLock<E>>,
}

impl<E> Clone for EntityRef<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: Entity> EntityRef<E> {
    /// Wrap a record that is not (yet) mapped
    pub fn new(entity: E) -> Self {
        Self {
            inner: Arc::new(RwLock::new(entity)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, E> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, E> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current row id
    pub fn id(&self) -> Option<i64> {
        self.read().id()
    }

    /// Copy of the current field values
    pub fn snapshot(&self) -> E {
        self.read().clone()
    }

    /// True when both handles refer to the same object
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<E: Entity + fmt::Debug> fmt::Debug for EntityRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityRef").field(&*self.read()).finish()
    }
}

impl<E: Entity + fmt::Display> fmt::Display for EntityRef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.read(), f)
    }
}

/// Primary key to canonical object, for one entity type
pub struct IdentityMap<E> {
    entries: Mutex<HashMap<i64, EntityRef<E>>>,
}

impl<E: Entity> Default for IdentityMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> IdentityMap<E> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<i64, EntityRef<E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the mapped object for `id`, or map `fresh` under `id`
    ///
    /// On a hit `fresh` is dropped; the cached values win.
    pub fn resolve(&self, id: i64, fresh: E) -> EntityRef<E> {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(&id) {
            tracing::trace!(table = E::TABLE, row_id = id, "Identity map hit");
            return existing.clone();
        }

        let mut entity = fresh;
        entity.set_id(Some(id));
        let handle = EntityRef::new(entity);
        entries.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: i64) -> Option<EntityRef<E>> {
        self.lock().get(&id).cloned()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.lock().contains_key(&id)
    }

    /// Map `handle` under `id`, replacing any previous entry
    pub fn insert(&self, id: i64, handle: EntityRef<E>) {
        self.lock().insert(id, handle);
    }

    pub fn remove(&self, id: i64) -> Option<EntityRef<E>> {
        self.lock().remove(&id)
    }

    /// Unmap `id` only if it still maps to `handle`
    pub fn remove_if_same(&self, id: i64, handle: &EntityRef<E>) -> bool {
        let mut entries = self.lock();
        match entries.get(&id) {
            Some(existing) if existing.ptr_eq(handle) => {
                entries.remove(&id);
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every mapped object
    ///
    /// Handles already given out stay valid but are no longer canonical.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use company_core::model::Department;

    #[test]
    fn test_resolve_miss_assigns_id_and_maps() {
        let map = IdentityMap::new();

        let handle = map.resolve(4, Department::new("Sales"));

        assert_eq!(handle.id(), Some(4));
        assert!(map.contains(4));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_resolve_hit_discards_fresh_values() {
        let map = IdentityMap::new();
        let first = map.resolve(1, Department::new("Sales"));

        let second = map.resolve(1, Department::new("Renamed elsewhere"));

        assert!(first.ptr_eq(&second));
        assert_eq!(second.read().name, "Sales");
    }

    #[test]
    fn test_writes_are_visible_through_every_handle() {
        let map = IdentityMap::new();
        let a = map.resolve(2, Department::new("Ops"));
        let b = map.get(2).unwrap();

        a.write().name = "Platform".to_string();

        assert_eq!(b.read().name, "Platform");
    }

    #[test]
    fn test_remove_and_clear() {
        let map = IdentityMap::new();
        map.resolve(1, Department::new("A"));
        map.resolve(2, Department::new("B"));

        assert!(map.remove(1).is_some());
        assert!(map.remove(1).is_none());
        map.clear();

        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_if_same_keeps_other_handles() {
        let map = IdentityMap::new();
        let mapped = map.resolve(3, Department::new("Ops"));
        let stranger = EntityRef::new(Department::new("Ops"));

        assert!(!map.remove_if_same(3, &stranger));
        assert!(map.contains(3));
        assert!(map.remove_if_same(3, &mapped));
        assert!(!map.contains(3));
    }

    #[test]
    fn test_display_delegates_to_record() {
        let handle = EntityRef::new(Department::new("Legal"));

        assert_eq!(handle.to_string(), "Department(id=None, name=Legal)");
    }
}
