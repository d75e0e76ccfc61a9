//! Deduplicating key-to-id allocation shared by all workers.

use crate::models::EntityId;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::hash::Hash;
use tracing::trace;

struct Inner<K> {
    ids: FxHashMap<K, EntityId>,
    next_id: EntityId,
}

/// Thread-safe bijection from external keys to dense ids starting at 1.
///
/// Lookups of known keys only take the shared lock. A miss takes the exclusive
/// lock and checks again before allocating, so concurrent callers racing on
/// the same new key all observe the single id allocated by whoever wins.
pub struct IdentityRegistry<K = String> {
    inner: RwLock<Inner<K>>,
}

impl<K: Eq + Hash> Default for IdentityRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> IdentityRegistry<K> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                ids: FxHashMap::default(),
                next_id: 1,
            }),
        }
    }

    /// Returns the id for `key`, allocating the next one if the key is new.
    /// The flag is `true` only for the call that performed the allocation.
    pub fn get_or_create<Q>(&self, key: &Q) -> (EntityId, bool)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(&id) = self.inner.read().ids.get(key) {
            return (id, false);
        }

        let mut inner = self.inner.write();
        if let Some(&id) = inner.ids.get(key) {
            return (id, false);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        inner.ids.insert(key.to_owned(), id);
        trace!(id, "Allocated id");
        (id, true)
    }

    pub fn try_get<Q>(&self, key: &Q) -> Option<EntityId>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().ids.get(key).copied()
    }

    /// Highest id issued so far, 0 when nothing has been allocated.
    pub fn max_id(&self) -> EntityId {
        self.inner.read().next_id - 1
    }

    pub fn len(&self) -> usize {
        self.inner.read().ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every key and restarts numbering at 1.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.ids.clear();
        inner.next_id = 1;
    }
}
