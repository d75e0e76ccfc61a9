use crate::error::LookupError;
use crate::models::EntityId;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;

/// Thread-safe id-to-payload map. Writes upsert, the last one wins.
pub struct KeyedStore<V> {
    items: DashMap<EntityId, V, FxBuildHasher>,
}

impl<V> Default for KeyedStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KeyedStore<V> {
    pub fn new() -> Self {
        Self {
            items: DashMap::with_hasher(FxBuildHasher),
        }
    }

    /// Returns `true` if an earlier payload for `id` was replaced.
    pub fn store(&self, id: EntityId, value: V) -> bool {
        self.items.insert(id, value).is_some()
    }

    /// Runs `f` against the stored payload without cloning it.
    pub fn with<R>(&self, id: EntityId, f: impl FnOnce(&V) -> R) -> Result<R, LookupError> {
        self.items
            .get(&id)
            .map(|entry| f(entry.value()))
            .ok_or(LookupError::NotFound { id })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<V: Clone> KeyedStore<V> {
    pub fn get(&self, id: EntityId) -> Result<V, LookupError> {
        self.with(id, V::clone)
    }
}
