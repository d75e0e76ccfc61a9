use crate::error::IndexError;
use crate::models::{EntityId, Relation};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};

/// Append-only log of (paper, author) pairs.
///
/// Entries keep the position they were appended at. Order across threads is
/// whatever order the appends won the lock in.
#[derive(Default)]
pub struct RelationLog {
    entries: RwLock<Vec<Relation>>,
}

impl RelationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair and returns its index.
    pub fn append(&self, left: EntityId, right: EntityId) -> usize {
        let mut entries = self.entries.write();
        entries.push((left, right));
        entries.len() - 1
    }

    /// Appends all pairs under one lock acquisition, keeping them contiguous.
    pub fn extend(&self, pairs: impl IntoIterator<Item = Relation>) {
        self.entries.write().extend(pairs);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Result<Relation, IndexError> {
        let entries = self.entries.read();
        entries.get(index).copied().ok_or(IndexError::OutOfRange {
            index,
            len: entries.len(),
        })
    }

    /// Read view over the whole log. Appends block while the view is alive.
    pub fn entries(&self) -> MappedRwLockReadGuard<'_, [Relation]> {
        RwLockReadGuard::map(self.entries.read(), |v| v.as_slice())
    }
}
