//! In-memory adapters for every persistence port.
//!
//! Used for tests and for running without `DATABASE_URL`. Each store keeps
//! all of its tables behind one `RwLock`, so a check-and-set on a status
//! column and any sibling writes happen under a single write guard.

mod attachments;
mod auth;
mod letters;

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use warta_core::{Entity, StoreError, StoreResult};

pub use attachments::InMemoryAttachmentStore;
pub use auth::InMemoryAuthStore;
pub use letters::InMemoryLetterStore;

/// Rows of one entity type keyed by id.
#[derive(Debug)]
pub(crate) struct EntityTable<E: Entity> {
    rows: HashMap<E::Id, E>,
}

impl<E: Entity> Default for EntityTable<E> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<E: Entity + Clone> EntityTable<E> {
    pub(crate) fn get(&self, id: E::Id) -> Option<&E> {
        self.rows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: E::Id) -> Option<&mut E> {
        self.rows.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, row: E) {
        self.rows.insert(row.id(), row);
    }

    pub(crate) fn remove(&mut self, id: E::Id) -> Option<E> {
        self.rows.remove(&id)
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &E> {
        self.rows.values()
    }

    pub(crate) fn any(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.rows.values().any(|row| pred(row))
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&E) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, row| keep(row));
        before - self.rows.len()
    }

    /// Replace the row when `guard` accepts the stored version.
    pub(crate) fn replace_if(&mut self, row: &E, guard: impl FnOnce(&E) -> bool) -> bool {
        match self.rows.get_mut(&row.id()) {
            Some(stored) if guard(stored) => {
                *stored = row.clone();
                true
            }
            _ => false,
        }
    }

    /// Matching rows, sorted with `order`.
    pub(crate) fn select(
        &self,
        mut pred: impl FnMut(&E) -> bool,
        order: impl FnMut(&E, &E) -> std::cmp::Ordering,
    ) -> Vec<E> {
        let mut rows: Vec<E> = self.rows.values().filter(|r| pred(r)).cloned().collect();
        rows.sort_by(order);
        rows
    }
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> StoreResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> StoreResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| StoreError::backend("in-memory store lock poisoned"))
}
