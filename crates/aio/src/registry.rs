//! Id-indexed table of open handles.
//!
//! The registry maps each [`HandleId`] to the canonical handle wrapper through
//! a weak reference, so looking a handle up by id never keeps it alive. Entries
//! are removed when the handle's close executes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use crate::handle::{HandleGuard, HandleId};

#[derive(Debug)]
pub(crate) struct HandleRegistry {
    handles: DashMap<HandleId, Weak<HandleGuard>>,
    next_id: AtomicU64,
}

impl HandleRegistry {
    pub(crate) fn new() -> Self {
        Self {
            handles: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates an id; ids are never reused.
    pub(crate) fn allocate(&self) -> HandleId {
        HandleId::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn insert(&self, id: HandleId, guard: &Arc<HandleGuard>) {
        self.handles.insert(id, Arc::downgrade(guard));
    }

    pub(crate) fn resolve(&self, id: HandleId) -> Option<Arc<HandleGuard>> {
        self.handles.get(&id).and_then(|entry| entry.upgrade())
    }

    pub(crate) fn remove(&self, id: HandleId) {
        self.handles.remove(&id);
    }

    /// Number of handles whose close has not executed yet.
    pub(crate) fn len(&self) -> usize {
        self.handles.len()
    }
}
