//! Owning handles to reference-counted arena objects
//!
//! Shapes and shape wrappers live in arenas owned by the physics world, but
//! their lifetime is governed by manual reference counts: whoever holds a
//! slot pointing at a shape holds one reference to it. [`RefHandle`] makes
//! that accounting mechanical. Cloning a handle adds exactly one reference,
//! dropping it releases exactly one, and moving it transfers ownership
//! without touching the count.
//!
//! The arena never counts as an owner. Objects whose count reaches zero are
//! removed by the arena's `reclaim` sweep.

use slotmap::Key;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared reference counter of one arena object
pub(crate) type RefCount = Arc<AtomicU32>;

/// One counted reference to the arena object identified by `K`
pub struct RefHandle<K: Key> {
    key: K,
    count: RefCount,
}

impl<K: Key> RefHandle<K> {
    /// Counter for a freshly inserted object, starting at its birth reference
    pub(crate) fn new_count() -> RefCount {
        Arc::new(AtomicU32::new(1))
    }

    /// Wrap the birth reference of an object stored under `key`
    pub(crate) fn birth(key: K, count: &RefCount) -> Self {
        Self { key, count: Arc::clone(count) }
    }

    /// Arena key of the referenced object
    pub fn key(&self) -> K {
        self.key
    }

    /// Current number of references held on the object
    pub fn ref_count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }
}

impl<K: Key> Clone for RefHandle<K> {
    fn clone(&self) -> Self {
        self.count.fetch_add(1, Ordering::AcqRel);
        Self {
            key: self.key,
            count: Arc::clone(&self.count),
        }
    }
}

impl<K: Key> Drop for RefHandle<K> {
    fn drop(&mut self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<K: Key> PartialEq for RefHandle<K> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Key> Eq for RefHandle<K> {}

impl<K: Key> fmt::Debug for RefHandle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefHandle")
            .field("key", &self.key)
            .field("refs", &self.ref_count())
            .finish()
    }
}
