//! Controller registry
//!
//! Maps controller identity to its record. The map has its own reader/writer
//! lock and each record its own mutex, so a tick can snapshot the map, drop
//! the map lock, and then work through records one by one while controller
//! create and destroy events keep landing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::record::ControllerRecord;
use crate::foundation::logging::warn;
use crate::physics::ControllerId;

/// Shared handle to a record
pub type SharedRecord = Arc<Mutex<ControllerRecord>>;

/// Lock a record, recovering it if a previous holder panicked
pub(crate) fn lock_record(record: &Mutex<ControllerRecord>) -> MutexGuard<'_, ControllerRecord> {
    record.lock().unwrap_or_else(|poisoned| {
        warn!("Controller record lock poisoned, recovering");
        PoisonError::into_inner(poisoned)
    })
}

/// Records keyed by controller
#[derive(Debug, Default)]
pub struct ControllerRegistry {
    records: RwLock<HashMap<ControllerId, SharedRecord>>,
}

impl ControllerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ControllerId, SharedRecord>> {
        self.records.read().unwrap_or_else(|poisoned| {
            warn!("Controller registry lock poisoned, recovering read access");
            PoisonError::into_inner(poisoned)
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ControllerId, SharedRecord>> {
        self.records.write().unwrap_or_else(|poisoned| {
            warn!("Controller registry lock poisoned, recovering write access");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Track `record` under its controller, replacing any previous record.
    /// Returns the shared handle.
    pub fn insert(&self, record: ControllerRecord) -> SharedRecord {
        let id = record.controller();
        let shared = Arc::new(Mutex::new(record));
        if self.write().insert(id, Arc::clone(&shared)).is_some() {
            warn!("Controller {} registered twice, replacing its record", id.raw());
        }
        shared
    }

    /// Record of a controller
    pub fn get(&self, id: ControllerId) -> Option<SharedRecord> {
        self.read().get(&id).cloned()
    }

    /// Stop tracking a controller
    pub fn remove(&self, id: ControllerId) -> Option<SharedRecord> {
        self.write().remove(&id)
    }

    /// Whether a controller is tracked
    pub fn contains(&self, id: ControllerId) -> bool {
        self.read().contains_key(&id)
    }

    /// Copy of every entry, taken under the read lock
    pub fn snapshot(&self) -> Vec<(ControllerId, SharedRecord)> {
        self.read().iter().map(|(&id, record)| (id, Arc::clone(record))).collect()
    }

    /// Number of tracked controllers
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every record
    pub fn clear(&self) {
        self.write().clear();
    }
}
