use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::UploadTarget;
use crate::services::UploadBehavior;

/// Application state shared across requests. Needs to be thread-safe.
pub struct AppState {
    /// Attachment handling for the record's file attribute.
    pub behavior: UploadBehavior,
    /// Stored records by id. Each record has its own lock, so that two writes
    /// to the same record never interleave their lifecycle hooks.
    pub records: DashMap<u64, Arc<Mutex<UploadTarget>>>,
    next_id: AtomicU64,
}

impl AppState {
    /// Creates an empty record store around `behavior`.
    pub fn new(behavior: UploadBehavior) -> Self {
        info!(
            attribute = %behavior.attribute(),
            "Initializing application state"
        );

        Self {
            behavior,
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Hands out the next record identifier.
    pub fn allocate_id(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, "Record id allocated");
        id
    }

    /// The lock guarding record `id`, if it exists.
    pub fn record(&self, id: u64) -> Option<Arc<Mutex<UploadTarget>>> {
        self.records.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}
