use std::collections::BTreeSet;
use std::sync::Mutex;

use uuid::Uuid;

/// Ids whose index entry may be stale, waiting for `reconcile_index`.
#[derive(Default)]
pub struct ReconcileQueue {
    ids: Mutex<BTreeSet<Uuid>>,
}

impl ReconcileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeSet<Uuid>> {
        // The set stays consistent even if a holder panicked mid-insert.
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, id: Uuid) {
        if self.lock().insert(id) {
            tracing::warn!(asset_id = %id, "Queued for index reconciliation");
        }
    }

    pub fn drain(&self) -> Vec<Uuid> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.lock().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
