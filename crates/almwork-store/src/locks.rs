use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Striped per-id write locks: every mutating store operation holds the
/// guard for its work-item id across the whole read-modify-write, so two
/// concurrent updates to the same item serialize instead of racing, while
/// updates to different items never contend.
#[derive(Default)]
pub struct IdLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl IdLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: Uuid) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
