use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Striped per-project locks, the same shape as `almwork_sprint::locks::ProjectLocks`:
/// every solve/update against a project's stored schedule holds this guard for
/// the duration of its read-modify-write, so concurrent requests against the
/// same project serialize while distinct projects never contend.
#[derive(Default)]
pub struct ProjectLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ProjectLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, project_id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(project_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}
