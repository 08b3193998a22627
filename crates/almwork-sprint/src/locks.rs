use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Striped per-project locks, the same shape as `almwork_store::locks::IdLocks`
/// but keyed by project id rather than work-item id: every operation that
/// touches a project's active-sprint-uniqueness invariant or backlog
/// membership holds the guard for its project across the whole
/// check-then-set, so two concurrent callers on the same project serialize
/// while distinct projects never contend.
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
