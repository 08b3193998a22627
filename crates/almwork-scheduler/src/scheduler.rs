use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{Result, SchedulerError};
use crate::locks::ProjectLocks;
use crate::model::{ScheduleRequest, ScheduleResult, ScheduleStatus, TaskAdjustment};
use crate::solver;

/// Entry point for the scheduling subsystem: runs the deterministic solver
/// off the async runtime, bounded by a timeout, and keeps the last
/// successful schedule per project so manual adjustments and read paths
/// have somewhere to apply against. An infeasible solve never overwrites a
/// previously stored schedule.
pub struct Scheduler {
    schedules: DashMap<String, ScheduleResult>,
    locks: ProjectLocks,
    solve_timeout: Duration,
}

impl Scheduler {
    #[must_use]
    pub fn new(solve_timeout_secs: u64) -> Self {
        Self {
            schedules: DashMap::new(),
            locks: ProjectLocks::new(),
            solve_timeout: Duration::from_secs(solve_timeout_secs),
        }
    }

    /// Runs the solver for `request`, storing the result if it's optimal or
    /// feasible. The solve itself is CPU-bound and runs on the blocking
    /// pool, bounded by the configured timeout.
    pub async fn solve(&self, request: ScheduleRequest) -> Result<ScheduleResult> {
        let project_id = request.project_id.clone();
        let _guard = self.locks.acquire(&project_id).await;

        let previous_version = self.schedules.get(&project_id).map_or(0, |s| s.version);

        let handle = tokio::task::spawn_blocking(move || solver::solve(&request));
        let timeout_secs = self.solve_timeout.as_secs();
        let joined = tokio::time::timeout(self.solve_timeout, handle)
            .await
            .map_err(|_| SchedulerError::Timeout(timeout_secs))?;
        let mut result = joined.map_err(|_| SchedulerError::SolverPanicked)?;

        if result.status != ScheduleStatus::Infeasible {
            result.version = previous_version + 1;
            self.schedules.insert(project_id, result.clone());
        } else {
            tracing::warn!(conflicts = result.conflicts.len(), "schedule infeasible, keeping previous schedule");
        }

        Ok(result)
    }

    #[must_use]
    pub fn get(&self, project_id: &str) -> Option<ScheduleResult> {
        self.schedules.get(project_id).map(|r| r.clone())
    }

    /// Applies manual start/end overrides to an already-computed schedule.
    /// Does not re-run dependency/resource/deadline checks: this is an
    /// explicit override, not a re-solve.
    pub async fn update(
        &self,
        project_id: &str,
        adjustments: &HashMap<Uuid, TaskAdjustment>,
    ) -> Result<ScheduleResult> {
        let _guard = self.locks.acquire(project_id).await;

        let mut entry = self
            .schedules
            .get_mut(project_id)
            .ok_or_else(|| SchedulerError::NoSchedule(project_id.to_string()))?;

        for (task_id, adjustment) in adjustments {
            let task = entry
                .schedule
                .iter_mut()
                .find(|t| t.task_id == *task_id)
                .ok_or(SchedulerError::UnknownTask(*task_id))?;

            match (adjustment.start, adjustment.end) {
                (Some(start), Some(end)) => {
                    task.start = start;
                    task.end = end;
                    task.duration_hours = duration_hours(start, end);
                }
                (Some(start), None) => {
                    task.start = start;
                    task.end = start + chrono::Duration::hours(i64::from(task.duration_hours));
                }
                (None, Some(end)) => {
                    task.end = end;
                    task.start = end - chrono::Duration::hours(i64::from(task.duration_hours));
                }
                (None, None) => {}
            }
        }

        entry.schedule.sort_by_key(|t| t.start);
        entry.project_start = entry.schedule.iter().map(|t| t.start).min();
        entry.project_end = entry.schedule.iter().map(|t| t.end).max();
        entry.project_duration_hours = match (entry.project_start, entry.project_end) {
            (Some(start), Some(end)) => duration_hours(start, end),
            _ => 0,
        };
        entry.version += 1;

        Ok(entry.clone())
    }
}

fn duration_hours(start: chrono::DateTime<chrono::Utc>, end: chrono::DateTime<chrono::Utc>) -> u32 {
    u32::try_from((end - start).num_hours().max(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScheduleConstraints, SchedulableTask};
    use chrono::{TimeZone, Utc};

    fn constraints() -> ScheduleConstraints {
        ScheduleConstraints {
            project_start: Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap(),
            horizon_days: 30,
            working_hours_per_day: 8,
            respect_weekends: false,
            project_deadline: None,
        }
    }

    fn simple_task(id: Uuid) -> SchedulableTask {
        SchedulableTask {
            id,
            title: "only task".into(),
            estimated_hours: 8,
            dependencies: vec![],
            required_resources: vec![],
            resource_demand: HashMap::new(),
            earliest_start: None,
            deadline: None,
            skills_needed: vec![],
        }
    }

    #[tokio::test]
    async fn solve_stores_optimal_schedule_and_update_applies_overrides() {
        let scheduler = Scheduler::new(60);
        let task_id = Uuid::new_v4();
        let request = ScheduleRequest {
            project_id: "proj-1".into(),
            tasks: vec![simple_task(task_id)],
            resources: vec![],
            constraints: constraints(),
            milestones: vec![],
        };
        let result = scheduler.solve(request).await.unwrap();
        assert_eq!(result.status, ScheduleStatus::Optimal);
        assert_eq!(result.version, 1);

        let new_start = Utc.with_ymd_and_hms(2026, 3, 10, 9, 0, 0).unwrap();
        let mut adjustments = HashMap::new();
        adjustments.insert(task_id, TaskAdjustment { start: Some(new_start), end: None });
        let updated = scheduler.update("proj-1", &adjustments).await.unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.schedule[0].start, new_start);
        assert_eq!(updated.schedule[0].duration_hours, 8);
    }

    #[tokio::test]
    async fn infeasible_solve_does_not_clobber_previous_schedule() {
        let scheduler = Scheduler::new(60);
        let task_id = Uuid::new_v4();
        let good = ScheduleRequest {
            project_id: "proj-2".into(),
            tasks: vec![simple_task(task_id)],
            resources: vec![],
            constraints: constraints(),
            milestones: vec![],
        };
        scheduler.solve(good).await.unwrap();

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cyclic_a = simple_task(a);
        cyclic_a.dependencies.push(crate::model::TaskDependency {
            predecessor_id: b,
            dependency_type: crate::model::DependencyType::FinishToStart,
            lag: 0,
        });
        let mut cyclic_b = simple_task(b);
        cyclic_b.dependencies.push(crate::model::TaskDependency {
            predecessor_id: a,
            dependency_type: crate::model::DependencyType::FinishToStart,
            lag: 0,
        });
        let bad = ScheduleRequest {
            project_id: "proj-2".into(),
            tasks: vec![cyclic_a, cyclic_b],
            resources: vec![],
            constraints: constraints(),
            milestones: vec![],
        };
        let result = scheduler.solve(bad).await.unwrap();
        assert_eq!(result.status, ScheduleStatus::Infeasible);

        let stored = scheduler.get("proj-2").unwrap();
        assert_eq!(stored.status, ScheduleStatus::Optimal);
        assert_eq!(stored.schedule.len(), 1);
    }
}
