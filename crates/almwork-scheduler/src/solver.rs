//! Pure, synchronous scheduling pass: takes a [`ScheduleRequest`] and
//! produces a [`ScheduleResult`]. CPU-bound and deterministic by
//! construction, so it's safe to run inside `spawn_blocking` without
//! touching any shared state.

use std::collections::HashMap;

use uuid::Uuid;

use crate::calendar::hours_to_datetime;
use crate::conflicts::{capacity_conflicts, cycle_conflict, milestone_conflict, referential_conflicts};
use crate::critical_path::critical_path;
use crate::graph::{find_cycle, topological_order};
use crate::model::{
    ScheduleConflict, ScheduleRequest, ScheduleResult, ScheduleStatus, ScheduledTask, SchedulableTask,
    SchedulerResource,
};
use crate::placement::place_all;

pub fn solve(request: &ScheduleRequest) -> ScheduleResult {
    let tasks: HashMap<Uuid, SchedulableTask> = request.tasks.iter().cloned().map(|t| (t.id, t)).collect();
    let resources: HashMap<Uuid, SchedulerResource> = request.resources.iter().cloned().map(|r| (r.id, r)).collect();

    let referential = referential_conflicts(&request.tasks, &request.resources);

    if let Some(cycle) = find_cycle(&request.tasks) {
        let mut conflicts = referential;
        conflicts.push(cycle_conflict(&cycle));
        return infeasible(conflicts, 0);
    }

    let mut conflicts = referential;
    conflicts.extend(capacity_conflicts(&request.tasks, &request.resources, &request.constraints));
    if !conflicts.is_empty() {
        return infeasible(conflicts, 0);
    }

    let order = topological_order(&request.tasks);

    let earliest_start_hours: HashMap<Uuid, u32> = tasks
        .iter()
        .filter_map(|(id, t)| {
            t.earliest_start.map(|es| {
                let hours = crate::calendar::datetime_to_hours(
                    request.constraints.project_start,
                    es,
                    request.constraints.working_hours_per_day,
                    request.constraints.respect_weekends,
                );
                (*id, hours)
            })
        })
        .collect();

    let placements = place_all(&tasks, &resources, &order, &earliest_start_hours);

    let horizon_hours = request.constraints.horizon_hours();
    let mut overflow_conflicts = Vec::new();
    for &id in &order {
        let placement = placements[&id];
        if placement.end > horizon_hours {
            overflow_conflicts.push(ScheduleConflict {
                conflict_type: crate::model::ConflictType::ImpossibleDeadline,
                description: format!(
                    "task '{}' finishes at hour {} which is past the {horizon_hours}h horizon",
                    tasks[&id].title, placement.end
                ),
                affected_tasks: vec![id],
                affected_resources: vec![],
                suggestion: "extend the horizon or remove work from the critical path".to_string(),
            });
        }
        if let Some(deadline) = tasks[&id].deadline {
            let deadline_hours = crate::calendar::datetime_to_hours(
                request.constraints.project_start,
                deadline,
                request.constraints.working_hours_per_day,
                request.constraints.respect_weekends,
            );
            if placement.end > deadline_hours {
                overflow_conflicts.push(ScheduleConflict {
                    conflict_type: crate::model::ConflictType::ImpossibleDeadline,
                    description: format!(
                        "task '{}' is placed to finish at hour {} past its deadline at hour {deadline_hours}",
                        tasks[&id].title, placement.end
                    ),
                    affected_tasks: vec![id],
                    affected_resources: vec![],
                    suggestion: "relax the deadline or reduce upstream contention".to_string(),
                });
            }
        }
    }

    let end_hours: HashMap<Uuid, u32> = order.iter().map(|id| (*id, placements[id].end)).collect();
    for milestone in &request.milestones {
        if let Some(conflict) = milestone_conflict(milestone, &end_hours, &request.constraints) {
            overflow_conflicts.push(conflict);
        }
    }

    if !overflow_conflicts.is_empty() {
        return infeasible(overflow_conflicts, 0);
    }

    let critical = critical_path(&tasks, &order).into_iter().collect::<Vec<_>>();
    let critical_set: std::collections::HashSet<Uuid> = critical.iter().copied().collect();

    let mut schedule: Vec<ScheduledTask> = order
        .iter()
        .map(|&id| {
            let task = &tasks[&id];
            let placement = placements[&id];
            ScheduledTask {
                task_id: id,
                title: task.title.clone(),
                start: hours_to_datetime(
                    request.constraints.project_start,
                    placement.start,
                    request.constraints.working_hours_per_day,
                    request.constraints.respect_weekends,
                ),
                end: hours_to_datetime(
                    request.constraints.project_start,
                    placement.end,
                    request.constraints.working_hours_per_day,
                    request.constraints.respect_weekends,
                ),
                duration_hours: task.estimated_hours,
                assigned_resources: task.required_resources.clone(),
                is_critical: critical_set.contains(&id),
            }
        })
        .collect();
    schedule.sort_by_key(|s| s.start);

    let project_start = schedule.iter().map(|s| s.start).min();
    let project_end = schedule.iter().map(|s| s.end).max();
    let project_duration_hours = order.iter().map(|id| placements[id].end).max().unwrap_or(0);

    ScheduleResult {
        status: ScheduleStatus::Optimal,
        schedule,
        critical_path: critical,
        project_start,
        project_end,
        project_duration_hours,
        conflicts: Vec::new(),
        version: 1,
    }
}

fn infeasible(conflicts: Vec<ScheduleConflict>, version: u32) -> ScheduleResult {
    ScheduleResult {
        status: ScheduleStatus::Infeasible,
        schedule: Vec::new(),
        critical_path: Vec::new(),
        project_start: None,
        project_end: None,
        project_duration_hours: 0,
        conflicts,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyType, ScheduleConstraints, TaskDependency};
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

    fn task(id: Uuid, hours: u32, deps: &[Uuid]) -> SchedulableTask {
        SchedulableTask {
            id,
            title: id.to_string(),
            estimated_hours: hours,
            dependencies: deps
                .iter()
                .map(|&p| TaskDependency { predecessor_id: p, dependency_type: DependencyType::FinishToStart, lag: 0 })
                .collect(),
            required_resources: vec![],
            resource_demand: HashMap::new(),
            earliest_start: None,
            deadline: None,
            skills_needed: vec![],
        }
    }

    #[test]
    fn diamond_dependency_solves_optimally_with_critical_path() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();
        let request = ScheduleRequest {
            project_id: "p1".into(),
            tasks: vec![task(a, 8, &[]), task(b, 16, &[a]), task(c, 8, &[a]), task(d, 8, &[b, c])],
            resources: vec![],
            constraints: constraints(),
            milestones: vec![],
        };
        let result = solve(&request);
        assert_eq!(result.status, ScheduleStatus::Optimal);
        assert_eq!(result.critical_path, vec![a, b, d]);
        assert_eq!(result.project_duration_hours, 32);
    }

    #[test]
    fn circular_dependency_is_infeasible() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let request = ScheduleRequest {
            project_id: "p1".into(),
            tasks: vec![task(a, 8, &[b]), task(b, 8, &[a])],
            resources: vec![],
            constraints: constraints(),
            milestones: vec![],
        };
        let result = solve(&request);
        assert_eq!(result.status, ScheduleStatus::Infeasible);
        assert!(result
            .conflicts
            .iter()
            .any(|c| c.conflict_type == crate::model::ConflictType::CircularDependency));
    }

    #[test]
    fn missing_dependency_is_reported_and_infeasible() {
        let a = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let request = ScheduleRequest {
            project_id: "p1".into(),
            tasks: vec![task(a, 8, &[ghost])],
            resources: vec![],
            constraints: constraints(),
            milestones: vec![],
        };
        let result = solve(&request);
        assert_eq!(result.status, ScheduleStatus::Infeasible);
        assert!(result
            .conflicts
            .iter()
            .any(|c| c.conflict_type == crate::model::ConflictType::MissingDependency));
    }
}
