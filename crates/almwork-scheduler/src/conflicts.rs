//! Conflict synthesis: the diagnostics a real CP-SAT solver would report via
//! an infeasible/unsat core, reconstructed directly from the input data.
//! Mirrors the conflict vocabulary of the system this crate replaces:
//! circular dependency, missing dependency/resource, resource
//! over-allocation, impossible deadline.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::calendar::datetime_to_hours;
use crate::model::{ConflictType, ScheduleConflict, ScheduleConstraints, SchedulableTask, SchedulerMilestone, SchedulerResource};

/// Dangling dependency/resource references. Cheap enough, and meaningful
/// enough, that these are reported even when a cycle is found elsewhere and
/// short-circuits the rest of synthesis.
pub fn referential_conflicts(tasks: &[SchedulableTask], resources: &[SchedulerResource]) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();
    let known_tasks: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    let known_resources: HashMap<Uuid, &SchedulerResource> = resources.iter().map(|r| (r.id, r)).collect();

    for task in tasks {
        for dep in &task.dependencies {
            if !known_tasks.contains(&dep.predecessor_id) {
                conflicts.push(ScheduleConflict {
                    conflict_type: ConflictType::MissingDependency,
                    description: format!(
                        "task '{}' depends on unknown task {}",
                        task.title, dep.predecessor_id
                    ),
                    affected_tasks: vec![task.id],
                    affected_resources: vec![],
                    suggestion: "remove the dependency or add the missing task".to_string(),
                });
            }
        }
        for resource_id in &task.required_resources {
            if !known_resources.contains_key(resource_id) {
                conflicts.push(ScheduleConflict {
                    conflict_type: ConflictType::MissingResource,
                    description: format!(
                        "task '{}' requires unknown resource {}",
                        task.title, resource_id
                    ),
                    affected_tasks: vec![task.id],
                    affected_resources: vec![*resource_id],
                    suggestion: "remove the requirement or add the missing resource".to_string(),
                });
            }
        }
    }

    conflicts
}

/// Capacity and deadline checks that assume the dependency graph is acyclic:
/// resources provably over-committed across the whole horizon, and tasks
/// whose own deadline can't fit their duration.
pub fn capacity_conflicts(
    tasks: &[SchedulableTask],
    resources: &[SchedulerResource],
    constraints: &ScheduleConstraints,
) -> Vec<ScheduleConflict> {
    let mut conflicts = Vec::new();
    let horizon_hours = u64::from(constraints.horizon_hours());
    for resource in resources {
        let total_demand: u64 = tasks
            .iter()
            .filter(|t| t.required_resources.contains(&resource.id))
            .map(|t| u64::from(t.demand_for(resource.id)) * u64::from(t.estimated_hours))
            .sum();
        let capacity_hours = u64::from(resource.capacity) * horizon_hours;
        if total_demand > capacity_hours {
            conflicts.push(ScheduleConflict {
                conflict_type: ConflictType::ResourceOverallocation,
                description: format!(
                    "resource '{}' needs {total_demand}h of capacity but only {capacity_hours}h are available over the horizon",
                    resource.name
                ),
                affected_tasks: tasks
                    .iter()
                    .filter(|t| t.required_resources.contains(&resource.id))
                    .map(|t| t.id)
                    .collect(),
                affected_resources: vec![resource.id],
                suggestion: "add capacity, extend the horizon, or reduce demand".to_string(),
            });
        }
    }

    for task in tasks {
        if let Some(deadline) = task.deadline {
            let deadline_hours = datetime_to_hours(
                constraints.project_start,
                deadline,
                constraints.working_hours_per_day,
                constraints.respect_weekends,
            );
            let earliest_start_hours = task.earliest_start.map_or(0, |es| {
                datetime_to_hours(
                    constraints.project_start,
                    es,
                    constraints.working_hours_per_day,
                    constraints.respect_weekends,
                )
            });
            let available = deadline_hours.saturating_sub(earliest_start_hours);
            if available < task.estimated_hours {
                conflicts.push(ScheduleConflict {
                    conflict_type: ConflictType::ImpossibleDeadline,
                    description: format!(
                        "task '{}' needs {}h but only {available}h remain before its deadline",
                        task.title, task.estimated_hours
                    ),
                    affected_tasks: vec![task.id],
                    affected_resources: vec![],
                    suggestion: "push the deadline back or reduce the estimate".to_string(),
                });
            }
        }
    }

    conflicts
}

pub fn cycle_conflict(cycle: &[Uuid]) -> ScheduleConflict {
    ScheduleConflict {
        conflict_type: ConflictType::CircularDependency,
        description: format!(
            "circular dependency chain: {}",
            cycle.iter().map(Uuid::to_string).collect::<Vec<_>>().join(" -> ")
        ),
        affected_tasks: cycle.to_vec(),
        affected_resources: vec![],
        suggestion: "break the cycle by removing one of the dependencies in the chain".to_string(),
    }
}

/// Checks a manual milestone constraint against already-computed task end
/// times (in hours-since-start). Returns a conflict if the milestone's
/// dependent tasks finish after its target date.
pub fn milestone_conflict(
    milestone: &SchedulerMilestone,
    end_hours: &HashMap<Uuid, u32>,
    constraints: &ScheduleConstraints,
) -> Option<ScheduleConflict> {
    if !milestone.is_manual_constraint {
        return None;
    }
    let target_hours = {
        use chrono::{TimeZone, Utc};
        let target = Utc
            .from_utc_datetime(&milestone.target_date.and_hms_opt(23, 59, 59).expect("valid time"));
        datetime_to_hours(
            constraints.project_start,
            target,
            constraints.working_hours_per_day,
            constraints.respect_weekends,
        )
    };
    let latest_dependency_end = milestone
        .task_ids
        .iter()
        .filter_map(|id| end_hours.get(id).copied())
        .max()?;
    if latest_dependency_end > target_hours {
        Some(ScheduleConflict {
            conflict_type: ConflictType::ImpossibleDeadline,
            description: format!(
                "milestone '{}' targets {} but its dependent tasks finish {}h later",
                milestone.title,
                milestone.target_date,
                latest_dependency_end - target_hours
            ),
            affected_tasks: milestone.task_ids.clone(),
            affected_resources: vec![],
            suggestion: "move the milestone date back or re-sequence its dependent tasks".to_string(),
        })
    } else {
        None
    }
}
