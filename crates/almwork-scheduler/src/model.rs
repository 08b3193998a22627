use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Scheduling dependency kind between two tasks: finish-to-start,
/// start-to-start, or finish-to-finish, each with an optional lag in hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    FinishToStart,
    StartToStart,
    FinishToFinish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDependency {
    pub predecessor_id: Uuid,
    pub dependency_type: DependencyType,
    /// Lag in hours, applied on top of the dependency constraint.
    pub lag: i64,
}

/// One task handed to the scheduler. Distinct from `almwork_domain::WorkItem`:
/// this is the solver's input shape, assembled by the caller from whatever
/// subset of work-item/task data the project actually needs scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulableTask {
    pub id: Uuid,
    pub title: String,
    pub estimated_hours: u32,
    #[serde(default)]
    pub dependencies: Vec<TaskDependency>,
    #[serde(default)]
    pub required_resources: Vec<Uuid>,
    /// Per-resource demand; resources not listed default to demand 1.
    #[serde(default)]
    pub resource_demand: HashMap<Uuid, u32>,
    pub earliest_start: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub skills_needed: Vec<String>,
}

impl SchedulableTask {
    #[must_use]
    pub fn demand_for(&self, resource_id: Uuid) -> u32 {
        self.resource_demand.get(&resource_id).copied().unwrap_or(1)
    }
}

/// A resource as the scheduler sees it: just enough to run the cumulative
/// capacity constraint, independent of `almwork_domain::Resource`'s fuller
/// HR/allocation shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerResource {
    pub id: Uuid,
    pub name: String,
    pub capacity: u32,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub lead: bool,
}

/// A milestone as the scheduler sees it. `is_manual_constraint=true` means
/// `target_date` is enforced as a deadline on `max(end_i for i in task_ids)`;
/// otherwise the projected completion date is read back, not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerMilestone {
    pub id: Uuid,
    pub title: String,
    pub target_date: NaiveDate,
    pub is_manual_constraint: bool,
    pub task_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConstraints {
    pub project_start: DateTime<Utc>,
    pub horizon_days: u32,
    pub working_hours_per_day: u32,
    pub respect_weekends: bool,
    pub project_deadline: Option<DateTime<Utc>>,
}

impl ScheduleConstraints {
    #[must_use]
    pub fn horizon_hours(&self) -> u32 {
        self.horizon_days * self.working_hours_per_day
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Optimal,
    Feasible,
    Infeasible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_hours: u32,
    pub assigned_resources: Vec<Uuid>,
    pub is_critical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    MissingDependency,
    MissingResource,
    CircularDependency,
    ResourceOverallocation,
    ImpossibleDeadline,
}

impl ConflictType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingDependency => "missing_dependency",
            Self::MissingResource => "missing_resource",
            Self::CircularDependency => "circular_dependency",
            Self::ResourceOverallocation => "resource_overallocation",
            Self::ImpossibleDeadline => "impossible_deadline",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConflict {
    pub conflict_type: ConflictType,
    pub description: String,
    #[serde(default)]
    pub affected_tasks: Vec<Uuid>,
    #[serde(default)]
    pub affected_resources: Vec<Uuid>,
    pub suggestion: String,
}

/// Output of [`crate::Scheduler::solve`], and what's retained as "the last
/// successful schedule" per project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub status: ScheduleStatus,
    pub schedule: Vec<ScheduledTask>,
    pub critical_path: Vec<Uuid>,
    pub project_start: Option<DateTime<Utc>>,
    pub project_end: Option<DateTime<Utc>>,
    pub project_duration_hours: u32,
    pub conflicts: Vec<ScheduleConflict>,
    pub version: u32,
}

/// Input to [`crate::Scheduler::solve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub project_id: String,
    pub tasks: Vec<SchedulableTask>,
    pub resources: Vec<SchedulerResource>,
    pub constraints: ScheduleConstraints,
    #[serde(default)]
    pub milestones: Vec<SchedulerMilestone>,
}

/// A manual per-task override applied by [`crate::Scheduler::update`].
/// Exactly one of `start`/`end` is typically given; the other is
/// recomputed from the task's stored `duration_hours`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskAdjustment {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}
