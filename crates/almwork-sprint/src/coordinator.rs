use std::sync::Arc;

use almwork_domain::{AuditEvent, AuditSink, Backlog, Sprint, SprintStatus, WorkItemStatus};
use almwork_graph::{GraphExecutor, GraphQuery, PropertyFilter};
use almwork_store::WorkItemStore;
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::codec::{
    self, KeyedRow, SprintRoster, BACKLOG_LABEL, ROSTER_LABEL, SPRINT_LABEL,
};
use crate::error::SprintError;
use crate::locks::ProjectLocks;

/// Input to [`SprintCoordinator::create_sprint`]. `capacity_hours`/
/// `capacity_story_points` are admission ceilings; leaving either `None`
/// means that dimension is never checked for this sprint.
#[derive(Debug, Clone)]
pub struct CreateSprint {
    pub project_id: String,
    pub name: String,
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub capacity_hours: Option<f64>,
    pub capacity_story_points: Option<u32>,
}

/// One day of a sprint's burndown, covering both hour- and point-based
/// tracking since a sprint may admit on either dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurndownPoint {
    pub date: NaiveDate,
    pub ideal_remaining_hours: f64,
    pub actual_remaining_hours: f64,
    pub ideal_remaining_points: f64,
    pub actual_remaining_points: f64,
}

/// The sprint/backlog coordinator (C5): sprint lifecycle, capacity-admitted
/// task assignment, backlog membership, velocity, and burndown.
///
/// Built directly on [`WorkItemStore`] (C3) for task status/estimate
/// lookups and on [`GraphExecutor`] (C2) for its own `Sprint`/`Backlog`/
/// `SprintRoster` rows. At-most-one-active-sprint-per-project is enforced
/// with a per-project [`ProjectLocks`] guard held across the
/// check-then-set, the same pattern `almwork_store::locks::IdLocks` uses
/// for per-item write serialization.
pub struct SprintCoordinator {
    graph: Arc<dyn GraphExecutor>,
    store: Arc<WorkItemStore>,
    audit: Arc<dyn AuditSink>,
    project_locks: ProjectLocks,
}

impl SprintCoordinator {
    #[must_use]
    pub fn new(graph: Arc<dyn GraphExecutor>, store: Arc<WorkItemStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            graph,
            store,
            audit,
            project_locks: ProjectLocks::new(),
        }
    }

    async fn sprint_node(&self, id: Uuid) -> Result<Option<Sprint>, SprintError> {
        match self.graph.get_node(id).await? {
            Some(node) => Ok(Some(codec::sprint_from_props(node.props)?)),
            None => Ok(None),
        }
    }

    pub async fn get_sprint(&self, id: Uuid) -> Result<Sprint, SprintError> {
        self.sprint_node(id).await?.ok_or(SprintError::NotFound(id))
    }

    pub async fn list_sprints(&self, project_id: &str) -> Result<Vec<Sprint>, SprintError> {
        let query = GraphQuery::start_by_label(SPRINT_LABEL)
            .filter(PropertyFilter::eq("project_id", project_id));
        let rows = self.graph.execute_query(&query).await?;
        rows.into_iter().map(codec::sprint_from_props).collect()
    }

    async fn roster_row(&self, sprint_id: Uuid) -> Result<KeyedRow<SprintRoster>, SprintError> {
        let query = GraphQuery::start_by_label(ROSTER_LABEL)
            .filter(PropertyFilter::eq("sprint_id", sprint_id.to_string()))
            .limit(1);
        let mut rows = self.graph.execute_query(&query).await?;
        let props = rows
            .pop()
            .ok_or_else(|| SprintError::Codec(format!("sprint {sprint_id} has no roster row")))?;
        codec::roster_from_row(props)
    }

    async fn backlog_row(&self, project_id: &str) -> Result<Option<KeyedRow<Backlog>>, SprintError> {
        let query = GraphQuery::start_by_label(BACKLOG_LABEL)
            .filter(PropertyFilter::eq("project_id", project_id))
            .limit(1);
        let mut rows = self.graph.execute_query(&query).await?;
        rows.pop().map(codec::backlog_from_row).transpose()
    }

    async fn get_or_create_backlog(&self, project_id: &str) -> Result<KeyedRow<Backlog>, SprintError> {
        if let Some(row) = self.backlog_row(project_id).await? {
            return Ok(row);
        }
        let backlog = Backlog {
            project_id: project_id.to_string(),
            work_item_ids: Vec::new(),
            updated_at: Utc::now(),
        };
        let node = self
            .graph
            .create_node(BACKLOG_LABEL, codec::backlog_to_props(&backlog)?)
            .await?;
        Ok(KeyedRow {
            node_id: node.id,
            value: backlog,
        })
    }

    pub async fn get_backlog(&self, project_id: &str) -> Result<Backlog, SprintError> {
        Ok(self.get_or_create_backlog(project_id).await?.value)
    }

    /// Adds `work_item_id` to `project_id`'s backlog. Idempotent.
    pub async fn add_to_backlog(
        &self,
        project_id: &str,
        work_item_id: Uuid,
        caller: &str,
    ) -> Result<Backlog, SprintError> {
        let _guard = self.project_locks.acquire(project_id).await;
        let mut row = self.get_or_create_backlog(project_id).await?;
        if !row.value.work_item_ids.contains(&work_item_id) {
            row.value.work_item_ids.push(work_item_id);
            row.value.updated_at = Utc::now();
            self.graph
                .update_node(row.node_id, codec::backlog_to_props(&row.value)?)
                .await?;
            self.audit
                .record(AuditEvent::new(
                    "Backlog",
                    work_item_id,
                    "add_to_backlog",
                    caller,
                    row.value.updated_at,
                ))
                .await;
        }
        Ok(row.value)
    }

    async fn remove_from_backlog_locked(
        &self,
        project_id: &str,
        work_item_id: Uuid,
    ) -> Result<(), SprintError> {
        let Some(mut row) = self.backlog_row(project_id).await? else {
            return Ok(());
        };
        let before = row.value.work_item_ids.len();
        row.value.work_item_ids.retain(|id| *id != work_item_id);
        if row.value.work_item_ids.len() != before {
            row.value.updated_at = Utc::now();
            self.graph
                .update_node(row.node_id, codec::backlog_to_props(&row.value)?)
                .await?;
        }
        Ok(())
    }

    pub async fn remove_from_backlog(
        &self,
        project_id: &str,
        work_item_id: Uuid,
        caller: &str,
    ) -> Result<Backlog, SprintError> {
        let _guard = self.project_locks.acquire(project_id).await;
        self.remove_from_backlog_locked(project_id, work_item_id)
            .await?;
        self.audit
            .record(AuditEvent::new(
                "Backlog",
                work_item_id,
                "remove_from_backlog",
                caller,
                Utc::now(),
            ))
            .await;
        self.get_backlog(project_id).await
    }

    pub async fn create_sprint(
        &self,
        input: CreateSprint,
        caller: &str,
    ) -> Result<Sprint, SprintError> {
        let now = Utc::now();
        let sprint = Sprint {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            name: input.name,
            goal: input.goal,
            start_date: input.start_date,
            end_date: input.end_date,
            status: SprintStatus::Planning,
            capacity_hours: input.capacity_hours,
            capacity_story_points: input.capacity_story_points,
            actual_velocity_hours: 0.0,
            actual_velocity_story_points: 0,
            created_at: now,
            updated_at: now,
        };

        self.graph
            .create_node(SPRINT_LABEL, codec::sprint_to_props(&sprint)?)
            .await?;

        let roster = SprintRoster {
            sprint_id: sprint.id,
            work_item_ids: Vec::new(),
            updated_at: now,
        };
        self.graph
            .create_node(ROSTER_LABEL, codec::roster_to_props(&roster)?)
            .await?;

        self.audit
            .record(AuditEvent::new(
                "Sprint",
                sprint.id,
                "create_sprint",
                caller,
                now,
            ))
            .await;

        Ok(sprint)
    }

    fn require_transition(sprint: &Sprint, next: SprintStatus) -> Result<(), SprintError> {
        if sprint.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(SprintError::InvalidTransition(
                sprint.id,
                sprint.status.as_str(),
                next.as_str(),
            ))
        }
    }

    /// Transitions `planning -> active`, rejecting the attempt if
    /// `project_id` already has another active sprint. The check-then-set
    /// happens under the project's lock so two concurrent `start_sprint`
    /// calls for the same project can never both succeed.
    pub async fn start_sprint(&self, sprint_id: Uuid, caller: &str) -> Result<Sprint, SprintError> {
        let mut sprint = self.get_sprint(sprint_id).await?;
        Self::require_transition(&sprint, SprintStatus::Active)?;

        let _guard = self.project_locks.acquire(&sprint.project_id).await;
        let existing_active = self
            .list_sprints(&sprint.project_id)
            .await?
            .into_iter()
            .any(|s| s.id != sprint_id && s.status == SprintStatus::Active);
        if existing_active {
            return Err(SprintError::ActiveSprintExists(sprint.project_id));
        }

        let now = Utc::now();
        sprint.status = SprintStatus::Active;
        sprint.updated_at = now;
        self.graph
            .update_node(
                sprint_id,
                props([("status", json!("active")), ("updated_at", json!(now))]),
            )
            .await?;

        self.audit
            .record(AuditEvent::new(
                "Sprint",
                sprint_id,
                "start_sprint",
                caller,
                now,
            ))
            .await;

        Ok(sprint)
    }

    /// Transitions `planning -> cancelled`.
    pub async fn cancel_sprint(&self, sprint_id: Uuid, caller: &str) -> Result<Sprint, SprintError> {
        let mut sprint = self.get_sprint(sprint_id).await?;
        Self::require_transition(&sprint, SprintStatus::Cancelled)?;

        let now = Utc::now();
        sprint.status = SprintStatus::Cancelled;
        sprint.updated_at = now;
        self.graph
            .update_node(
                sprint_id,
                props([("status", json!("cancelled")), ("updated_at", json!(now))]),
            )
            .await?;

        self.audit
            .record(AuditEvent::new(
                "Sprint",
                sprint_id,
                "cancel_sprint",
                caller,
                now,
            ))
            .await;

        Ok(sprint)
    }

    /// Capacity-admitted assignment: `work_item_id` moves from the backlog
    /// to `sprint_id`'s roster, atomically in the sense that both sides are
    /// updated under the project's lock — no intermediate state where an
    /// item is in both, or neither.
    pub async fn assign_to_sprint(
        &self,
        sprint_id: Uuid,
        work_item_id: Uuid,
        caller: &str,
    ) -> Result<Vec<Uuid>, SprintError> {
        let sprint = self.get_sprint(sprint_id).await?;
        let _guard = self.project_locks.acquire(&sprint.project_id).await;

        let item = self
            .store
            .get(work_item_id)
            .await?
            .ok_or(SprintError::WorkItemNotFound(work_item_id))?;
        let mut roster = self.roster_row(sprint_id).await?;

        if sprint.capacity_hours.is_some() || sprint.capacity_story_points.is_some() {
            let mut hours = item.fields.estimated_hours.unwrap_or(0.0);
            let mut points = u64::from(item.fields.story_points.unwrap_or(0));
            for id in &roster.value.work_item_ids {
                if let Some(existing) = self.store.get(*id).await? {
                    hours += existing.fields.estimated_hours.unwrap_or(0.0);
                    points += u64::from(existing.fields.story_points.unwrap_or(0));
                }
            }
            if sprint.capacity_hours.is_some_and(|cap| hours > cap)
                || sprint
                    .capacity_story_points
                    .is_some_and(|cap| points > u64::from(cap))
            {
                return Err(SprintError::CapacityExceeded(work_item_id, sprint_id));
            }
        }

        if !roster.value.work_item_ids.contains(&work_item_id) {
            roster.value.work_item_ids.push(work_item_id);
            roster.value.updated_at = Utc::now();
            self.graph
                .update_node(roster.node_id, codec::roster_to_props(&roster.value)?)
                .await?;
        }
        self.remove_from_backlog_locked(&sprint.project_id, work_item_id)
            .await?;

        self.audit
            .record(
                AuditEvent::new("Sprint", sprint_id, "assign_to_sprint", caller, Utc::now())
                    .with_detail(json!({ "work_item_id": work_item_id })),
            )
            .await;

        Ok(roster.value.work_item_ids)
    }

    /// The inverse of [`Self::assign_to_sprint`], refused unless the task is
    /// still `ready` — an in-progress or completed task is not eligible to
    /// be pulled back out of a sprint.
    pub async fn return_to_backlog(
        &self,
        sprint_id: Uuid,
        work_item_id: Uuid,
        caller: &str,
    ) -> Result<(), SprintError> {
        let sprint = self.get_sprint(sprint_id).await?;
        let _guard = self.project_locks.acquire(&sprint.project_id).await;

        let item = self
            .store
            .get(work_item_id)
            .await?
            .ok_or(SprintError::WorkItemNotFound(work_item_id))?;
        if item.status != WorkItemStatus::Ready {
            return Err(SprintError::TaskNotReady(work_item_id));
        }

        let mut roster = self.roster_row(sprint_id).await?;
        roster.value.work_item_ids.retain(|id| *id != work_item_id);
        roster.value.updated_at = Utc::now();
        self.graph
            .update_node(roster.node_id, codec::roster_to_props(&roster.value)?)
            .await?;

        let mut backlog = self.get_or_create_backlog(&sprint.project_id).await?;
        if !backlog.value.work_item_ids.contains(&work_item_id) {
            backlog.value.work_item_ids.push(work_item_id);
            backlog.value.updated_at = Utc::now();
            self.graph
                .update_node(backlog.node_id, codec::backlog_to_props(&backlog.value)?)
                .await?;
        }

        self.audit
            .record(
                AuditEvent::new("Sprint", sprint_id, "return_to_backlog", caller, Utc::now())
                    .with_detail(json!({ "work_item_id": work_item_id })),
            )
            .await;

        Ok(())
    }

    /// `active -> completed`: computes velocity over the roster's completed
    /// tasks, writes it back to the sprint exactly once (no duplicate
    /// `updated_at` writes), and returns every incomplete `ready` task to
    /// the backlog.
    pub async fn complete_sprint(&self, sprint_id: Uuid, caller: &str) -> Result<Sprint, SprintError> {
        let mut sprint = self.get_sprint(sprint_id).await?;
        Self::require_transition(&sprint, SprintStatus::Completed)?;

        let _guard = self.project_locks.acquire(&sprint.project_id).await;
        let mut roster = self.roster_row(sprint_id).await?;

        let mut velocity_hours = 0.0;
        let mut velocity_points: u32 = 0;
        let mut still_assigned = Vec::with_capacity(roster.value.work_item_ids.len());

        for id in &roster.value.work_item_ids {
            let Some(item) = self.store.get(*id).await? else {
                continue;
            };
            if item.status == WorkItemStatus::Completed {
                velocity_hours += item.fields.estimated_hours.unwrap_or(0.0);
                velocity_points += item.fields.story_points.unwrap_or(0);
                still_assigned.push(*id);
            } else if item.status == WorkItemStatus::Ready {
                self.remove_from_backlog_locked(&sprint.project_id, *id)
                    .await?;
                let mut backlog = self.get_or_create_backlog(&sprint.project_id).await?;
                backlog.value.work_item_ids.push(*id);
                backlog.value.updated_at = Utc::now();
                self.graph
                    .update_node(backlog.node_id, codec::backlog_to_props(&backlog.value)?)
                    .await?;
            } else {
                // Neither completed nor ready (e.g. still in_progress):
                // stays on the historical roster without being requeued.
                still_assigned.push(*id);
            }
        }

        let now = Utc::now();
        roster.value.work_item_ids = still_assigned;
        roster.value.updated_at = now;
        self.graph
            .update_node(roster.node_id, codec::roster_to_props(&roster.value)?)
            .await?;

        sprint.status = SprintStatus::Completed;
        sprint.actual_velocity_hours = velocity_hours;
        sprint.actual_velocity_story_points = velocity_points;
        sprint.updated_at = now;
        self.graph
            .update_node(
                sprint_id,
                props([
                    ("status", json!("completed")),
                    ("actual_velocity_hours", json!(velocity_hours)),
                    ("actual_velocity_story_points", json!(velocity_points)),
                    ("updated_at", json!(now)),
                ]),
            )
            .await?;

        self.audit
            .record(AuditEvent::new(
                "Sprint",
                sprint_id,
                "complete_sprint",
                caller,
                now,
            ))
            .await;

        Ok(sprint)
    }

    /// Returns every eligible (`ready`) assigned task to the backlog, then
    /// detach-deletes the sprint and its roster row.
    pub async fn delete_sprint(&self, sprint_id: Uuid, caller: &str) -> Result<(), SprintError> {
        let sprint = self.get_sprint(sprint_id).await?;
        let _guard = self.project_locks.acquire(&sprint.project_id).await;
        let roster = self.roster_row(sprint_id).await?;

        for id in &roster.value.work_item_ids {
            let Some(item) = self.store.get(*id).await? else {
                continue;
            };
            if item.status == WorkItemStatus::Ready {
                let mut backlog = self.get_or_create_backlog(&sprint.project_id).await?;
                if !backlog.value.work_item_ids.contains(id) {
                    backlog.value.work_item_ids.push(*id);
                    backlog.value.updated_at = Utc::now();
                    self.graph
                        .update_node(backlog.node_id, codec::backlog_to_props(&backlog.value)?)
                        .await?;
                }
            }
        }

        self.graph.delete_node(roster.node_id).await?;
        self.graph.delete_node(sprint_id).await?;

        self.audit
            .record(AuditEvent::new(
                "Sprint",
                sprint_id,
                "delete_sprint",
                caller,
                Utc::now(),
            ))
            .await;

        Ok(())
    }

    /// Live velocity over `sprint_id`'s currently-assigned, currently-
    /// completed tasks — independent of whatever was last written back by
    /// [`Self::complete_sprint`].
    pub async fn velocity(&self, sprint_id: Uuid) -> Result<(f64, u32), SprintError> {
        let roster = self.roster_row(sprint_id).await?;
        let mut hours = 0.0;
        let mut points = 0;
        for id in &roster.value.work_item_ids {
            if let Some(item) = self.store.get(*id).await? {
                if item.status == WorkItemStatus::Completed {
                    hours += item.fields.estimated_hours.unwrap_or(0.0);
                    points += item.fields.story_points.unwrap_or(0);
                }
            }
        }
        Ok((hours, points))
    }

    /// Average `actual_velocity_hours`/`actual_velocity_story_points` over
    /// the `n` most recently completed sprints of `project_id`, ordered by
    /// `end_date` descending.
    pub async fn team_avg_velocity(
        &self,
        project_id: &str,
        n: usize,
    ) -> Result<(f64, f64), SprintError> {
        let mut completed: Vec<Sprint> = self
            .list_sprints(project_id)
            .await?
            .into_iter()
            .filter(|s| s.status == SprintStatus::Completed)
            .collect();
        completed.sort_by_key(|s| std::cmp::Reverse(s.end_date));
        completed.truncate(n);

        if completed.is_empty() {
            return Ok((0.0, 0.0));
        }
        let count = completed.len() as f64;
        let total_hours: f64 = completed.iter().map(|s| s.actual_velocity_hours).sum();
        let total_points: f64 = completed
            .iter()
            .map(|s| f64::from(s.actual_velocity_story_points))
            .sum();
        Ok((total_hours / count, total_points / count))
    }

    /// One point per calendar day in `[start_date, end_date]`. The ideal
    /// line decreases linearly from the roster total to zero; the actual
    /// line subtracts work completed on or before each day (by the
    /// completed task's `updated_at` date). Both are monotone
    /// non-increasing by construction.
    pub async fn burndown(&self, sprint_id: Uuid) -> Result<Vec<BurndownPoint>, SprintError> {
        let sprint = self.get_sprint(sprint_id).await?;
        let roster = self.roster_row(sprint_id).await?;

        let mut items = Vec::with_capacity(roster.value.work_item_ids.len());
        for id in &roster.value.work_item_ids {
            if let Some(item) = self.store.get(*id).await? {
                items.push(item);
            }
        }

        let total_hours: f64 = items.iter().map(|i| i.fields.estimated_hours.unwrap_or(0.0)).sum();
        let total_points: f64 = items
            .iter()
            .map(|i| f64::from(i.fields.story_points.unwrap_or(0)))
            .sum();

        let span_days = (sprint.end_date - sprint.start_date).num_days().max(0) as f64;
        let mut points_out = Vec::new();
        let mut day = sprint.start_date;
        while day <= sprint.end_date {
            let elapsed = (day - sprint.start_date).num_days() as f64;
            let fraction_remaining = if span_days > 0.0 {
                (1.0 - elapsed / span_days).clamp(0.0, 1.0)
            } else {
                0.0
            };

            let completed_hours: f64 = items
                .iter()
                .filter(|i| i.status == WorkItemStatus::Completed && i.updated_at.date_naive() <= day)
                .map(|i| i.fields.estimated_hours.unwrap_or(0.0))
                .sum();
            let completed_points: f64 = items
                .iter()
                .filter(|i| i.status == WorkItemStatus::Completed && i.updated_at.date_naive() <= day)
                .map(|i| f64::from(i.fields.story_points.unwrap_or(0)))
                .sum();

            points_out.push(BurndownPoint {
                date: day,
                ideal_remaining_hours: total_hours * fraction_remaining,
                actual_remaining_hours: (total_hours - completed_hours).max(0.0),
                ideal_remaining_points: total_points * fraction_remaining,
                actual_remaining_points: (total_points - completed_points).max(0.0),
            });

            day = day
                .succ_opt()
                .expect("sprint end_date is a finite date reachable by successive days");
        }

        Ok(points_out)
    }
}

fn props<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use almwork_domain::{CreateWorkItem, WorkItemFields, WorkItemType};
    use almwork_graph::InMemoryGraph;
    use async_trait::async_trait;

    struct NoopAudit;

    #[async_trait]
    impl AuditSink for NoopAudit {
        async fn record(&self, _event: AuditEvent) {}
    }

    struct NoopSignatures;

    #[async_trait]
    impl almwork_domain::SignatureInvalidation for NoopSignatures {
        async fn invalidate_all(
            &self,
            _workitem_id: Uuid,
            _reason: String,
        ) -> anyhow::Result<Vec<almwork_domain::Signature>> {
            Ok(Vec::new())
        }

        async fn has_valid_signature(&self, _workitem_id: Uuid) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    fn harness() -> (SprintCoordinator, Arc<WorkItemStore>) {
        let graph: Arc<dyn GraphExecutor> = Arc::new(InMemoryGraph::new());
        let store = Arc::new(WorkItemStore::new(
            graph.clone(),
            Arc::new(NoopAudit),
            Arc::new(NoopSignatures),
        ));
        let coordinator = SprintCoordinator::new(graph, store.clone(), Arc::new(NoopAudit));
        (coordinator, store)
    }

    async fn make_task(
        store: &WorkItemStore,
        title: &str,
        status: almwork_domain::WorkItemStatus,
        estimated_hours: f64,
        story_points: u32,
    ) -> Uuid {
        let item = store
            .create(
                CreateWorkItem {
                    work_item_type: WorkItemType::Task,
                    title: title.to_string(),
                    description: None,
                    status: Some(status),
                    priority: None,
                    assigned_to: None,
                    fields: WorkItemFields {
                        estimated_hours: Some(estimated_hours),
                        story_points: Some(story_points),
                        ..Default::default()
                    },
                },
                "tester",
            )
            .await
            .unwrap();
        item.id
    }

    fn new_sprint(project_id: &str) -> CreateSprint {
        CreateSprint {
            project_id: project_id.to_string(),
            name: "Sprint 1".to_string(),
            goal: None,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 9).unwrap(),
            capacity_hours: None,
            capacity_story_points: None,
        }
    }

    #[tokio::test]
    async fn create_sprint_starts_in_planning() {
        let (coordinator, _store) = harness();
        let sprint = coordinator
            .create_sprint(new_sprint("proj-1"), "tester")
            .await
            .unwrap();
        assert_eq!(sprint.status, SprintStatus::Planning);
    }

    #[tokio::test]
    async fn only_one_active_sprint_per_project() {
        let (coordinator, _store) = harness();
        let first = coordinator
            .create_sprint(new_sprint("proj-1"), "tester")
            .await
            .unwrap();
        let second = coordinator
            .create_sprint(new_sprint("proj-1"), "tester")
            .await
            .unwrap();

        coordinator.start_sprint(first.id, "tester").await.unwrap();
        let err = coordinator
            .start_sprint(second.id, "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, SprintError::ActiveSprintExists(p) if p == "proj-1"));
    }

    #[tokio::test]
    async fn capacity_admission_rejects_overflow() {
        let (coordinator, store) = harness();
        let mut input = new_sprint("proj-2");
        input.capacity_hours = Some(10.0);
        let sprint = coordinator.create_sprint(input, "tester").await.unwrap();

        let task_a = make_task(&store, "first task of the sprint", WorkItemStatus::Ready, 6.0, 3).await;
        let task_b = make_task(&store, "second task of the sprint", WorkItemStatus::Ready, 5.0, 2).await;

        coordinator
            .assign_to_sprint(sprint.id, task_a, "tester")
            .await
            .unwrap();
        let err = coordinator
            .assign_to_sprint(sprint.id, task_b, "tester")
            .await
            .unwrap_err();
        assert!(matches!(err, SprintError::CapacityExceeded(id, sid) if id == task_b && sid == sprint.id));
    }

    #[tokio::test]
    async fn complete_sprint_computes_velocity_and_requeues_ready_tasks() {
        let (coordinator, store) = harness();
        let sprint = coordinator
            .create_sprint(new_sprint("proj-3"), "tester")
            .await
            .unwrap();
        coordinator.start_sprint(sprint.id, "tester").await.unwrap();

        let done = make_task(&store, "completed task in the sprint", WorkItemStatus::Completed, 8.0, 5).await;
        let leftover = make_task(&store, "leftover ready task in sprint", WorkItemStatus::Ready, 3.0, 1).await;

        coordinator.assign_to_sprint(sprint.id, done, "tester").await.unwrap();
        coordinator
            .assign_to_sprint(sprint.id, leftover, "tester")
            .await
            .unwrap();

        let completed = coordinator.complete_sprint(sprint.id, "tester").await.unwrap();
        assert_eq!(completed.status, SprintStatus::Completed);
        assert_eq!(completed.actual_velocity_hours, 8.0);
        assert_eq!(completed.actual_velocity_story_points, 5);

        let backlog = coordinator.get_backlog("proj-3").await.unwrap();
        assert_eq!(backlog.work_item_ids, vec![leftover]);
    }

    #[tokio::test]
    async fn burndown_is_monotone_non_increasing() {
        let (coordinator, store) = harness();
        let sprint = coordinator
            .create_sprint(new_sprint("proj-4"), "tester")
            .await
            .unwrap();
        let task = make_task(&store, "a task tracked on the burndown", WorkItemStatus::Ready, 10.0, 4).await;
        coordinator
            .assign_to_sprint(sprint.id, task, "tester")
            .await
            .unwrap();

        let points = coordinator.burndown(sprint.id).await.unwrap();
        assert_eq!(points.len(), 5);
        for pair in points.windows(2) {
            assert!(pair[1].ideal_remaining_hours <= pair[0].ideal_remaining_hours);
            assert!(pair[1].actual_remaining_hours <= pair[0].actual_remaining_hours);
        }
        assert_eq!(points.first().unwrap().ideal_remaining_hours, 10.0);
        assert!(points.last().unwrap().ideal_remaining_hours.abs() < 1e-9);
    }
}
