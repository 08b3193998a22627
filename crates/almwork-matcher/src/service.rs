use std::collections::HashMap;
use std::sync::Arc;

use almwork_domain::{AuditEvent, AuditSink, Milestone, MilestoneStatus, Resource};
use almwork_graph::{GraphExecutor, GraphQuery, PropertyFilter};
use almwork_store::{locks::IdLocks, WorkItemStore};
use chrono::{NaiveDate, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::allocation::{AllocationKind, AllocationRoster};
use crate::codec::{self, KeyedRow, ALLOCATION_ROSTER_LABEL, MILESTONE_LABEL};
use crate::cycle;
use crate::error::{MatcherError, Result};
use crate::skill_match::{self, SkillMatch};

/// Input to [`MatcherService::create_milestone`]. `id`/timestamps/`status`
/// are assigned by the service.
#[derive(Debug, Clone)]
pub struct CreateMilestone {
    pub project_id: String,
    pub name: String,
    pub target_date: NaiveDate,
}

/// Resource/milestone/skill matcher (C8): milestone CRUD and dependency
/// graph (cycle-checked both directions before admitting an edge), resource
/// allocation bookkeeping (project-xor-task, at most one lead), and
/// skill-match scoring/ranking for a task against a candidate resource
/// pool.
///
/// Resources are supplied by the caller at query time rather than owned by
/// this service — same division of responsibility `almwork-scheduler`
/// draws for its own `SchedulerResource` inputs, since no dedicated
/// resource store exists in this workspace.
pub struct MatcherService {
    graph: Arc<dyn GraphExecutor>,
    store: Arc<WorkItemStore>,
    audit: Arc<dyn AuditSink>,
    resource_locks: IdLocks,
}

impl MatcherService {
    #[must_use]
    pub fn new(graph: Arc<dyn GraphExecutor>, store: Arc<WorkItemStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            graph,
            store,
            audit,
            resource_locks: IdLocks::new(),
        }
    }

    async fn milestone_node(&self, id: Uuid) -> Result<Option<Milestone>> {
        match self.graph.get_node(id).await? {
            Some(node) => Ok(Some(codec::milestone_from_props(node.props)?)),
            None => Ok(None),
        }
    }

    pub async fn get_milestone(&self, id: Uuid) -> Result<Milestone> {
        self.milestone_node(id).await?.ok_or(MatcherError::NotFound(id))
    }

    pub async fn list_milestones(&self, project_id: &str) -> Result<Vec<Milestone>> {
        let query = GraphQuery::start_by_label(MILESTONE_LABEL)
            .filter(PropertyFilter::eq("project_id", project_id));
        let rows = self.graph.execute_query(&query).await?;
        rows.into_iter().map(codec::milestone_from_props).collect()
    }

    pub async fn create_milestone(&self, input: CreateMilestone, caller: &str) -> Result<Milestone> {
        let now = Utc::now();
        let milestone = Milestone {
            id: Uuid::new_v4(),
            project_id: input.project_id,
            name: input.name,
            target_date: input.target_date,
            status: MilestoneStatus::Upcoming,
            tied_work_items: Vec::new(),
            depends_on: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.graph
            .create_node(MILESTONE_LABEL, codec::milestone_to_props(&milestone)?)
            .await?;
        self.audit
            .record(AuditEvent::new(
                "Milestone",
                milestone.id,
                "create_milestone",
                caller,
                now,
            ))
            .await;
        Ok(milestone)
    }

    /// Ties a work item to a milestone. Idempotent.
    pub async fn tie_work_item(&self, milestone_id: Uuid, work_item_id: Uuid, caller: &str) -> Result<Milestone> {
        self.store
            .get(work_item_id)
            .await?
            .ok_or(MatcherError::WorkItemNotFound(work_item_id))?;
        let mut milestone = self.get_milestone(milestone_id).await?;
        if !milestone.tied_work_items.contains(&work_item_id) {
            milestone.tied_work_items.push(work_item_id);
            milestone.updated_at = Utc::now();
            self.graph
                .update_node(milestone_id, codec::milestone_to_props(&milestone)?)
                .await?;
            self.audit
                .record(
                    AuditEvent::new("Milestone", milestone_id, "tie_work_item", caller, milestone.updated_at)
                        .with_detail(json!({ "work_item_id": work_item_id })),
                )
                .await;
        }
        Ok(milestone)
    }

    fn adjacency(milestones: &[Milestone]) -> HashMap<Uuid, Vec<Uuid>> {
        milestones
            .iter()
            .map(|m| (m.id, m.depends_on.clone()))
            .collect()
    }

    /// Records that `dependent_id` must complete after `dependency_id`
    /// (a `BEFORE` edge: `dependency_id` comes before `dependent_id`).
    /// Rejected if it would close a cycle in either direction through the
    /// project's existing `depends_on` chains.
    pub async fn add_dependency(
        &self,
        dependent_id: Uuid,
        dependency_id: Uuid,
        caller: &str,
    ) -> Result<Milestone> {
        if dependent_id == dependency_id {
            return Err(MatcherError::CycleWouldForm);
        }
        let mut dependent = self.get_milestone(dependent_id).await?;
        let dependency = self.get_milestone(dependency_id).await?;

        let siblings = self.list_milestones(&dependent.project_id).await?;
        let edges = Self::adjacency(&siblings);
        if cycle::would_create_cycle_either_direction(&edges, dependent_id, dependency_id) {
            return Err(MatcherError::CycleWouldForm);
        }

        if !dependent.depends_on.contains(&dependency.id) {
            dependent.depends_on.push(dependency.id);
            dependent.updated_at = Utc::now();
            self.graph
                .update_node(dependent_id, codec::milestone_to_props(&dependent)?)
                .await?;
            self.audit
                .record(
                    AuditEvent::new("Milestone", dependent_id, "add_dependency", caller, dependent.updated_at)
                        .with_detail(json!({ "depends_on": dependency_id })),
                )
                .await;
        }
        Ok(dependent)
    }

    async fn roster_row(&self, resource_id: Uuid) -> Result<Option<KeyedRow<AllocationRoster>>> {
        let query = GraphQuery::start_by_label(ALLOCATION_ROSTER_LABEL)
            .filter(PropertyFilter::eq("resource_id", resource_id.to_string()))
            .limit(1);
        let mut rows = self.graph.execute_query(&query).await?;
        rows.pop().map(codec::roster_from_row).transpose()
    }

    async fn get_or_create_roster(&self, resource_id: Uuid) -> Result<KeyedRow<AllocationRoster>> {
        if let Some(row) = self.roster_row(resource_id).await? {
            return Ok(row);
        }
        let roster = AllocationRoster::empty(resource_id);
        let node = self
            .graph
            .create_node(ALLOCATION_ROSTER_LABEL, codec::roster_to_props(&roster)?)
            .await?;
        Ok(KeyedRow {
            node_id: node.id,
            value: roster,
        })
    }

    /// Allocates `resource_id` to `target_ref` (a project id string, or a
    /// task's id string form) of the given kind, rejecting the call if the
    /// resource already carries allocations of the other kind.
    pub async fn allocate_resource(
        &self,
        resource_id: Uuid,
        kind: AllocationKind,
        target_ref: String,
        lead: bool,
        caller: &str,
    ) -> Result<AllocationRoster> {
        let _guard = self.resource_locks.acquire(resource_id).await;
        let mut row = self.get_or_create_roster(resource_id).await?;
        row.value.allocate(kind, target_ref.clone(), lead)?;
        self.graph
            .update_node(row.node_id, codec::roster_to_props(&row.value)?)
            .await?;
        self.audit
            .record(
                AuditEvent::new("Resource", resource_id, "allocate_resource", caller, Utc::now())
                    .with_detail(json!({ "kind": kind, "target_ref": target_ref, "lead": lead })),
            )
            .await;
        Ok(row.value)
    }

    pub async fn deallocate_resource(
        &self,
        resource_id: Uuid,
        kind: AllocationKind,
        target_ref: &str,
        caller: &str,
    ) -> Result<()> {
        let _guard = self.resource_locks.acquire(resource_id).await;
        let Some(mut row) = self.roster_row(resource_id).await? else {
            return Ok(());
        };
        row.value.deallocate(kind, target_ref);
        self.graph
            .update_node(row.node_id, codec::roster_to_props(&row.value)?)
            .await?;
        self.audit
            .record(AuditEvent::new(
                "Resource",
                resource_id,
                "deallocate_resource",
                caller,
                Utc::now(),
            ))
            .await;
        Ok(())
    }

    pub async fn has_lead_allocation(&self, resource_id: Uuid) -> Result<bool> {
        Ok(self
            .roster_row(resource_id)
            .await?
            .is_some_and(|row| row.value.has_lead_allocation()))
    }

    /// Scores and ranks `candidates` against `work_item_id`'s
    /// `skills_needed`. Resources with zero skill overlap are dropped
    /// whenever skills are required.
    pub async fn rank_candidates(
        &self,
        work_item_id: Uuid,
        candidates: &[Resource],
        linked_departments: &[String],
    ) -> Result<Vec<SkillMatch>> {
        let item = self
            .store
            .get(work_item_id)
            .await?
            .ok_or(MatcherError::WorkItemNotFound(work_item_id))?;
        let skills_needed = item.fields.skills_needed.clone().unwrap_or_default();

        let mut matches = Vec::with_capacity(candidates.len());
        for resource in candidates {
            let has_lead = self.has_lead_allocation(resource.id).await?;
            if let Some(m) = skill_match::score_resource(&skills_needed, resource, linked_departments, has_lead) {
                matches.push(m);
            }
        }
        Ok(skill_match::rank(matches))
    }
}
