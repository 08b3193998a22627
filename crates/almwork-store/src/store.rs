use std::sync::Arc;

use almwork_domain::{
    AuditEvent, AuditSink, CreateWorkItem, SignatureInvalidation, UpdateWorkItem, Version,
    WorkItem,
};
use almwork_graph::{GraphExecutor, GraphQuery, PropertyFilter};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::codec::{self, LABEL};
use crate::error::StoreError;
use crate::locks::IdLocks;
use crate::search::{Comparison, FieldChange, SearchFilters};
use crate::validation;

/// A decoded node: its graph-assigned node id plus the domain snapshot.
struct Row {
    node_id: Uuid,
    item: WorkItem,
}

fn decode_row(mut props: serde_json::Map<String, Value>) -> Result<Row, StoreError> {
    let node_id = props
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| StoreError::Validation(vec!["node row missing id".into()]))?;
    let item = codec::from_node_props(std::mem::take(&mut props))?;
    Ok(Row { node_id, item })
}

/// Versioned work-item store: create/read/update/delete/search/compare/restore.
///
/// Every mutating operation holds the per-id lock from [`IdLocks`] for its
/// whole read-modify-write, so concurrent updates to the same item never
/// interleave while updates to distinct items proceed independently.
pub struct WorkItemStore {
    graph: Arc<dyn GraphExecutor>,
    audit: Arc<dyn AuditSink>,
    signatures: Arc<dyn SignatureInvalidation>,
    locks: IdLocks,
}

impl WorkItemStore {
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphExecutor>,
        audit: Arc<dyn AuditSink>,
        signatures: Arc<dyn SignatureInvalidation>,
    ) -> Self {
        Self {
            graph,
            audit,
            signatures,
            locks: IdLocks::new(),
        }
    }

    async fn current_row(&self, id: Uuid) -> Result<Option<Row>, StoreError> {
        let query = GraphQuery::start_by_label(LABEL)
            .filter(PropertyFilter::eq("item_id", id.to_string()))
            .filter(PropertyFilter::eq("is_current", true))
            .limit(1);
        let mut rows = self.graph.execute_query(&query).await?;
        rows.pop().map(decode_row).transpose()
    }

    async fn all_rows(&self, id: Uuid) -> Result<Vec<Row>, StoreError> {
        let query = GraphQuery::start_by_label(LABEL)
            .filter(PropertyFilter::eq("item_id", id.to_string()));
        let rows = self.graph.execute_query(&query).await?;
        rows.into_iter().map(decode_row).collect()
    }

    /// Current version (the snapshot with no outgoing `NEXT_VERSION`).
    pub async fn get(&self, id: Uuid) -> Result<Option<WorkItem>, StoreError> {
        Ok(self.current_row(id).await?.map(|r| r.item))
    }

    pub async fn get_version(&self, id: Uuid, version: &str) -> Result<Option<WorkItem>, StoreError> {
        let rows = self.all_rows(id).await?;
        Ok(rows
            .into_iter()
            .find(|r| r.item.version == version)
            .map(|r| r.item))
    }

    /// All snapshots newest-first, sorted by `(MAJOR, MINOR)` numerically.
    pub async fn history(&self, id: Uuid) -> Result<Vec<WorkItem>, StoreError> {
        let mut rows = self.all_rows(id).await?;
        rows.sort_by_key(|r| std::cmp::Reverse(r.item.parsed_version()));
        Ok(rows.into_iter().map(|r| r.item).collect())
    }

    pub async fn create(
        &self,
        payload: CreateWorkItem,
        caller: &str,
    ) -> Result<WorkItem, StoreError> {
        validation::validate_create(&payload).map_err(StoreError::Validation)?;

        let now = Utc::now();
        let id = Uuid::new_v4();
        let mut fields = payload.fields;
        if let (Some(s), Some(o), Some(d)) = (fields.severity, fields.occurrence, fields.detection)
        {
            fields.rpn = Some(u32::from(s) * u32::from(o) * u32::from(d));
        }

        let item = WorkItem {
            id,
            work_item_type: payload.work_item_type,
            title: validation::normalize_title(&payload.title),
            description: payload.description,
            status: payload
                .status
                .unwrap_or(almwork_domain::WorkItemStatus::Draft),
            priority: payload.priority,
            assigned_to: payload.assigned_to,
            version: Version::INITIAL.to_version_string(),
            created_by: caller.to_string(),
            created_at: now,
            updated_at: now,
            updated_by: None,
            change_description: None,
            fields,
        };

        let _guard = self.locks.acquire(id).await;
        let props = codec::to_node_props(&item, true)?;
        self.graph.create_node(LABEL, props).await?;

        self.audit
            .record(AuditEvent::new("WorkItem", id, "create", caller, now))
            .await;

        Ok(item)
    }

    pub async fn update(
        &self,
        id: Uuid,
        updates: UpdateWorkItem,
        caller: &str,
    ) -> Result<WorkItem, StoreError> {
        validation::validate_update(&updates).map_err(StoreError::Validation)?;

        let _guard = self.locks.acquire(id).await;
        let current = self
            .current_row(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;

        let mut next_item = current.item.clone();
        if let Some(title) = updates.title {
            next_item.title = validation::normalize_title(&title);
        }
        if let Some(description) = updates.description {
            next_item.description = Some(description);
        }
        if let Some(status) = updates.status {
            next_item.status = status;
        }
        if let Some(priority) = updates.priority {
            next_item.priority = Some(priority);
        }
        if let Some(assigned_to) = updates.assigned_to {
            next_item.assigned_to = Some(assigned_to);
        }
        updates.fields.merge_onto(&mut next_item.fields);

        self.persist_next_version(id, &current, next_item, updates.change_description.clone(), caller)
            .await
    }

    /// Shared tail of `update`/`restore`: stamps `version`/`updated_at`/
    /// `updated_by`/`change_description` onto `next_item`, persists it as a
    /// new snapshot linked `current -NEXT_VERSION-> next`, invalidates every
    /// valid signature on `id`, and records the audit event. Callers are
    /// responsible for producing `next_item`'s content (merge for `update`,
    /// full overwrite for `restore`); this only handles the version-chain
    /// bookkeeping common to both.
    async fn persist_next_version(
        &self,
        id: Uuid,
        current: &Row,
        mut next_item: WorkItem,
        change_description: String,
        caller: &str,
    ) -> Result<WorkItem, StoreError> {
        let next_version = current.item.parsed_version().next();
        let now = Utc::now();

        next_item.version = next_version.to_version_string();
        next_item.updated_at = now;
        next_item.updated_by = Some(caller.to_string());
        next_item.change_description = Some(change_description.clone());

        let new_props = codec::to_node_props(&next_item, true)?;
        let new_node = self.graph.create_node(LABEL, new_props).await?;
        self.graph
            .update_node(
                current.node_id,
                [("is_current".to_string(), Value::Bool(false))]
                    .into_iter()
                    .collect(),
            )
            .await?;
        self.graph
            .create_relationship(
                current.node_id,
                new_node.id,
                "NEXT_VERSION",
                None,
            )
            .await?;

        self.signatures
            .invalidate_all(id, "WorkItem modified".to_string())
            .await
            .map_err(StoreError::Signature)?;

        self.audit
            .record(
                AuditEvent::new("WorkItem", id, "update", caller, now)
                    .with_detail(serde_json::json!({ "change_description": change_description })),
            )
            .await;

        Ok(next_item)
    }

    pub async fn delete(&self, id: Uuid, force: bool, caller: &str) -> Result<(), StoreError> {
        let _guard = self.locks.acquire(id).await;
        let rows = self.all_rows(id).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id));
        }

        if !force {
            let signed = self
                .signatures
                .has_valid_signature(id)
                .await
                .map_err(StoreError::Signature)?;
            if signed {
                return Err(StoreError::SignatureExists(id));
            }
        }

        for row in &rows {
            self.graph.delete_node(row.node_id).await?;
        }

        self.audit
            .record(AuditEvent::new("WorkItem", id, "delete", caller, Utc::now()))
            .await;

        Ok(())
    }

    pub async fn search(&self, filters: SearchFilters) -> Result<Vec<WorkItem>, StoreError> {
        let mut query = GraphQuery::start_by_label(LABEL).filter(PropertyFilter::eq(
            "is_current",
            true,
        ));
        if let Some(t) = filters.work_item_type {
            query = query.filter(PropertyFilter::eq("work_item_type", t.as_str()));
        }
        if let Some(s) = filters.status {
            query = query.filter(PropertyFilter::eq("status", s.as_str()));
        }
        if let Some(p) = filters.priority {
            query = query.filter(PropertyFilter::eq("priority", p));
        }
        if let Some(a) = &filters.assigned_to {
            query = query.filter(PropertyFilter::eq("assigned_to", a.clone()));
        }
        if let Some(c) = &filters.created_by {
            query = query.filter(PropertyFilter::eq("created_by", c.clone()));
        }
        if let Some(src) = &filters.source {
            query = query.filter(PropertyFilter::eq("source", src.clone()));
        }

        let rows = self.graph.execute_query(&query).await?;
        let mut items: Vec<WorkItem> = rows
            .into_iter()
            .map(codec::from_node_props)
            .collect::<Result<_, _>>()?;

        if let Some(text) = &filters.free_text {
            let needle = text.to_lowercase();
            items.retain(|item| {
                let haystacks = [
                    item.title.to_lowercase(),
                    item.description.clone().unwrap_or_default().to_lowercase(),
                    item.fields
                        .acceptance_criteria
                        .clone()
                        .unwrap_or_default()
                        .join(" ")
                        .to_lowercase(),
                ];
                haystacks.iter().any(|h| h.contains(&needle))
            });
        }

        if let Some(has_ac) = filters.has_acceptance_criteria {
            items.retain(|item| {
                let present = item
                    .fields
                    .acceptance_criteria
                    .as_ref()
                    .is_some_and(|v| !v.is_empty());
                present == has_ac
            });
        }

        let paged: Vec<WorkItem> = items
            .into_iter()
            .skip(filters.offset)
            .take(filters.limit.min(crate::search::MAX_LIMIT))
            .collect();
        Ok(paged)
    }

    pub async fn compare(
        &self,
        id: Uuid,
        version_a: &str,
        version_b: &str,
    ) -> Result<Comparison, StoreError> {
        let a = self
            .get_version(id, version_a)
            .await?
            .ok_or_else(|| StoreError::VersionNotFound(id, version_a.to_string()))?;
        let b = self
            .get_version(id, version_b)
            .await?
            .ok_or_else(|| StoreError::VersionNotFound(id, version_b.to_string()))?;

        let value_a = serde_json::to_value(&a).expect("WorkItem always serializes");
        let value_b = serde_json::to_value(&b).expect("WorkItem always serializes");
        let (map_a, map_b) = match (value_a, value_b) {
            (Value::Object(ma), Value::Object(mb)) => (ma, mb),
            _ => unreachable!(),
        };

        let mut comparison = Comparison::default();
        for (key, va) in &map_a {
            match map_b.get(key) {
                Some(vb) if vb == va => comparison.unchanged_fields.push(key.clone()),
                Some(vb) => {
                    comparison.changed_fields.insert(
                        key.clone(),
                        FieldChange {
                            from: va.clone(),
                            to: vb.clone(),
                        },
                    );
                }
                None => comparison.removed_fields.push(key.clone()),
            }
        }
        for key in map_b.keys() {
            if !map_a.contains_key(key) {
                comparison.added_fields.push(key.clone());
            }
        }

        Ok(comparison)
    }

    /// Writes `target_version`'s content as a new version on top of
    /// current. Unlike `update`, this is an **overwrite**, not a sparse
    /// merge: every mutable field (`title`/`description`/`status`/
    /// `priority`/`assigned_to`/`fields`) is replaced with the target
    /// snapshot's value verbatim, including fields the target left `None` —
    /// otherwise a field the current snapshot set but the target never had
    /// would survive the restore, contradicting "restore reproduces the
    /// target snapshot's content".
    pub async fn restore(
        &self,
        id: Uuid,
        target_version: &str,
        user: &str,
    ) -> Result<WorkItem, StoreError> {
        let _guard = self.locks.acquire(id).await;
        let current = self
            .current_row(id)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        let target = self
            .get_version(id, target_version)
            .await?
            .ok_or_else(|| StoreError::VersionNotFound(id, target_version.to_string()))?;

        let mut next_item = current.item.clone();
        next_item.title = target.title.clone();
        next_item.description = target.description.clone();
        next_item.status = target.status;
        next_item.priority = target.priority;
        next_item.assigned_to = target.assigned_to.clone();
        next_item.fields = target.fields.clone();

        let change_description = format!("Restored to version {target_version}");
        self.persist_next_version(id, &current, next_item, change_description, user)
            .await
    }
}
