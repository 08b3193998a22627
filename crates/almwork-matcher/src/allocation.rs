//! Resource allocation roster: tracks whether a resource is allocated to
//! projects or to individual tasks (never both at once) and which of its
//! allocations, if any, is the lead. Modeled as a dedicated graph row
//! (`almwork_sprint::codec::SprintRoster`'s pattern) rather than
//! `ALLOCATED_TO` edges, because there is no `Project` node in the domain
//! model to be an edge target and `GraphExecutor::execute_query` never
//! surfaces edge properties — only a target node's, so a roster row is the
//! only cheap way to answer "is this resource already committed to the
//! other kind?" and "does it have a lead allocation?".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MatcherError, Result};

/// The two mutually-exclusive categories a resource's allocations fall
/// into. A resource allocated to one or more projects cannot also be
/// allocated to a standalone task, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    Project,
    Task,
}

/// One allocation line. `target_ref` is a `project_id` string when `kind`
/// is [`AllocationKind::Project`], or a work-item id's string form when
/// `kind` is [`AllocationKind::Task`] — kept as a string either way since
/// the two id spaces don't share a type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub target_kind: AllocationKind,
    pub target_ref: String,
    pub lead: bool,
}

/// A resource's full allocation list. All entries share one
/// [`AllocationKind`]; `allocate` rejects anything that would mix kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRoster {
    pub resource_id: Uuid,
    #[serde(default)]
    pub entries: Vec<AllocationEntry>,
    pub updated_at: DateTime<Utc>,
}

impl AllocationRoster {
    #[must_use]
    pub fn empty(resource_id: Uuid) -> Self {
        Self {
            resource_id,
            entries: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn existing_kind(&self) -> Option<AllocationKind> {
        self.entries.first().map(|e| e.target_kind)
    }

    #[must_use]
    pub fn has_lead_allocation(&self) -> bool {
        self.entries.iter().any(|e| e.lead)
    }

    /// Adds an allocation, rejecting it if the roster already carries
    /// entries of the other kind. Idempotent on `(kind, target_ref)`: a
    /// repeat call updates `lead` in place rather than duplicating the
    /// entry.
    pub fn allocate(&mut self, kind: AllocationKind, target_ref: String, lead: bool) -> Result<()> {
        if let Some(existing) = self.existing_kind() {
            if existing != kind {
                return Err(MatcherError::AllocationKindConflict(
                    self.resource_id,
                    existing,
                ));
            }
        }
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.target_kind == kind && e.target_ref == target_ref)
        {
            entry.lead = lead;
        } else {
            self.entries.push(AllocationEntry {
                target_kind: kind,
                target_ref,
                lead,
            });
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Removes the entry for `(kind, target_ref)`, if present.
    pub fn deallocate(&mut self, kind: AllocationKind, target_ref: &str) {
        let before = self.entries.len();
        self.entries
            .retain(|e| !(e.target_kind == kind && e.target_ref == target_ref));
        if self.entries.len() != before {
            self.updated_at = Utc::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocating_mixed_kinds_is_rejected() {
        let resource_id = Uuid::new_v4();
        let mut roster = AllocationRoster::empty(resource_id);
        roster
            .allocate(AllocationKind::Project, "proj-1".to_string(), true)
            .unwrap();
        let err = roster
            .allocate(AllocationKind::Task, Uuid::new_v4().to_string(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            MatcherError::AllocationKindConflict(id, AllocationKind::Project) if id == resource_id
        ));
    }

    #[test]
    fn repeat_allocate_updates_lead_in_place() {
        let mut roster = AllocationRoster::empty(Uuid::new_v4());
        roster
            .allocate(AllocationKind::Project, "proj-1".to_string(), false)
            .unwrap();
        roster
            .allocate(AllocationKind::Project, "proj-1".to_string(), true)
            .unwrap();
        assert_eq!(roster.entries.len(), 1);
        assert!(roster.has_lead_allocation());
    }

    #[test]
    fn deallocate_allows_switching_kind() {
        let mut roster = AllocationRoster::empty(Uuid::new_v4());
        roster
            .allocate(AllocationKind::Project, "proj-1".to_string(), true)
            .unwrap();
        roster.deallocate(AllocationKind::Project, "proj-1");
        assert!(roster.existing_kind().is_none());
        roster
            .allocate(AllocationKind::Task, Uuid::new_v4().to_string(), false)
            .unwrap();
    }
}
