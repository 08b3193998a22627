use almwork_domain::{WorkItemStatus, WorkItemType};
use std::collections::BTreeMap;

/// Filters applied by [`crate::WorkItemStore::search`]. Every field is
/// optional; an empty `SearchFilters` matches every current snapshot up to
/// `limit`.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    /// Case-insensitive substring match over title, description, and
    /// acceptance criteria.
    pub free_text: Option<String>,
    pub work_item_type: Option<WorkItemType>,
    pub status: Option<WorkItemStatus>,
    pub priority: Option<u8>,
    pub assigned_to: Option<String>,
    pub created_by: Option<String>,
    pub source: Option<String>,
    pub has_acceptance_criteria: Option<bool>,
    pub limit: usize,
    pub offset: usize,
}

pub const MAX_LIMIT: usize = 1000;

impl SearchFilters {
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: 100,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.min(MAX_LIMIT);
        self
    }
}

/// A single changed field between two versions of the same work item.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

/// Result of comparing two snapshots of the same logical work item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub changed_fields: BTreeMap<String, FieldChange>,
    pub unchanged_fields: Vec<String>,
    pub added_fields: Vec<String>,
    pub removed_fields: Vec<String>,
}
