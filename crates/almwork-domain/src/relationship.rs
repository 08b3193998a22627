use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Edge labels in the work-item graph.
///
/// `NEXT_VERSION` is the only edge type the store itself creates; every
/// other variant is written by a higher-level component (signatures never
/// touch the graph, but sprint/scheduler/matcher do).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    /// `WorkItem(v) -> WorkItem(v+1)`, written once per update, never deleted.
    NextVersion,
    TestedBy,
    HasRun,
    FoundDefect,
    DependsOn,
    Blocks,
    /// Milestone ordering: `Milestone(a) -> Milestone(b)` means `a` due before `b`.
    Before,
    /// Scheduler-internal successor edge distinct from `Before`/`DependsOn`,
    /// used for same-resource sequencing hints.
    Next,
    BelongsTo,
    AssignedToSprint,
    InBacklog,
    AllocatedTo,
    LinkedToDepartment,
}

impl RelationshipType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NextVersion => "NEXT_VERSION",
            Self::TestedBy => "TESTED_BY",
            Self::HasRun => "HAS_RUN",
            Self::FoundDefect => "FOUND_DEFECT",
            Self::DependsOn => "DEPENDS_ON",
            Self::Blocks => "BLOCKS",
            Self::Before => "BEFORE",
            Self::Next => "NEXT",
            Self::BelongsTo => "BELONGS_TO",
            Self::AssignedToSprint => "ASSIGNED_TO_SPRINT",
            Self::InBacklog => "IN_BACKLOG",
            Self::AllocatedTo => "ALLOCATED_TO",
            Self::LinkedToDepartment => "LINKED_TO_DEPARTMENT",
        }
    }
}

/// Properties carried on an `ALLOCATED_TO` edge between a work-item (or
/// milestone) and a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationProps {
    pub allocation_percentage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead: Option<bool>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
