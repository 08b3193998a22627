use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a sprint. Transitions are enforced by `almwork-sprint`, not
/// here: `planning -> active -> completed` and `planning -> cancelled` are
/// the only legal edges, and at most one sprint per project may be `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprintStatus {
    Planning,
    Active,
    Completed,
    Cancelled,
}

impl SprintStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Planning, Self::Active)
                | (Self::Active, Self::Completed)
                | (Self::Planning, Self::Cancelled)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprint {
    pub id: Uuid,
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SprintStatus,
    /// Ceiling on summed `estimated_hours` across assigned tasks; `None`
    /// means capacity admission is not enforced on hours for this sprint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_hours: Option<f64>,
    /// Ceiling on summed `story_points` across assigned tasks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_story_points: Option<u32>,
    /// Written back by `complete()`: summed `estimated_hours` over tasks
    /// `ASSIGNED_TO_SPRINT` with `status=completed`. Zero until completion.
    pub actual_velocity_hours: f64,
    /// Written back by `complete()`: summed `story_points` over the same set.
    pub actual_velocity_story_points: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The unordered pool of work-items for a project that have not yet been
/// pulled into a sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlog {
    pub project_id: String,
    pub work_item_ids: Vec<Uuid>,
    pub updated_at: DateTime<Utc>,
}
