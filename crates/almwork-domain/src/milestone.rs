use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneStatus {
    Upcoming,
    AtRisk,
    Missed,
    Achieved,
}

impl MilestoneStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::AtRisk => "at_risk",
            Self::Missed => "missed",
            Self::Achieved => "achieved",
        }
    }
}

/// A target date a set of work-items must complete by.
///
/// `depends_on` links milestones to other milestones (a `BEFORE` edge in
/// the graph); `almwork-matcher` walks both `tied_work_items -> milestone`
/// and `milestone -> depends_on -> milestone` directions when checking for
/// cycles, since either can introduce one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: Uuid,
    pub project_id: String,
    pub name: String,
    pub target_date: NaiveDate,
    pub status: MilestoneStatus,
    pub tied_work_items: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
