use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The type of artifact a work-item snapshot represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemType {
    Requirement,
    Task,
    TestSpec,
    TestRun,
    Risk,
    Document,
}

impl WorkItemType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requirement => "requirement",
            Self::Task => "task",
            Self::TestSpec => "test_spec",
            Self::TestRun => "test_run",
            Self::Risk => "risk",
            Self::Document => "document",
        }
    }
}

/// Lifecycle status of a work-item snapshot.
///
/// The base set (`draft`/`active`/`completed`/`archived`/`rejected`) applies to
/// every type; `ready`/`in_progress`/`blocked` are additionally valid for
/// `task` snapshots, consumed by the sprint coordinator and scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemStatus {
    Draft,
    Active,
    Completed,
    Archived,
    Rejected,
    Ready,
    InProgress,
    Blocked,
}

impl WorkItemStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
            Self::Rejected => "rejected",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Blocked => "blocked",
        }
    }

    /// Parses a status name, accepting the aliases the email reply grammar
    /// recognizes (`done`/`finished`/`complete` -> `completed`,
    /// `working`/`started`/`ongoing` -> `active`). Returns `None` for
    /// anything else rather than erroring, matching the structured-reply
    /// parser's "drop unknown statuses" behavior.
    #[must_use]
    pub fn parse_with_aliases(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "active" => Some(Self::Active),
            "completed" | "done" | "finished" | "complete" => Some(Self::Completed),
            "archived" => Some(Self::Archived),
            "in_progress" | "started" | "working" | "ongoing" => Some(Self::InProgress),
            "ready" => Some(Self::Ready),
            "blocked" => Some(Self::Blocked),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A `MAJOR.MINOR` version marker along a work-item's `NEXT_VERSION` chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const INITIAL: Self = Self { major: 1, minor: 0 };

    /// Parses a `"MAJOR.MINOR"` string. Invalid formats (missing dot,
    /// non-numeric parts, legacy single-number values) degrade per
    /// spec: a completely unparsable string resets to `1.0`; a bare
    /// integer (legacy data) degrades to the next() of `1.0`, i.e. `1.1`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((major, minor)) => match (major.parse(), minor.parse()) {
                (Ok(major), Ok(minor)) => Self { major, minor },
                _ => Self::INITIAL,
            },
            None => {
                if raw.parse::<u32>().is_ok() {
                    Self::INITIAL.next()
                } else {
                    Self::INITIAL
                }
            }
        }
    }

    #[must_use]
    pub const fn next(self) -> Self {
        Self {
            major: self.major,
            minor: self.minor + 1,
        }
    }

    #[must_use]
    pub fn to_version_string(self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Type-specific fields folded onto the base work-item snapshot.
///
/// Kept as a flat, mostly-optional bag rather than an enum-per-type because
/// the store treats updates as a sparse merge over whatever fields are
/// present on the current snapshot, independent of `work_item_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkItemFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub story_points: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_needed: Option<Vec<String>>,
    /// FMEA severity rating, 1..=10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<u8>,
    /// FMEA occurrence rating, 1..=10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence: Option<u8>,
    /// FMEA detection rating, 1..=10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<u8>,
    /// Risk Priority Number, derived as `severity * occurrence * detection`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Catch-all for additional type-specific properties not yet promoted
    /// to a named field (kept sorted so snapshots hash deterministically).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// An immutable snapshot of a work-item at a given version.
///
/// Two fetches of the same `(id, version)` are byte-identical field-by-field
/// (invariant 6); the store never mutates a persisted snapshot in place —
/// every change produces a new one linked by `NEXT_VERSION`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: Uuid,
    pub work_item_type: WorkItemType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: WorkItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub version: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    #[serde(flatten)]
    pub fields: WorkItemFields,
}

impl WorkItem {
    #[must_use]
    pub fn parsed_version(&self) -> Version {
        Version::parse(&self.version)
    }

    /// `severity * occurrence * detection`, recomputed whenever all three
    /// FMEA ratings are present; `None` if any is missing.
    #[must_use]
    pub fn risk_priority_number(&self) -> Option<u32> {
        let (s, o, d) = (
            self.fields.severity?,
            self.fields.occurrence?,
            self.fields.detection?,
        );
        Some(u32::from(s) * u32::from(o) * u32::from(d))
    }
}

/// Payload for creating a work-item. `id`/`version`/timestamps are assigned
/// by the store, never supplied by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkItem {
    pub work_item_type: WorkItemType,
    pub title: String,
    pub description: Option<String>,
    pub status: Option<WorkItemStatus>,
    pub priority: Option<u8>,
    pub assigned_to: Option<String>,
    pub fields: WorkItemFields,
}

/// A sparse update: only fields present here are merged over the current
/// snapshot. `change_description` is mandatory for audit compliance.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkItemStatus>,
    pub priority: Option<u8>,
    pub assigned_to: Option<String>,
    pub change_description: String,
    #[serde(default)]
    pub fields: PartialFields,
}

/// Sparse overlay for [`WorkItemFields`] — every member is an `Option`
/// regardless of the target field's own optionality, so "not present in
/// this update" is distinguishable from "explicitly cleared".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialFields {
    pub acceptance_criteria: Option<Vec<String>>,
    pub estimated_hours: Option<f64>,
    pub story_points: Option<u32>,
    pub skills_needed: Option<Vec<String>>,
    pub severity: Option<u8>,
    pub occurrence: Option<u8>,
    pub detection: Option<u8>,
    pub source: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl PartialFields {
    /// Merges this overlay onto `base`, recomputing `rpn` if any FMEA rating
    /// changed.
    pub fn merge_onto(&self, base: &mut WorkItemFields) {
        if let Some(v) = &self.acceptance_criteria {
            base.acceptance_criteria = Some(v.clone());
        }
        if let Some(v) = self.estimated_hours {
            base.estimated_hours = Some(v);
        }
        if let Some(v) = self.story_points {
            base.story_points = Some(v);
        }
        if let Some(v) = &self.skills_needed {
            base.skills_needed = Some(v.clone());
        }
        if let Some(v) = self.severity {
            base.severity = Some(v);
        }
        if let Some(v) = self.occurrence {
            base.occurrence = Some(v);
        }
        if let Some(v) = self.detection {
            base.detection = Some(v);
        }
        if let Some(v) = &self.source {
            base.source = Some(v.clone());
        }
        for (k, v) in &self.extra {
            base.extra.insert(k.clone(), v.clone());
        }
        if let (Some(s), Some(o), Some(d)) = (base.severity, base.occurrence, base.detection) {
            base.rpn = Some(u32::from(s) * u32::from(o) * u32::from(d));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parses_standard_form() {
        assert_eq!(Version::parse("3.7"), Version { major: 3, minor: 7 });
    }

    #[test]
    fn version_resets_on_garbage() {
        assert_eq!(Version::parse("not-a-version"), Version::INITIAL);
    }

    #[test]
    fn version_degrades_legacy_integer() {
        assert_eq!(Version::parse("5"), Version { major: 1, minor: 1 });
    }

    #[test]
    fn version_next_increments_minor_only() {
        let v = Version { major: 2, minor: 4 };
        assert_eq!(v.next(), Version { major: 2, minor: 5 });
    }

    #[test]
    fn status_alias_table_matches_spec() {
        assert_eq!(
            WorkItemStatus::parse_with_aliases("done"),
            Some(WorkItemStatus::Completed)
        );
        assert_eq!(
            WorkItemStatus::parse_with_aliases("Working"),
            Some(WorkItemStatus::InProgress)
        );
        assert_eq!(WorkItemStatus::parse_with_aliases("on_hold"), None);
    }

    #[test]
    fn rpn_requires_all_three_ratings() {
        let mut fields = WorkItemFields {
            severity: Some(8),
            occurrence: Some(3),
            ..Default::default()
        };
        PartialFields::default().merge_onto(&mut fields);
        assert!(fields.rpn.is_none());
        fields.detection = Some(2);
        let overlay = PartialFields {
            detection: Some(2),
            ..Default::default()
        };
        overlay.merge_onto(&mut fields);
        assert_eq!(fields.rpn, Some(48));
    }
}
