//! Pure skill-match scoring: given a task's needed skills and a resource's
//! skills, department affiliation, and lead-allocation flag, computes a
//! score and deterministic tie-break ordering.

use std::cmp::Ordering;
use std::collections::HashSet;

use almwork_domain::Resource;
use serde::Serialize;
use uuid::Uuid;

const DEPARTMENT_BOOST: f64 = 0.10;
const LEAD_BOOST: f64 = 0.05;

/// One resource's scored candidacy for a task's skill requirements.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillMatch {
    pub resource_id: Uuid,
    pub overlap_count: usize,
    pub score: f64,
    pub lead: bool,
}

/// Scores a single resource against `skills_needed`. Returns `None` when
/// skills are required and the resource shares none of them — resources
/// with zero overlap are excluded whenever the needed set is non-empty.
/// When `skills_needed` is empty every resource is returned with
/// `score = 0.0` before boosts, still lead-first after ranking.
#[must_use]
pub fn score_resource(
    skills_needed: &[String],
    resource: &Resource,
    linked_departments: &[String],
    has_lead_allocation: bool,
) -> Option<SkillMatch> {
    let needed: HashSet<&str> = skills_needed.iter().map(String::as_str).collect();
    let have: HashSet<&str> = resource.skills.iter().map(String::as_str).collect();
    let overlap_count = needed.intersection(&have).count();

    if !needed.is_empty() && overlap_count == 0 {
        return None;
    }

    let mut score = if needed.is_empty() {
        0.0
    } else {
        overlap_count as f64 / needed.len() as f64
    };

    if let Some(department) = &resource.department {
        if linked_departments.iter().any(|d| d == department) {
            score += DEPARTMENT_BOOST;
        }
    }
    if has_lead_allocation {
        score += LEAD_BOOST;
    }

    Some(SkillMatch {
        resource_id: resource.id,
        overlap_count,
        score,
        lead: has_lead_allocation,
    })
}

/// Sorts matches `lead` desc, then `score` desc, then `overlap_count` desc,
/// then `resource_id` asc as a deterministic final tie-break.
pub fn rank(mut matches: Vec<SkillMatch>) -> Vec<SkillMatch> {
    matches.sort_by(|a, b| {
        b.lead
            .cmp(&a.lead)
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
            .then_with(|| b.overlap_count.cmp(&a.overlap_count))
            .then_with(|| a.resource_id.cmp(&b.resource_id))
    });
    matches
}
