//! Resource/milestone/skill matcher (C8): milestone dependency graph with
//! direction-aware cycle checks, project-xor-task resource allocation, and
//! skill-match scoring/ranking against a task's `skills_needed`.
//!
//! Built on `almwork-graph`'s [`almwork_graph::GraphExecutor`] (C2) for its
//! `Milestone`/`AllocationRoster` rows and `almwork-store`'s
//! [`almwork_store::WorkItemStore`] (C3) for task lookups.

pub mod allocation;
pub mod codec;
pub mod cycle;
pub mod error;
pub mod service;
pub mod skill_match;

pub use allocation::{AllocationEntry, AllocationKind, AllocationRoster};
pub use error::MatcherError;
pub use service::{CreateMilestone, MatcherService};
pub use skill_match::SkillMatch;
