//! Shared entity, relationship, and audit types for the work-item graph.
//!
//! This crate has no I/O of its own: it defines the data model every other
//! component (store, signatures, sprint coordinator, scheduler, matcher,
//! email ingestion) serializes, hashes, and persists through the graph
//! executor abstraction in `almwork-graph`.

pub mod audit;
pub mod email;
pub mod milestone;
pub mod relationship;
pub mod resource;
pub mod signature;
pub mod sprint;
pub mod work_item;

pub use audit::{AuditEvent, AuditSink, TracingAuditSink};
pub use email::{EmailMessage, EmailThread};
pub use milestone::{Milestone, MilestoneStatus};
pub use relationship::{AllocationProps, RelationshipType};
pub use resource::{Availability, Resource, ResourceType};
pub use signature::{Signature, SignatureInvalidation};
pub use sprint::{Backlog, Sprint, SprintStatus};
pub use work_item::{
    CreateWorkItem, PartialFields, UpdateWorkItem, Version, WorkItem, WorkItemFields,
    WorkItemStatus, WorkItemType,
};
