use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single recorded action against the work-item graph: a create, update,
/// signature, sprint transition, scheduling run, or email ingestion event.
///
/// Fields are deliberately flat and string-typed (`entity_type`/`action`
/// rather than nested enums) so a sink can serialize this directly to a log
/// line or an external audit store without a translation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

impl AuditEvent {
    #[must_use]
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: Uuid,
        action: impl Into<String>,
        actor: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_type: entity_type.into(),
            entity_id,
            action: action.into(),
            actor: actor.into(),
            occurred_at,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Destination for audit events. Components depend on this trait, not a
/// concrete implementation, so the record/export surface named in the
/// Non-goals can be bolted on later without touching call sites — the
/// default `tracing` sink below is the only implementation this crate
/// carries today.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, event: AuditEvent);
}

/// Emits every event as a structured `tracing` record. This is the sink
/// wired up by default; a durable sink is out of scope (see Non-goals).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event: AuditEvent) {
        tracing::info!(
            event_id = %event.id,
            entity_type = %event.entity_type,
            entity_id = %event.entity_id,
            action = %event.action,
            actor = %event.actor,
            "audit event"
        );
    }
}
