use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A digital signature binding a user's key pair to the canonical content
/// hash of one immutable work-item snapshot.
///
/// `is_valid` is flipped to `false` in place when the snapshot it covers is
/// superseded; the row itself is never deleted, preserving the audit trail
/// (invariant: a signature always names the version it was taken against,
/// even after invalidation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub id: Uuid,
    pub workitem_id: Uuid,
    pub workitem_version: String,
    pub user_id: String,
    /// Lowercase hex-encoded SHA-256 of the JCS-canonicalized snapshot.
    pub content_hash: String,
    /// Lowercase hex-encoded RSA-PSS signature over `content_hash`.
    pub signature_hash: String,
    pub signed_at: DateTime<Utc>,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalidation_reason: Option<String>,
}

impl Signature {
    #[must_use]
    pub fn invalidate(mut self, at: DateTime<Utc>, reason: impl Into<String>) -> Self {
        self.is_valid = false;
        self.invalidated_at = Some(at);
        self.invalidation_reason = Some(reason.into());
        self
    }
}

/// Seam between the store (C3) and the signature service (C4): the store
/// calls this on every mutation without depending on the signature
/// service's crate, breaking what would otherwise be a dependency cycle
/// (C4 reads snapshots through the store's graph access, C3 invalidates
/// through this trait).
#[async_trait]
pub trait SignatureInvalidation: Send + Sync {
    /// Transitions every currently-valid signature on `workitem_id` to
    /// invalid, returning the ones that were flipped. Idempotent: calling
    /// this with none currently valid returns an empty list.
    async fn invalidate_all(
        &self,
        workitem_id: Uuid,
        reason: String,
    ) -> anyhow::Result<Vec<Signature>>;

    /// Cheap existence check: does any currently-valid signature cover
    /// `workitem_id`?
    async fn has_valid_signature(&self, workitem_id: Uuid) -> anyhow::Result<bool>;
}
