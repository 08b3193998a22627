use std::sync::Arc;

use almwork_domain::{AuditEvent, AuditSink, Signature, SignatureInvalidation};
use almwork_graph::{GraphExecutor, GraphQuery, PropertyFilter};
use almwork_store::WorkItemStore;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::codec::{self, LABEL};
use crate::error::SignatureError;

/// Outcome of a [`SignatureService::verify`] call. Matches the contract's
/// `{is_valid, content_matches, signature_intact, error?}` tuple exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerifyOutcome {
    pub is_valid: bool,
    pub content_matches: bool,
    pub signature_intact: bool,
    pub error: Option<String>,
}

impl VerifyOutcome {
    fn not_found() -> Self {
        Self {
            is_valid: false,
            content_matches: false,
            signature_intact: false,
            error: Some("Signature not found".to_string()),
        }
    }

    fn invalidated(reason: &str) -> Self {
        Self {
            is_valid: false,
            content_matches: false,
            signature_intact: false,
            error: Some(format!("Signature invalidated: {reason}")),
        }
    }
}

/// The digital signature engine (C4): signs, verifies, invalidates, and
/// queries signatures over work-item snapshots held by C3.
///
/// Signature rows persist through the same [`GraphExecutor`] seam C3 uses,
/// under their own `Signature` label — this crate never assumes a separate
/// relational backend is wired up, only that *some* graph executor is.
pub struct SignatureService {
    graph: Arc<dyn GraphExecutor>,
    store: Arc<WorkItemStore>,
    audit: Arc<dyn AuditSink>,
}

impl SignatureService {
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphExecutor>,
        store: Arc<WorkItemStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            graph,
            store,
            audit,
        }
    }

    async fn row(&self, signature_id: Uuid) -> Result<Option<Signature>, SignatureError> {
        match self.graph.get_node(signature_id).await? {
            Some(node) => Ok(Some(codec::from_node_props(node.props)?)),
            None => Ok(None),
        }
    }

    /// Signs the current snapshot of `workitem_id` with `private_key_pem`
    /// on behalf of `user_id`. Steps per the contract: hash the current
    /// canonical snapshot, sign the hash, persist the row as valid, audit.
    pub async fn sign(
        &self,
        workitem_id: Uuid,
        user_id: &str,
        private_key_pem: &str,
        caller: &str,
    ) -> Result<Signature, SignatureError> {
        let snapshot = self
            .store
            .get(workitem_id)
            .await?
            .ok_or(SignatureError::WorkItemNotFound(workitem_id))?;

        let content_hash = almwork_canon::content_hash(&snapshot)?;
        let signature_hash = almwork_canon::sign_content_hash(private_key_pem, &content_hash)?;
        let now = Utc::now();

        let signature = Signature {
            id: Uuid::new_v4(),
            workitem_id,
            workitem_version: snapshot.version.clone(),
            user_id: user_id.to_string(),
            content_hash,
            signature_hash,
            signed_at: now,
            is_valid: true,
            invalidated_at: None,
            invalidation_reason: None,
        };

        let props = codec::to_node_props(&signature)?;
        self.graph.create_node(LABEL, props).await?;

        self.audit
            .record(
                AuditEvent::new("Signature", signature.id, "sign", caller, now).with_detail(
                    serde_json::json!({ "workitem_id": workitem_id, "user_id": user_id }),
                ),
            )
            .await;

        Ok(signature)
    }

    /// Verifies `signature_id` against the *current* snapshot of the
    /// work-item it names, per the contract:
    /// - missing signature ⇒ not found
    /// - already invalidated ⇒ invalid, naming the stored reason
    /// - current content hash differs from the stored hash ⇒
    ///   `content_matches=false`; cryptographic check still runs against the
    ///   stored hash to report `signature_intact`
    /// - otherwise both checks run and `is_valid = content_matches &&
    ///   signature_intact`
    pub async fn verify(
        &self,
        signature_id: Uuid,
        public_key_pem: &str,
    ) -> Result<VerifyOutcome, SignatureError> {
        let Some(signature) = self.row(signature_id).await? else {
            return Ok(VerifyOutcome::not_found());
        };

        if !signature.is_valid {
            let reason = signature
                .invalidation_reason
                .clone()
                .unwrap_or_else(|| "unknown".to_string());
            return Ok(VerifyOutcome::invalidated(&reason));
        }

        // A malformed public key PEM or stored signature hex makes
        // `verify_signature` return `Err`, but verification never raises —
        // treat it the same as a cryptographic mismatch.
        let signature_intact = match almwork_canon::verify_signature(
            public_key_pem,
            &signature.content_hash,
            &signature.signature_hash,
        ) {
            Ok(intact) => intact,
            Err(e) => {
                return Ok(VerifyOutcome {
                    is_valid: false,
                    content_matches: false,
                    signature_intact: false,
                    error: Some(e.to_string()),
                });
            }
        };

        let current = self.store.get(signature.workitem_id).await?;
        let content_matches = match &current {
            Some(snapshot) => almwork_canon::content_hash(snapshot)? == signature.content_hash,
            None => false,
        };

        Ok(VerifyOutcome {
            is_valid: content_matches && signature_intact,
            content_matches,
            signature_intact,
            error: None,
        })
    }

    /// All signatures on `workitem_id`, optionally including invalidated ones.
    pub async fn signatures_for(
        &self,
        workitem_id: Uuid,
        include_invalid: bool,
    ) -> Result<Vec<Signature>, SignatureError> {
        let mut query = GraphQuery::start_by_label(LABEL)
            .filter(PropertyFilter::eq("workitem_id", workitem_id.to_string()));
        if !include_invalid {
            query = query.filter(PropertyFilter::eq("is_valid", true));
        }
        let rows = self.graph.execute_query(&query).await?;
        rows.into_iter().map(codec::from_node_props).collect()
    }

    /// Cheap existence check: does any currently-valid signature cover
    /// `workitem_id`?
    pub async fn is_signed(&self, workitem_id: Uuid) -> Result<bool, SignatureError> {
        Ok(!self.signatures_for(workitem_id, false).await?.is_empty())
    }
}

#[async_trait]
impl SignatureInvalidation for SignatureService {
    async fn invalidate_all(
        &self,
        workitem_id: Uuid,
        reason: String,
    ) -> anyhow::Result<Vec<Signature>> {
        let valid = self.signatures_for(workitem_id, false).await?;
        let now = Utc::now();
        let mut invalidated = Vec::with_capacity(valid.len());

        for signature in valid {
            let updated = signature.clone().invalidate(now, reason.clone());
            let props = codec::to_node_props(&updated)?;
            self.graph.update_node(updated.id, props).await?;
            self.audit
                .record(AuditEvent::new(
                    "Signature",
                    updated.id,
                    "invalidate",
                    "system",
                    now,
                ))
                .await;
            invalidated.push(updated);
        }

        Ok(invalidated)
    }

    async fn has_valid_signature(&self, workitem_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.is_signed(workitem_id).await?)
    }
}
