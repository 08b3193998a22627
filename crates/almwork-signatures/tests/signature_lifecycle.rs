use std::sync::Arc;

use almwork_domain::{AuditSink, CreateWorkItem, TracingAuditSink, UpdateWorkItem, WorkItemType};
use almwork_graph::InMemoryGraph;
use almwork_signatures::SignatureService;
use almwork_store::WorkItemStore;

fn new_service() -> (Arc<WorkItemStore>, SignatureService) {
    let graph = Arc::new(InMemoryGraph::new());
    let signature_graph = Arc::clone(&graph);
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);

    // The store needs a `SignatureInvalidation` handle before the service
    // exists, so wire it up in two stages: build the service against the
    // same graph/audit, then hand its `Arc` to the store.
    let store_graph = Arc::clone(&graph) as Arc<dyn almwork_graph::GraphExecutor>;
    let bootstrap_store = Arc::new(WorkItemStore::new(
        Arc::clone(&store_graph),
        Arc::clone(&audit),
        Arc::new(NullInvalidation),
    ));
    let service = SignatureService::new(
        signature_graph as Arc<dyn almwork_graph::GraphExecutor>,
        Arc::clone(&bootstrap_store),
        Arc::clone(&audit),
    );
    (bootstrap_store, service)
}

struct NullInvalidation;

#[async_trait::async_trait]
impl almwork_domain::SignatureInvalidation for NullInvalidation {
    async fn invalidate_all(
        &self,
        _workitem_id: uuid::Uuid,
        _reason: String,
    ) -> anyhow::Result<Vec<almwork_domain::Signature>> {
        Ok(Vec::new())
    }

    async fn has_valid_signature(&self, _workitem_id: uuid::Uuid) -> anyhow::Result<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn sign_then_verify_against_unchanged_snapshot_is_valid() {
    let (store, service) = new_service();
    let (private_pem, public_pem) = almwork_canon::generate_keypair().unwrap();

    let item = store
        .create(
            CreateWorkItem {
                work_item_type: WorkItemType::Requirement,
                title: "Auth".to_string(),
                description: None,
                status: None,
                priority: None,
                assigned_to: None,
                fields: Default::default(),
            },
            "alice",
        )
        .await
        .unwrap();

    let signature = service
        .sign(item.id, "alice", &private_pem, "alice")
        .await
        .unwrap();
    assert!(signature.is_valid);

    let outcome = service.verify(signature.id, &public_pem).await.unwrap();
    assert!(outcome.is_valid);
    assert!(outcome.content_matches);
    assert!(outcome.signature_intact);
    assert!(outcome.error.is_none());
}

#[tokio::test]
async fn verify_with_wrong_public_key_fails_intact_check() {
    let (store, service) = new_service();
    let (private_pem, _) = almwork_canon::generate_keypair().unwrap();
    let (_, other_public_pem) = almwork_canon::generate_keypair().unwrap();

    let item = store
        .create(
            CreateWorkItem {
                work_item_type: WorkItemType::Requirement,
                title: "Auth".to_string(),
                description: None,
                status: None,
                priority: None,
                assigned_to: None,
                fields: Default::default(),
            },
            "alice",
        )
        .await
        .unwrap();

    let signature = service
        .sign(item.id, "alice", &private_pem, "alice")
        .await
        .unwrap();

    let outcome = service.verify(signature.id, &other_public_pem).await.unwrap();
    assert!(!outcome.is_valid);
    assert!(!outcome.signature_intact);
}

#[tokio::test]
async fn verify_with_malformed_public_key_returns_invalid_instead_of_raising() {
    let (store, service) = new_service();
    let (private_pem, _) = almwork_canon::generate_keypair().unwrap();

    let item = store
        .create(
            CreateWorkItem {
                work_item_type: WorkItemType::Requirement,
                title: "Auth".to_string(),
                description: None,
                status: None,
                priority: None,
                assigned_to: None,
                fields: Default::default(),
            },
            "alice",
        )
        .await
        .unwrap();

    let signature = service
        .sign(item.id, "alice", &private_pem, "alice")
        .await
        .unwrap();

    let outcome = service
        .verify(signature.id, "not a pem at all")
        .await
        .unwrap();
    assert!(!outcome.is_valid);
    assert!(!outcome.content_matches);
    assert!(!outcome.signature_intact);
    assert!(outcome.error.is_some());
}

#[tokio::test]
async fn verify_missing_signature_reports_not_found() {
    let (_store, service) = new_service();
    let (_, public_pem) = almwork_canon::generate_keypair().unwrap();

    let outcome = service.verify(uuid::Uuid::new_v4(), &public_pem).await.unwrap();
    assert!(!outcome.is_valid);
    assert_eq!(outcome.error.as_deref(), Some("Signature not found"));
}

#[tokio::test]
async fn invalidate_all_flips_valid_signatures_and_is_idempotent() {
    let (store, service) = new_service();
    let (private_pem, _) = almwork_canon::generate_keypair().unwrap();

    let item = store
        .create(
            CreateWorkItem {
                work_item_type: WorkItemType::Requirement,
                title: "Auth".to_string(),
                description: None,
                status: None,
                priority: None,
                assigned_to: None,
                fields: Default::default(),
            },
            "alice",
        )
        .await
        .unwrap();

    let signature = service
        .sign(item.id, "alice", &private_pem, "alice")
        .await
        .unwrap();

    let invalidated = service
        .invalidate_all(item.id, "WorkItem modified".to_string())
        .await
        .unwrap();
    assert_eq!(invalidated.len(), 1);
    assert_eq!(invalidated[0].id, signature.id);
    assert!(!invalidated[0].is_valid);

    // Idempotent: nothing left to invalidate.
    let second = service
        .invalidate_all(item.id, "WorkItem modified".to_string())
        .await
        .unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn verify_after_invalidation_reports_the_stored_reason() {
    let (store, service) = new_service();
    let (private_pem, public_pem) = almwork_canon::generate_keypair().unwrap();

    let item = store
        .create(
            CreateWorkItem {
                work_item_type: WorkItemType::Requirement,
                title: "Auth".to_string(),
                description: None,
                status: None,
                priority: None,
                assigned_to: None,
                fields: Default::default(),
            },
            "alice",
        )
        .await
        .unwrap();

    let signature = service
        .sign(item.id, "alice", &private_pem, "alice")
        .await
        .unwrap();
    service
        .invalidate_all(item.id, "WorkItem modified".to_string())
        .await
        .unwrap();

    // Simulate the title change an update would trigger (this test's store
    // has no live invalidation wiring, so it's done explicitly above).
    let _ = store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("AuthV2".to_string()),
                change_description: "rename".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await;

    let outcome = service.verify(signature.id, &public_pem).await.unwrap();
    assert!(!outcome.is_valid);
    assert_eq!(
        outcome.error.as_deref(),
        Some("Signature invalidated: WorkItem modified")
    );
}

#[tokio::test]
async fn signatures_for_filters_invalid_unless_requested() {
    let (store, service) = new_service();
    let (private_pem, _) = almwork_canon::generate_keypair().unwrap();

    let item = store
        .create(
            CreateWorkItem {
                work_item_type: WorkItemType::Requirement,
                title: "Auth".to_string(),
                description: None,
                status: None,
                priority: None,
                assigned_to: None,
                fields: Default::default(),
            },
            "alice",
        )
        .await
        .unwrap();

    service.sign(item.id, "alice", &private_pem, "alice").await.unwrap();
    assert!(service.is_signed(item.id).await.unwrap());

    service
        .invalidate_all(item.id, "WorkItem modified".to_string())
        .await
        .unwrap();
    assert!(!service.is_signed(item.id).await.unwrap());

    assert_eq!(service.signatures_for(item.id, false).await.unwrap().len(), 0);
    assert_eq!(service.signatures_for(item.id, true).await.unwrap().len(), 1);
}
