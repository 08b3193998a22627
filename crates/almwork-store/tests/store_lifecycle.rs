use std::sync::Arc;

use almwork_domain::{
    AuditSink, CreateWorkItem, PartialFields, Signature, SignatureInvalidation, TracingAuditSink,
    UpdateWorkItem, WorkItemFields, WorkItemStatus, WorkItemType,
};
use almwork_graph::InMemoryGraph;
use almwork_store::{SearchFilters, StoreError, WorkItemStore};
use uuid::Uuid;

/// Records every `invalidate_all` call so tests can assert on invocation
/// without wiring up the real signature service.
#[derive(Default)]
struct RecordingInvalidation {
    calls: std::sync::Mutex<Vec<(Uuid, String)>>,
}

#[async_trait::async_trait]
impl SignatureInvalidation for RecordingInvalidation {
    async fn invalidate_all(
        &self,
        workitem_id: Uuid,
        reason: String,
    ) -> anyhow::Result<Vec<Signature>> {
        self.calls.lock().unwrap().push((workitem_id, reason));
        Ok(Vec::new())
    }

    async fn has_valid_signature(&self, _workitem_id: Uuid) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// Lets tests flip whether a work-item is treated as currently signed,
/// without needing the real signature service.
struct StubSignatures {
    signed: std::sync::atomic::AtomicBool,
}

#[async_trait::async_trait]
impl SignatureInvalidation for StubSignatures {
    async fn invalidate_all(
        &self,
        _workitem_id: Uuid,
        _reason: String,
    ) -> anyhow::Result<Vec<Signature>> {
        self.signed.store(false, std::sync::atomic::Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn has_valid_signature(&self, _workitem_id: Uuid) -> anyhow::Result<bool> {
        Ok(self.signed.load(std::sync::atomic::Ordering::SeqCst))
    }
}

fn new_store() -> (Arc<WorkItemStore>, Arc<RecordingInvalidation>) {
    let graph = Arc::new(InMemoryGraph::new()) as Arc<dyn almwork_graph::GraphExecutor>;
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let signatures = Arc::new(RecordingInvalidation::default());
    let store = Arc::new(WorkItemStore::new(
        graph,
        audit,
        Arc::clone(&signatures) as Arc<dyn SignatureInvalidation>,
    ));
    (store, signatures)
}

fn create_payload(title: &str) -> CreateWorkItem {
    CreateWorkItem {
        work_item_type: WorkItemType::Requirement,
        title: title.to_string(),
        description: Some("a description".to_string()),
        status: None,
        priority: Some(3),
        assigned_to: None,
        fields: WorkItemFields::default(),
    }
}

#[tokio::test]
async fn create_assigns_version_one_dot_zero_and_draft_status() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    assert_eq!(item.version, "1.0");
    assert_eq!(item.status, WorkItemStatus::Draft);
    assert_eq!(item.created_by, "alice");
    assert!(item.updated_by.is_none());
}

#[tokio::test]
async fn create_rejects_title_outside_bounds() {
    let (store, _sig) = new_store();
    let err = store.create(create_payload("hi"), "alice").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn create_rejects_whitespace_only_title() {
    let (store, _sig) = new_store();
    let err = store.create(create_payload("     "), "alice").await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn create_trims_surrounding_whitespace_from_title() {
    let (store, _sig) = new_store();
    let item = store
        .create(create_payload("  Auth system  "), "alice")
        .await
        .unwrap();
    assert_eq!(item.title, "Auth system");
}

#[tokio::test]
async fn create_computes_rpn_only_when_all_three_ratings_present() {
    let (store, _sig) = new_store();
    let mut payload = create_payload("Risk of fire");
    payload.fields.severity = Some(8);
    payload.fields.occurrence = Some(3);
    let item = store.create(payload, "alice").await.unwrap();
    assert!(item.fields.rpn.is_none());

    let mut payload = create_payload("Risk of flood");
    payload.fields.severity = Some(8);
    payload.fields.occurrence = Some(3);
    payload.fields.detection = Some(2);
    let item = store.create(payload, "alice").await.unwrap();
    assert_eq!(item.fields.rpn, Some(48));
}

#[tokio::test]
async fn update_bumps_minor_version_and_keeps_prior_immutable() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    let updated = store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("Auth systemV2".to_string()),
                change_description: "rename".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(updated.version, "1.1");
    assert_eq!(updated.title, "Auth systemV2");
    assert_eq!(updated.updated_by.as_deref(), Some("alice"));

    // The prior snapshot is untouched.
    let original = store.get_version(item.id, "1.0").await.unwrap().unwrap();
    assert_eq!(original.title, "Auth system");
    assert_eq!(original, item);
}

#[tokio::test]
async fn update_requires_non_blank_change_description() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    let err = store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("Renamed".to_string()),
                change_description: "   ".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn update_on_missing_item_is_not_found() {
    let (store, _sig) = new_store();
    let err = store
        .update(
            Uuid::new_v4(),
            UpdateWorkItem {
                change_description: "whatever".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn repeated_updates_keep_minor_version_strictly_increasing() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    let mut versions = vec![item.parsed_version()];
    let mut current_id = item.id;
    for n in 1..=4 {
        let updated = store
            .update(
                current_id,
                UpdateWorkItem {
                    change_description: format!("edit {n}"),
                    ..Default::default()
                },
                "alice",
            )
            .await
            .unwrap();
        versions.push(updated.parsed_version());
        current_id = updated.id;
    }

    for window in versions.windows(2) {
        assert!(window[1] > window[0], "version must strictly increase");
    }

    let history = store.history(item.id).await.unwrap();
    assert_eq!(history.len(), 5);
    // newest-first
    assert_eq!(history[0].version, "1.4");
    assert_eq!(history[4].version, "1.0");
}

#[tokio::test]
async fn update_invalidates_signatures_with_the_spec_reason() {
    let (store, sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("AuthV2".to_string()),
                change_description: "rename".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let calls = sig.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, item.id);
    assert_eq!(calls[0].1, "WorkItem modified");
}

#[tokio::test]
async fn get_returns_only_the_current_snapshot() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("AuthV2".to_string()),
                change_description: "rename".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let current = store.get(item.id).await.unwrap().unwrap();
    assert_eq!(current.version, "1.1");
    assert_eq!(current.title, "AuthV2");
}

#[tokio::test]
async fn fetching_the_same_version_twice_is_byte_identical() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    let first = store.get_version(item.id, "1.0").await.unwrap().unwrap();
    let second = store.get_version(item.id, "1.0").await.unwrap().unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn delete_refuses_when_signed_unless_forced() {
    let graph = Arc::new(InMemoryGraph::new()) as Arc<dyn almwork_graph::GraphExecutor>;
    let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);
    let signatures = Arc::new(StubSignatures {
        signed: std::sync::atomic::AtomicBool::new(true),
    });
    let store = WorkItemStore::new(graph, audit, signatures as Arc<dyn SignatureInvalidation>);

    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    let err = store.delete(item.id, false, "alice").await.unwrap_err();
    assert!(matches!(err, StoreError::SignatureExists(_)));

    store.delete(item.id, true, "alice").await.unwrap();
    assert!(store.get(item.id).await.unwrap().is_none());
}

#[tokio::test]
async fn delete_on_missing_item_is_not_found() {
    let (store, _sig) = new_store();
    let err = store.delete(Uuid::new_v4(), false, "alice").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn search_filters_by_free_text_and_type_and_respects_limit() {
    let (store, _sig) = new_store();
    store.create(create_payload("Login with OAuth"), "alice").await.unwrap();
    store.create(create_payload("Password reset flow"), "alice").await.unwrap();
    let mut task = create_payload("Unrelated task title");
    task.work_item_type = WorkItemType::Task;
    store.create(task, "alice").await.unwrap();

    let results = store
        .search(SearchFilters {
            free_text: Some("oauth".to_string()),
            ..SearchFilters::new()
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Login with OAuth");

    let results = store
        .search(SearchFilters {
            work_item_type: Some(WorkItemType::Requirement),
            ..SearchFilters::new()
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 2);

    let results = store
        .search(SearchFilters {
            limit: 1,
            ..SearchFilters::new()
        })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn search_only_returns_current_versions() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("Auth systemV2".to_string()),
                change_description: "rename".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let results = store.search(SearchFilters::new()).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Auth systemV2");
}

#[tokio::test]
async fn compare_reports_changed_unchanged_and_added_fields() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("AuthV2".to_string()),
                change_description: "rename".to_string(),
                fields: PartialFields {
                    estimated_hours: Some(5.0),
                    ..Default::default()
                },
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let comparison = store.compare(item.id, "1.0", "1.1").await.unwrap();
    assert!(comparison.changed_fields.contains_key("title"));
    assert!(comparison.changed_fields.contains_key("version"));
    assert!(comparison.changed_fields.contains_key("updated_at"));
    assert!(comparison.unchanged_fields.contains(&"created_by".to_string()));
    assert!(comparison.added_fields.contains(&"estimated_hours".to_string()));
}

#[tokio::test]
async fn restore_writes_a_new_version_with_old_content() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    store
        .update(
            item.id,
            UpdateWorkItem {
                title: Some("AuthV2".to_string()),
                change_description: "rename".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    let restored = store.restore(item.id, "1.0", "bob").await.unwrap();
    assert_eq!(restored.version, "1.2");
    assert_eq!(restored.title, "Auth system");
    assert_eq!(
        restored.change_description.as_deref(),
        Some("Restored to version 1.0")
    );

    let history = store.history(item.id).await.unwrap();
    assert_eq!(history.len(), 3);
}

#[tokio::test]
async fn restore_clears_a_field_the_target_never_had() {
    let (store, _sig) = new_store();
    // v1.0 has no `assigned_to`.
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    assert!(item.assigned_to.is_none());

    // v1.1 sets it.
    store
        .update(
            item.id,
            UpdateWorkItem {
                assigned_to: Some("carol".to_string()),
                change_description: "assign".to_string(),
                ..Default::default()
            },
            "alice",
        )
        .await
        .unwrap();

    // Restoring to v1.0 must clear `assigned_to`, not silently keep "carol"
    // from the current snapshot.
    let restored = store.restore(item.id, "1.0", "bob").await.unwrap();
    assert!(restored.assigned_to.is_none());
}

#[tokio::test]
async fn restore_on_missing_version_is_version_not_found() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();
    let err = store.restore(item.id, "9.9", "bob").await.unwrap_err();
    assert!(matches!(err, StoreError::VersionNotFound(_, _)));
}

#[tokio::test]
async fn concurrent_updates_to_the_same_item_serialize_without_lost_updates() {
    let (store, _sig) = new_store();
    let item = store.create(create_payload("Auth system"), "alice").await.unwrap();

    let mut handles = Vec::new();
    for n in 0..10 {
        let store = Arc::clone(&store);
        let id = item.id;
        handles.push(tokio::spawn(async move {
            store
                .update(
                    id,
                    UpdateWorkItem {
                        change_description: format!("concurrent edit {n}"),
                        ..Default::default()
                    },
                    "alice",
                )
                .await
        }));
    }

    let mut successes = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            successes += 1;
        }
    }
    assert_eq!(successes, 10);

    let history = store.history(item.id).await.unwrap();
    assert_eq!(history.len(), 11);
    let mut versions: Vec<_> = history.iter().map(|i| i.parsed_version()).collect();
    versions.sort();
    versions.dedup();
    assert_eq!(versions.len(), 11, "no two concurrent writers collided on a version");
}
