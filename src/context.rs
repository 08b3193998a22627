//! Process-wide wiring: constructs every subsystem once at startup and
//! hands out `Arc`-shared handles through a single context struct, never
//! a process-wide mutable static.

use std::sync::{Arc, OnceLock};

use almwork_config::AlmConfig;
use almwork_domain::{AuditSink, Signature, SignatureInvalidation, TracingAuditSink};
use almwork_email::EmailService;
use almwork_graph::{GraphExecutor, InMemoryGraph};
use almwork_llm::{HttpLlmBackend, LlmBackend};
use almwork_matcher::MatcherService;
use almwork_scheduler::Scheduler;
use almwork_signatures::SignatureService;
use almwork_sprint::SprintCoordinator;
use almwork_store::WorkItemStore;
use uuid::Uuid;

use crate::error::Result;

/// `almwork_store::WorkItemStore` takes its `SignatureInvalidation` handle
/// at construction, but the concrete `SignatureService` itself needs an
/// `Arc<WorkItemStore>` to read snapshots from — a genuine construction
/// cycle. This breaks it: the store is built against a deferred handle,
/// then the real signature service is dropped in once it exists. No
/// subsystem ever observes the handle unset, since nothing signs or
/// mutates a work item before [`AppContext::new`] returns.
#[derive(Default)]
struct DeferredInvalidation(OnceLock<Arc<SignatureService>>);

#[async_trait::async_trait]
impl SignatureInvalidation for DeferredInvalidation {
    async fn invalidate_all(&self, workitem_id: Uuid, reason: String) -> anyhow::Result<Vec<Signature>> {
        match self.0.get() {
            Some(service) => service.invalidate_all(workitem_id, reason).await,
            None => Ok(Vec::new()),
        }
    }

    async fn has_valid_signature(&self, workitem_id: Uuid) -> anyhow::Result<bool> {
        match self.0.get() {
            Some(service) => service.has_valid_signature(workitem_id).await,
            None => Ok(false),
        }
    }
}

/// Every subsystem the CLI (or an embedder) needs, constructed once from
/// [`AlmConfig`]. C2's graph executor is the in-memory reference backend;
/// a real deployment swaps `graph` for a concrete adapter without
/// touching any of the services built on top of it.
pub struct AppContext {
    pub config: AlmConfig,
    pub graph: Arc<dyn GraphExecutor>,
    pub audit: Arc<dyn AuditSink>,
    pub store: Arc<WorkItemStore>,
    pub signatures: Arc<SignatureService>,
    pub sprints: Arc<SprintCoordinator>,
    pub scheduler: Arc<Scheduler>,
    pub matcher: Arc<MatcherService>,
    pub email: Option<Arc<EmailService>>,
}

impl AppContext {
    /// Builds every service from `config`. Email ingestion (C7) is wired
    /// only when `config.smtp.host` is non-empty; a process with no mail
    /// transport configured simply runs without it.
    pub fn new(config: AlmConfig) -> Result<Self> {
        let graph: Arc<dyn GraphExecutor> = Arc::new(InMemoryGraph::new());
        let audit: Arc<dyn AuditSink> = Arc::new(TracingAuditSink);

        let deferred: Arc<DeferredInvalidation> = Arc::new(DeferredInvalidation::default());
        let store = Arc::new(WorkItemStore::new(graph.clone(), audit.clone(), deferred.clone()));
        let signatures = Arc::new(SignatureService::new(graph.clone(), store.clone(), audit.clone()));
        deferred
            .0
            .set(signatures.clone())
            .unwrap_or_else(|_| unreachable!("set exactly once, before any caller can observe it"));

        let sprints = Arc::new(SprintCoordinator::new(graph.clone(), store.clone(), audit.clone()));
        let scheduler = Arc::new(Scheduler::new(config.scheduler_solve_timeout_secs));
        let matcher = Arc::new(MatcherService::new(graph.clone(), store.clone(), audit.clone()));

        let llm: Option<Arc<dyn LlmBackend>> = if config.llm.enabled {
            Some(Arc::new(HttpLlmBackend::new(config.llm.clone())))
        } else {
            None
        };

        let email = if config.smtp.host.is_empty() {
            None
        } else {
            Some(Arc::new(EmailService::new(
                graph.clone(),
                store.clone(),
                audit.clone(),
                llm,
                &config.smtp,
                config.imap.clone(),
                &config.email,
            )?))
        };

        Ok(Self {
            config,
            graph,
            audit,
            store,
            signatures,
            sprints,
            scheduler,
            matcher,
            email,
        })
    }
}
