use std::sync::Arc;

use almwork_config::{EmailConfig, ImapConfig, SmtpConfig};
use almwork_domain::{
    AuditEvent, AuditSink, EmailMessage, EmailThread, ExtractionMethod, UpdateWorkItem,
};
use almwork_graph::{GraphExecutor, GraphQuery, PropertyFilter};
use almwork_llm::LlmBackend;
use almwork_store::WorkItemStore;
use chrono::Utc;
use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::codec::{self, MESSAGE_LABEL, THREAD_LABEL};
use crate::error::{EmailError, Result};
use crate::inbound::{self, Poller, RawIncomingMessage};
use crate::outbound::{self, SmtpSender};
use crate::patterns::{self, StructuredReply};

/// Result of a [`EmailService::send_work_instruction`] call.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub message_id: String,
    pub thread_id: Uuid,
    pub sent_to: Vec<String>,
    pub rejected: Vec<String>,
}

/// Result of parsing one inbound email against a work item.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub work_item_id: Option<Uuid>,
    pub extraction_method: ExtractionMethod,
    pub reply: Option<StructuredReply>,
}

/// Email ingestion (C7): outbound work-instruction dispatch, inbound IMAP
/// polling, and the structured-then-LLM-fallback reply parser, all
/// threaded through the same work item by the `[WorkItem-<uuid>]` subject
/// token.
///
/// Grounded on `email_service.py`'s `EmailService` class: `send_work_instruction`
/// / `parse_structured_reply` / `_parse_with_llm` / `send_parsing_error` /
/// `connect_imap` / `fetch_new_emails` / `start_polling` / `stop_polling` /
/// `get_thread_history` / `get_all_threads`.
pub struct EmailService {
    graph: Arc<dyn GraphExecutor>,
    store: Arc<WorkItemStore>,
    audit: Arc<dyn AuditSink>,
    llm: Option<Arc<dyn LlmBackend>>,
    smtp: SmtpSender,
    imap: ImapConfig,
    poll_interval_secs: u64,
    poller: Mutex<Poller>,
}

impl EmailService {
    pub fn new(
        graph: Arc<dyn GraphExecutor>,
        store: Arc<WorkItemStore>,
        audit: Arc<dyn AuditSink>,
        llm: Option<Arc<dyn LlmBackend>>,
        smtp_config: &SmtpConfig,
        imap_config: ImapConfig,
        email_config: &EmailConfig,
    ) -> Result<Self> {
        let smtp = SmtpSender::new(smtp_config, email_config.from.clone(), email_config.reply_to.clone())?;
        Ok(Self {
            graph,
            store,
            audit,
            llm,
            smtp,
            imap: imap_config,
            poll_interval_secs: email_config.poll_interval_secs,
            poller: Mutex::new(Poller::new()),
        })
    }

    // -- thread bookkeeping -------------------------------------------------

    async fn thread_row(&self, work_item_id: Uuid) -> Result<Option<EmailThread>> {
        let query = GraphQuery::start_by_label(THREAD_LABEL)
            .filter(PropertyFilter::eq("work_item_id", work_item_id.to_string()))
            .limit(1);
        let mut rows = self.graph.execute_query(&query).await?;
        rows.pop().map(codec::thread_from_props).transpose()
    }

    async fn get_or_create_thread(&self, work_item_id: Uuid, recipient_address: &str) -> Result<EmailThread> {
        if let Some(thread) = self.thread_row(work_item_id).await? {
            return Ok(thread);
        }
        let now = Utc::now();
        let thread = EmailThread {
            id: Uuid::new_v4(),
            work_item_id,
            recipient_address: recipient_address.to_string(),
            created_at: now,
            last_message_at: now,
            message_count: 0,
        };
        self.graph
            .create_node(THREAD_LABEL, codec::thread_to_props(&thread)?)
            .await?;
        Ok(thread)
    }

    /// Messages for `work_item_id`'s thread, ordered chronologically.
    pub async fn get_thread_history(&self, work_item_id: Uuid) -> Result<Vec<EmailMessage>> {
        let Some(thread) = self.thread_row(work_item_id).await? else {
            return Err(EmailError::ThreadNotFound(work_item_id));
        };
        let query = GraphQuery::start_by_label(MESSAGE_LABEL)
            .filter(PropertyFilter::eq("thread_id", thread.id.to_string()));
        let rows = self.graph.execute_query(&query).await?;
        let mut messages: Vec<EmailMessage> = rows
            .into_iter()
            .map(codec::message_from_props)
            .collect::<Result<_>>()?;
        messages.sort_by_key(|m| m.received_at);
        Ok(messages)
    }

    pub async fn get_all_threads(&self) -> Result<Vec<EmailThread>> {
        let query = GraphQuery::start_by_label(THREAD_LABEL);
        let rows = self.graph.execute_query(&query).await?;
        rows.into_iter().map(codec::thread_from_props).collect()
    }

    // -- outbound -------------------------------------------------------

    /// Sends a work-instruction email for `work_item_id`, subject-tagged
    /// `[WorkItem-<uuid>] <title>` so replies route back to it.
    pub async fn send_work_instruction(
        &self,
        work_item_id: Uuid,
        recipients: &[String],
        caller: &str,
    ) -> Result<SendOutcome> {
        let item = self
            .store
            .get(work_item_id)
            .await?
            .ok_or(EmailError::WorkItemNotFound(work_item_id))?;

        let (valid, rejected) = SmtpSender::partition_recipients(recipients);
        if valid.is_empty() {
            return Err(EmailError::NoValidRecipients(rejected));
        }

        let subject = outbound::work_instruction_subject(work_item_id, &item.title);
        let body = outbound::work_instruction_body(
            &item.title,
            item.description.as_deref(),
            item.status.as_str(),
            item.priority,
            work_item_id,
        );

        let message_id = self.smtp.send_plain_text(&valid, &subject, &body, true).await?;

        let thread = self
            .get_or_create_thread(work_item_id, valid.first().expect("checked non-empty above"))
            .await?;
        let message = EmailMessage {
            id: Uuid::new_v4(),
            thread_id: thread.id,
            message_id: message_id.clone(),
            from_address: valid.join(", "),
            subject: subject.clone(),
            body_text: body,
            received_at: Utc::now(),
            extraction_method: ExtractionMethod::Unresolved,
            extracted_status: None,
            extracted_comment: None,
        };
        self.record_message(work_item_id, &message).await?;

        self.audit
            .record(
                AuditEvent::new("WorkItem", work_item_id, "send_work_instruction", caller, Utc::now())
                    .with_detail(json!({ "message_id": message_id, "recipients": valid })),
            )
            .await;

        Ok(SendOutcome {
            message_id,
            thread_id: thread.id,
            sent_to: valid,
            rejected,
        })
    }

    async fn record_message(&self, work_item_id: Uuid, message: &EmailMessage) -> Result<()> {
        let query = GraphQuery::start_by_label(MESSAGE_LABEL)
            .filter(PropertyFilter::eq("thread_id", message.thread_id.to_string()))
            .filter(PropertyFilter::eq("message_id", message.message_id.clone()));
        if !self.graph.execute_query(&query).await?.is_empty() {
            return Ok(());
        }
        self.graph
            .create_node(MESSAGE_LABEL, codec::message_to_props(message)?)
            .await?;
        if let Some(mut thread) = self.thread_row(work_item_id).await? {
            thread.message_count += 1;
            thread.last_message_at = message.received_at.max(thread.last_message_at);
            self.graph
                .update_node(thread.id, codec::thread_to_props(&thread)?)
                .await?;
        }
        Ok(())
    }

    pub async fn send_parsing_error(
        &self,
        recipient: &str,
        original_subject: &str,
        error_message: &str,
        work_item_id: Option<Uuid>,
    ) -> bool {
        if !patterns::is_plausible_email(recipient) {
            return false;
        }
        let subject = format!("Re: {original_subject} - Parsing Error");
        let body = outbound::parsing_error_body(error_message, work_item_id);
        self.smtp
            .send_plain_text(std::slice::from_ref(&recipient.to_string()), &subject, &body, false)
            .await
            .is_ok()
    }

    // -- inbound ----------------------------------------------------------

    /// Runs the full ingestion pipeline for one fetched message: extract
    /// the work-item id from the subject, parse structured fields, fall
    /// back to the LLM backend, apply the update, and notify the sender on
    /// total failure.
    pub async fn process_incoming(&self, raw: RawIncomingMessage) -> Result<IngestOutcome> {
        let Some(work_item_id) = patterns::extract_workitem_id(&raw.subject) else {
            return Ok(IngestOutcome {
                work_item_id: None,
                extraction_method: ExtractionMethod::Unresolved,
                reply: None,
            });
        };

        let (reply, method) = match patterns::parse_structured_reply(&raw.body_text) {
            Some(reply) => (Some(reply), ExtractionMethod::Structured),
            None => match &self.llm {
                Some(backend) => match backend.extract_work_instruction(&raw.body_text).await {
                    Ok(Some(extraction)) => (
                        Some(StructuredReply {
                            status: extraction
                                .status
                                .as_deref()
                                .and_then(almwork_domain::WorkItemStatus::parse_with_aliases),
                            comment: join_comment_and_next_steps(
                                extraction.comment,
                                extraction.next_steps,
                            ),
                            time_spent: extraction.time_spent,
                        }),
                        ExtractionMethod::Llm,
                    ),
                    _ => (None, ExtractionMethod::Unresolved),
                },
                None => (None, ExtractionMethod::Unresolved),
            },
        };

        let thread = self.get_or_create_thread(work_item_id, &raw.from_address).await?;
        let message = EmailMessage {
            id: Uuid::new_v4(),
            thread_id: thread.id,
            message_id: raw.message_id.clone(),
            from_address: raw.from_address.clone(),
            subject: raw.subject.clone(),
            body_text: raw.body_text.clone(),
            received_at: Utc::now(),
            extraction_method: method,
            extracted_status: reply.as_ref().and_then(|r| r.status).map(|s| s.as_str().to_string()),
            extracted_comment: reply.as_ref().and_then(|r| r.comment.clone()),
        };
        self.record_message(work_item_id, &message).await?;

        let Some(reply) = reply else {
            self.send_parsing_error(
                &raw.from_address,
                &raw.subject,
                "Could not parse email content",
                Some(work_item_id),
            )
            .await;
            return Ok(IngestOutcome {
                work_item_id: Some(work_item_id),
                extraction_method: method,
                reply: None,
            });
        };

        self.apply_reply(work_item_id, &reply, &raw.from_address).await?;

        Ok(IngestOutcome {
            work_item_id: Some(work_item_id),
            extraction_method: method,
            reply: Some(reply),
        })
    }

    async fn apply_reply(&self, work_item_id: Uuid, reply: &StructuredReply, caller: &str) -> Result<()> {
        let item = self
            .store
            .get(work_item_id)
            .await?
            .ok_or(EmailError::WorkItemNotFound(work_item_id))?;

        let mut extra = std::collections::BTreeMap::new();
        if let Some(time_spent) = reply.time_spent {
            let logged_so_far = item
                .fields
                .extra
                .get("time_logged_hours")
                .and_then(serde_json::Value::as_f64)
                .unwrap_or(0.0);
            extra.insert(
                "time_logged_hours".to_string(),
                json!(logged_so_far + time_spent),
            );
        }

        let change_description = reply
            .comment
            .clone()
            .unwrap_or_else(|| "Updated via email reply".to_string());

        let update = UpdateWorkItem {
            title: None,
            description: None,
            status: reply.status,
            priority: None,
            assigned_to: None,
            change_description,
            fields: almwork_domain::PartialFields {
                extra,
                ..Default::default()
            },
        };

        self.store.update(work_item_id, update, caller).await?;
        Ok(())
    }

    // -- polling ------------------------------------------------------------

    pub async fn is_polling(&self) -> bool {
        self.poller.lock().await.is_polling()
    }

    /// Starts the background poll loop. No-op error if already polling.
    pub async fn start_polling(self: &Arc<Self>) -> Result<()> {
        let service = self.clone();
        let interval = self.poll_interval_secs;
        self.poller.lock().await.start(interval, move || {
            let service = service.clone();
            async move {
                match tokio::task::spawn_blocking({
                    let imap = service.imap.clone();
                    move || inbound::fetch_new_emails(&imap)
                })
                .await
                {
                    Ok(Ok(messages)) => {
                        for raw in messages {
                            if let Err(e) = service.process_incoming(raw).await {
                                tracing::error!(
                                    error = %almwork_redaction::redact(&e.to_string()),
                                    "failed to process inbound email"
                                );
                            }
                        }
                    }
                    Ok(Err(e)) => tracing::error!(
                        error = %almwork_redaction::redact(&e.to_string()),
                        "email polling fetch failed"
                    ),
                    Err(e) => tracing::error!(
                        error = %almwork_redaction::redact(&e.to_string()),
                        "email polling task panicked"
                    ),
                }
            }
        })
    }

    pub async fn stop_polling(&self) {
        self.poller.lock().await.stop().await;
    }
}

/// `WorkInstructionExtraction` carries `next_steps` as a field of its own,
/// but a structured reply only has one comment slot; folding the former
/// onto the latter keeps both visible on the work item without adding a
/// domain field that only the LLM path would ever populate.
fn join_comment_and_next_steps(comment: Option<String>, next_steps: Option<String>) -> Option<String> {
    match (comment, next_steps) {
        (Some(c), Some(n)) => Some(format!("{c}\n\nNext steps: {n}")),
        (Some(c), None) => Some(c),
        (None, Some(n)) => Some(format!("Next steps: {n}")),
        (None, None) => None,
    }
}
