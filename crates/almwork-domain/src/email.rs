use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of attempting to extract a status/comment update from a message
/// body, recorded alongside the raw message for audit and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Matched one of the structured-reply regexes directly.
    Structured,
    /// Structured match failed; an LLM backend produced the extraction.
    Llm,
    /// Neither strategy produced a usable result.
    Unresolved,
}

/// A single inbound or outbound message in a work-item's email thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: Uuid,
    pub thread_id: Uuid,
    /// IMAP `Message-Id` header, used to deduplicate re-polled mailboxes.
    pub message_id: String,
    pub from_address: String,
    pub subject: String,
    pub body_text: String,
    pub received_at: DateTime<Utc>,
    pub extraction_method: ExtractionMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_comment: Option<String>,
}

/// Groups the email exchange tied to a single work-item, keyed by the
/// work-item id so inbound replies can be correlated back via the subject
/// line's embedded reference token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailThread {
    pub id: Uuid,
    pub work_item_id: Uuid,
    pub recipient_address: String,
    pub created_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
    pub message_count: u32,
}
