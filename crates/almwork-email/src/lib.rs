//! Email ingestion: threads a work item's instruction/reply exchange
//! through the subject line's `[WorkItem-<uuid>]` token, parsing structured
//! replies with a regex grammar and falling back to an LLM backend when
//! the sender didn't follow the format.

mod codec;
mod error;
mod inbound;
mod outbound;
mod patterns;
mod service;

pub use error::EmailError;
pub use inbound::{Poller, RawIncomingMessage};
pub use outbound::SmtpSender;
pub use patterns::{extract_workitem_id, is_plausible_email, parse_structured_reply, StructuredReply};
pub use service::{EmailService, IngestOutcome, SendOutcome};
