//! LLM extraction fallback for `almwork-email`'s structured-reply parser.
//!
//! Deliberately a single narrow trait plus one HTTP implementation — the
//! original `LlmService`'s chat/meeting-knowledge/health-check surface is
//! out of scope; only `extract_work_instruction` is needed anywhere in this
//! workspace.

pub mod backend;
pub mod error;
pub mod types;

pub use backend::{HttpLlmBackend, LlmBackend};
pub use error::LlmError;
pub use types::{WorkInstructionExtraction, ALLOWED_STATUSES};
