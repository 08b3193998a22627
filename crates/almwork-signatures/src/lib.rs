//! Digital signature engine (C4): sign a work-item snapshot, verify it
//! against the item's current content, invalidate on mutation, and answer
//! signature queries.
//!
//! Built on [`almwork_canon`]'s canonical hashing and RSA-PSS primitives
//! (C1) and [`almwork_store`]'s versioned snapshots (C3). Implements
//! [`almwork_domain::SignatureInvalidation`] so a [`almwork_store::WorkItemStore`]
//! can invalidate signatures on mutation without depending on this crate.

pub mod codec;
pub mod error;
pub mod service;

pub use error::SignatureError;
pub use service::{SignatureService, VerifyOutcome};
