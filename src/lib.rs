//! Library surface for the almwork CLI binary: wires every subsystem crate
//! into a single [`context::AppContext`] and exposes the `clap` command
//! tree that drives it.

pub mod cli;
pub mod context;
pub mod error;
pub mod logging;

pub use context::AppContext;
pub use error::{AlmError, Result};
