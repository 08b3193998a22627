//! Sprint/backlog coordinator (C5): sprint lifecycle, capacity-admitted
//! task assignment, backlog membership, velocity, and burndown.
//!
//! Built on [`almwork_store::WorkItemStore`] (C3) for task status/estimate
//! reads and on `almwork_graph`'s [`almwork_graph::GraphExecutor`] (C2) for
//! its own `Sprint`/`Backlog`/roster rows.

pub mod codec;
pub mod coordinator;
pub mod error;
pub mod locks;

pub use coordinator::{BurndownPoint, CreateSprint, SprintCoordinator};
pub use error::SprintError;
