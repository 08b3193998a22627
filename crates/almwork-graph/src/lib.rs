//! Property-graph executor abstraction.
//!
//! The core depends only on [`GraphExecutor`]; [`InMemoryGraph`] is the
//! reference implementation used in tests and by embedders that haven't
//! wired a real graph database. Queries are built from [`model::GraphQuery`]
//! rather than formatted strings, so parameterization holds regardless of
//! which implementation is behind the trait.

pub mod error;
pub mod executor;
pub mod in_memory;
pub mod model;

pub use error::GraphError;
pub use executor::GraphExecutor;
pub use in_memory::InMemoryGraph;
pub use model::{
    Direction, Edge, FilterOp, GraphQuery, Node, PropertyFilter, QueryRow, QueryStart,
    TraversalStep,
};
