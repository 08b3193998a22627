use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::GraphError;
use crate::model::{GraphQuery, Node, QueryRow};

/// The minimal capability set the rest of the core depends on.
///
/// Every embedder swaps this for a real graph-database adapter; the core
/// never depends on a concrete type, only this trait, so no call site ever
/// needs to know whether it's talking to an in-process map or a networked
/// graph store.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    /// Creates a labelled node. `id` must not already exist.
    async fn create_node(
        &self,
        label: &str,
        props: Map<String, Value>,
    ) -> Result<Node, GraphError>;

    /// Merges `props` onto the existing node; does not touch relationships.
    async fn update_node(&self, id: Uuid, props: Map<String, Value>) -> Result<Node, GraphError>;

    async fn get_node(&self, id: Uuid) -> Result<Option<Node>, GraphError>;

    /// Removes the node and all incident edges (detach-delete).
    async fn delete_node(&self, id: Uuid) -> Result<(), GraphError>;

    /// Idempotent on `(from, to, rel_type)`: a repeated call merges
    /// properties onto the existing edge rather than duplicating it.
    async fn create_relationship(
        &self,
        from: Uuid,
        to: Uuid,
        rel_type: &str,
        props: Option<Map<String, Value>>,
    ) -> Result<(), GraphError>;

    /// Deletes relationships matching all of the given (optional)
    /// endpoints/type; `None` means "don't filter on this dimension".
    /// Returns the number removed.
    async fn remove_relationships(
        &self,
        from: Option<Uuid>,
        to: Option<Uuid>,
        rel_type: Option<&str>,
    ) -> Result<usize, GraphError>;

    /// Runs a parameterized traversal/filter query, returning property-map
    /// rows.
    async fn execute_query(&self, query: &GraphQuery) -> Result<Vec<QueryRow>, GraphError>;
}
