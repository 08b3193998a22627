use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::GraphError;
use crate::executor::GraphExecutor;
use crate::model::{Direction, Edge, GraphQuery, Node, QueryRow, QueryStart};

#[derive(Default)]
struct State {
    nodes: HashMap<Uuid, Node>,
    edges: Vec<Edge>,
}

/// A single-process, in-memory [`GraphExecutor`].
///
/// Used by the core's own test suite and by any embedder that has not
/// wired a real graph database — every query still goes through the same
/// parameterized [`GraphQuery`] AST a networked backend would consume, so
/// swapping this out never changes a call site.
#[derive(Default)]
pub struct InMemoryGraph {
    state: RwLock<State>,
}

impl InMemoryGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn edge_matches(edge: &Edge, from: Option<Uuid>, to: Option<Uuid>, rel_type: Option<&str>) -> bool {
    from.is_none_or(|f| edge.from == f)
        && to.is_none_or(|t| edge.to == t)
        && rel_type.is_none_or(|r| edge.rel_type == r)
}

#[async_trait]
impl GraphExecutor for InMemoryGraph {
    async fn create_node(
        &self,
        label: &str,
        mut props: Map<String, Value>,
    ) -> Result<Node, GraphError> {
        let id = match props.get("id").and_then(Value::as_str) {
            Some(existing) => Uuid::parse_str(existing)
                .map_err(|e| GraphError::Query(format!("invalid id property: {e}")))?,
            None => Uuid::new_v4(),
        };
        props.insert("id".into(), Value::String(id.to_string()));

        let mut state = self.state.write().await;
        if state.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let node = Node {
            id,
            label: label.to_string(),
            props,
        };
        state.nodes.insert(id, node.clone());
        Ok(node)
    }

    async fn update_node(&self, id: Uuid, props: Map<String, Value>) -> Result<Node, GraphError> {
        let mut state = self.state.write().await;
        let node = state
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        for (k, v) in props {
            node.props.insert(k, v);
        }
        Ok(node.clone())
    }

    async fn get_node(&self, id: Uuid) -> Result<Option<Node>, GraphError> {
        Ok(self.state.read().await.nodes.get(&id).cloned())
    }

    async fn delete_node(&self, id: Uuid) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        state
            .nodes
            .remove(&id)
            .ok_or(GraphError::NodeNotFound(id))?;
        state.edges.retain(|e| e.from != id && e.to != id);
        Ok(())
    }

    async fn create_relationship(
        &self,
        from: Uuid,
        to: Uuid,
        rel_type: &str,
        props: Option<Map<String, Value>>,
    ) -> Result<(), GraphError> {
        let mut state = self.state.write().await;
        if !state.nodes.contains_key(&from) {
            return Err(GraphError::NodeNotFound(from));
        }
        if !state.nodes.contains_key(&to) {
            return Err(GraphError::NodeNotFound(to));
        }
        if let Some(existing) = state
            .edges
            .iter_mut()
            .find(|e| e.from == from && e.to == to && e.rel_type == rel_type)
        {
            if let Some(props) = props {
                for (k, v) in props {
                    existing.props.insert(k, v);
                }
            }
            return Ok(());
        }
        state.edges.push(Edge {
            from,
            to,
            rel_type: rel_type.to_string(),
            props: props.unwrap_or_default(),
        });
        Ok(())
    }

    async fn remove_relationships(
        &self,
        from: Option<Uuid>,
        to: Option<Uuid>,
        rel_type: Option<&str>,
    ) -> Result<usize, GraphError> {
        let mut state = self.state.write().await;
        let before = state.edges.len();
        state
            .edges
            .retain(|e| !edge_matches(e, from, to, rel_type));
        Ok(before - state.edges.len())
    }

    async fn execute_query(&self, query: &GraphQuery) -> Result<Vec<QueryRow>, GraphError> {
        let state = self.state.read().await;

        let Some(start) = &query.start else {
            return Err(GraphError::Query("query has no start clause".into()));
        };

        let mut current: Vec<Uuid> = match start {
            QueryStart::ById(id) => {
                if state.nodes.contains_key(id) {
                    vec![*id]
                } else {
                    vec![]
                }
            }
            QueryStart::ByLabel(label) => state
                .nodes
                .values()
                .filter(|n| &n.label == label)
                .map(|n| n.id)
                .collect(),
        };

        for step in &query.traversals {
            let mut next = Vec::new();
            for &node_id in &current {
                for edge in &state.edges {
                    let neighbor = match step.direction {
                        Direction::Outgoing if edge.from == node_id => Some(edge.to),
                        Direction::Incoming if edge.to == node_id => Some(edge.from),
                        Direction::Either if edge.from == node_id => Some(edge.to),
                        Direction::Either if edge.to == node_id => Some(edge.from),
                        _ => None,
                    };
                    let Some(neighbor_id) = neighbor else {
                        continue;
                    };
                    if let Some(rel_type) = &step.rel_type {
                        if &edge.rel_type != rel_type {
                            continue;
                        }
                    }
                    let Some(neighbor_node) = state.nodes.get(&neighbor_id) else {
                        continue;
                    };
                    if let Some(target_label) = &step.target_label {
                        if &neighbor_node.label != target_label {
                            continue;
                        }
                    }
                    if !step
                        .filters
                        .iter()
                        .all(|f| f.matches(&neighbor_node.props))
                    {
                        continue;
                    }
                    next.push(neighbor_id);
                }
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }

        let mut rows: Vec<QueryRow> = current
            .into_iter()
            .filter_map(|id| state.nodes.get(&id))
            .filter(|n| query.filters.iter().all(|f| f.matches(&n.props)))
            .map(|n| n.props.clone())
            .collect();

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn props(label: &str) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("label_hint".into(), json!(label));
        m
    }

    #[tokio::test]
    async fn create_and_get_roundtrips() {
        let graph = InMemoryGraph::new();
        let node = graph.create_node("WorkItem", props("x")).await.unwrap();
        let fetched = graph.get_node(node.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, node.id);
        assert_eq!(fetched.label, "WorkItem");
    }

    #[tokio::test]
    async fn duplicate_id_rejected() {
        let graph = InMemoryGraph::new();
        let id = Uuid::new_v4();
        let mut p = Map::new();
        p.insert("id".into(), json!(id.to_string()));
        graph.create_node("WorkItem", p.clone()).await.unwrap();
        let err = graph.create_node("WorkItem", p).await.unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(_)));
    }

    #[tokio::test]
    async fn delete_node_detaches_edges() {
        let graph = InMemoryGraph::new();
        let a = graph.create_node("WorkItem", props("a")).await.unwrap();
        let b = graph.create_node("WorkItem", props("b")).await.unwrap();
        graph
            .create_relationship(a.id, b.id, "NEXT_VERSION", None)
            .await
            .unwrap();
        graph.delete_node(a.id).await.unwrap();

        let removed = graph
            .remove_relationships(Some(a.id), None, None)
            .await
            .unwrap();
        assert_eq!(removed, 0, "edge should already be gone via detach-delete");
    }

    #[tokio::test]
    async fn create_relationship_is_idempotent() {
        let graph = InMemoryGraph::new();
        let a = graph.create_node("WorkItem", props("a")).await.unwrap();
        let b = graph.create_node("WorkItem", props("b")).await.unwrap();
        graph
            .create_relationship(a.id, b.id, "DEPENDS_ON", None)
            .await
            .unwrap();
        graph
            .create_relationship(a.id, b.id, "DEPENDS_ON", None)
            .await
            .unwrap();

        let query = GraphQuery::start_by_id(a.id).traverse(crate::model::TraversalStep::new(
            "DEPENDS_ON",
            Direction::Outgoing,
        ));
        let rows = graph.execute_query(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn query_by_label_and_filter() {
        let graph = InMemoryGraph::new();
        let mut active = props("x");
        active.insert("status".into(), json!("active"));
        graph.create_node("WorkItem", active).await.unwrap();
        let mut draft = props("y");
        draft.insert("status".into(), json!("draft"));
        graph.create_node("WorkItem", draft).await.unwrap();

        let query = GraphQuery::start_by_label("WorkItem")
            .filter(crate::model::PropertyFilter::eq("status", "active"));
        let rows = graph.execute_query(&query).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
