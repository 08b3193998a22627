use serde_json::{Map, Value};
use uuid::Uuid;

/// A labelled node with arbitrary JSON properties. `id` is always present
/// in `props` as well as the struct field, mirroring how a real graph
/// database returns it in a row.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: Uuid,
    pub label: String,
    pub props: Map<String, Value>,
}

/// A relationship instance between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: Uuid,
    pub to: Uuid,
    pub rel_type: String,
    pub props: Map<String, Value>,
}

/// One row of an `execute_query` result: a flat property map, matching what
/// a Cypher-like `RETURN` clause would hand back.
pub type QueryRow = Map<String, Value>;

/// Traversal direction relative to the current node(s) in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
    Either,
}

/// Comparison applied by a [`PropertyFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// A single `WHERE key <op> value` predicate, evaluated against a node's or
/// edge's `props` map. This, plus [`QueryStart`]/[`TraversalStep`], is the
/// entire query surface: there is no string fragment anywhere that could
/// embed unescaped user input.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    pub key: String,
    pub op: FilterOp,
    pub value: Value,
}

impl PropertyFilter {
    #[must_use]
    pub fn eq(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    #[must_use]
    pub fn matches(&self, props: &Map<String, Value>) -> bool {
        let Some(actual) = props.get(&self.key) else {
            return false;
        };
        match self.op {
            FilterOp::Eq => actual == &self.value,
            FilterOp::Ne => actual != &self.value,
            FilterOp::Gt | FilterOp::Lt | FilterOp::Gte | FilterOp::Lte => {
                let (Some(a), Some(b)) = (actual.as_f64(), self.value.as_f64()) else {
                    return false;
                };
                match self.op {
                    FilterOp::Gt => a > b,
                    FilterOp::Lt => a < b,
                    FilterOp::Gte => a >= b,
                    FilterOp::Lte => a <= b,
                    FilterOp::Eq | FilterOp::Ne => unreachable!(),
                }
            }
        }
    }
}

/// Where a query's traversal begins.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryStart {
    ById(Uuid),
    ByLabel(String),
}

/// One hop of a multi-step traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct TraversalStep {
    pub rel_type: Option<String>,
    pub direction: Direction,
    pub target_label: Option<String>,
    pub filters: Vec<PropertyFilter>,
}

impl TraversalStep {
    #[must_use]
    pub fn new(rel_type: impl Into<String>, direction: Direction) -> Self {
        Self {
            rel_type: Some(rel_type.into()),
            direction,
            target_label: None,
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn target_label(mut self, label: impl Into<String>) -> Self {
        self.target_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: PropertyFilter) -> Self {
        self.filters.push(filter);
        self
    }
}

/// A parameterized graph query: start node(s), zero or more traversal hops,
/// filters on the final node set, and an optional row cap.
///
/// Every value embedded here is a typed [`serde_json::Value`], never a
/// formatted string fragment — this is what makes queries "parameterized by
/// construction" regardless of backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphQuery {
    pub start: Option<QueryStart>,
    pub traversals: Vec<TraversalStep>,
    pub filters: Vec<PropertyFilter>,
    pub limit: Option<usize>,
}

impl GraphQuery {
    #[must_use]
    pub fn start_by_id(id: Uuid) -> Self {
        Self {
            start: Some(QueryStart::ById(id)),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn start_by_label(label: impl Into<String>) -> Self {
        Self {
            start: Some(QueryStart::ByLabel(label.into())),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn traverse(mut self, step: TraversalStep) -> Self {
        self.traversals.push(step);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: PropertyFilter) -> Self {
        self.filters.push(filter);
        self
    }

    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }
}
