//! Direction-aware cycle detection over a milestone `depends_on` adjacency
//! map, run client-side against data already fetched through the graph
//! executor rather than as a round-tripped graph query.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

/// True if adding an edge `from -> to` would close a cycle, i.e. `to` can
/// already reach `from` by following `edges` (or `from == to`).
#[must_use]
pub fn would_create_cycle(edges: &HashMap<Uuid, Vec<Uuid>>, from: Uuid, to: Uuid) -> bool {
    if from == to {
        return true;
    }
    let mut stack = vec![to];
    let mut seen = HashSet::new();
    while let Some(node) = stack.pop() {
        if node == from {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = edges.get(&node) {
            stack.extend(next.iter().copied());
        }
    }
    false
}

/// Checks both directions an edge could close a cycle in: the candidate
/// edge itself (`to` already reaches `from`), and the reverse (`from`
/// already reaches `to`, which the original's `_would_create_cycle` /
/// `_would_create_cycle_before` pair both independently query for).
#[must_use]
pub fn would_create_cycle_either_direction(
    edges: &HashMap<Uuid, Vec<Uuid>>,
    from: Uuid,
    to: Uuid,
) -> bool {
    would_create_cycle(edges, from, to) || would_create_cycle(edges, to, from)
}
