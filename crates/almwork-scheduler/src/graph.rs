//! Topological ordering and cycle detection over the dependency edges that
//! actually resolve to a known task (dangling edges are reported separately
//! as `missing_dependency` conflicts and otherwise ignored by the graph).

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::model::SchedulableTask;

/// Valid (predecessor, successor) pairs: both ids resolve to a task.
fn valid_edges(tasks: &[SchedulableTask]) -> Vec<(Uuid, Uuid)> {
    let known: HashSet<Uuid> = tasks.iter().map(|t| t.id).collect();
    tasks
        .iter()
        .flat_map(|t| {
            t.dependencies.iter().filter_map(move |dep| {
                known.contains(&dep.predecessor_id).then_some((dep.predecessor_id, t.id))
            })
        })
        .collect()
}

/// Depth-first cycle detection. Returns the ids participating in the first
/// cycle found, in traversal order, or `None` if the graph is acyclic.
pub fn find_cycle(tasks: &[SchedulableTask]) -> Option<Vec<Uuid>> {
    let edges = valid_edges(tasks);
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (from, to) in edges {
        adjacency.entry(from).or_default().push(to);
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<Uuid, Mark> = HashMap::new();
    let mut stack: Vec<Uuid> = Vec::new();

    fn visit(
        node: Uuid,
        adjacency: &HashMap<Uuid, Vec<Uuid>>,
        marks: &mut HashMap<Uuid, Mark>,
        stack: &mut Vec<Uuid>,
    ) -> Option<Vec<Uuid>> {
        if let Some(Mark::Done) = marks.get(&node) {
            return None;
        }
        if let Some(Mark::InProgress) = marks.get(&node) {
            let start = stack.iter().position(|id| *id == node).unwrap_or(0);
            let mut cycle = stack[start..].to_vec();
            cycle.push(node);
            return Some(cycle);
        }
        marks.insert(node, Mark::InProgress);
        stack.push(node);
        if let Some(children) = adjacency.get(&node) {
            for &child in children {
                if let Some(cycle) = visit(child, adjacency, marks, stack) {
                    return Some(cycle);
                }
            }
        }
        stack.pop();
        marks.insert(node, Mark::Done);
        None
    }

    let mut ids: Vec<Uuid> = tasks.iter().map(|t| t.id).collect();
    ids.sort();
    for id in ids {
        if let Some(cycle) = visit(id, &adjacency, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

/// Kahn's algorithm over the valid-edge subgraph. Assumes the caller has
/// already ruled out cycles; panics if one slips through (a logic error,
/// not a data error the caller should be handling here).
pub fn topological_order(tasks: &[SchedulableTask]) -> Vec<Uuid> {
    let mut in_degree: HashMap<Uuid, usize> = tasks.iter().map(|t| (t.id, 0)).collect();
    let mut adjacency: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (from, to) in valid_edges(tasks) {
        adjacency.entry(from).or_default().push(to);
        *in_degree.entry(to).or_insert(0) += 1;
    }

    let mut ready: Vec<Uuid> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(id, _)| *id)
        .collect();
    ready.sort();

    let mut order = Vec::with_capacity(tasks.len());
    let mut queue: std::collections::VecDeque<Uuid> = ready.into();
    while let Some(node) = queue.pop_front() {
        order.push(node);
        if let Some(children) = adjacency.get(&node) {
            let mut newly_ready = Vec::new();
            for &child in children {
                let entry = in_degree.get_mut(&child).expect("child tracked");
                *entry -= 1;
                if *entry == 0 {
                    newly_ready.push(child);
                }
            }
            newly_ready.sort();
            for child in newly_ready {
                queue.push_back(child);
            }
        }
    }

    assert_eq!(order.len(), tasks.len(), "topological_order called on a cyclic graph");
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyType, TaskDependency};
    use std::collections::HashMap as StdHashMap;

    fn task(id: Uuid, deps: &[Uuid]) -> SchedulableTask {
        SchedulableTask {
            id,
            title: id.to_string(),
            estimated_hours: 8,
            dependencies: deps
                .iter()
                .map(|&p| TaskDependency {
                    predecessor_id: p,
                    dependency_type: DependencyType::FinishToStart,
                    lag: 0,
                })
                .collect(),
            required_resources: vec![],
            resource_demand: StdHashMap::new(),
            earliest_start: None,
            deadline: None,
            skills_needed: vec![],
        }
    }

    #[test]
    fn detects_simple_cycle() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tasks = vec![task(a, &[b]), task(b, &[a])];
        assert!(find_cycle(&tasks).is_some());
    }

    #[test]
    fn acyclic_graph_has_no_cycle_and_orders_correctly() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let tasks = vec![task(a, &[]), task(b, &[a]), task(c, &[b])];
        assert!(find_cycle(&tasks).is_none());
        let order = topological_order(&tasks);
        assert_eq!(order, vec![a, b, c]);
    }

    #[test]
    fn dangling_dependency_is_ignored_by_the_graph() {
        let a = Uuid::new_v4();
        let ghost = Uuid::new_v4();
        let tasks = vec![task(a, &[ghost])];
        assert!(find_cycle(&tasks).is_none());
        assert_eq!(topological_order(&tasks), vec![a]);
    }
}
