//! Longest path through the task dependency DAG, weighted by
//! `estimated_hours`. Used to flag `is_critical` tasks in the output
//! schedule.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::SchedulableTask;

/// Returns the ids on the critical path, in execution order.
pub fn critical_path(tasks: &HashMap<Uuid, SchedulableTask>, topo_order: &[Uuid]) -> Vec<Uuid> {
    let known: std::collections::HashSet<Uuid> = tasks.keys().copied().collect();
    let mut longest: HashMap<Uuid, u32> = HashMap::new();
    let mut predecessor: HashMap<Uuid, Uuid> = HashMap::new();

    for &id in topo_order {
        let task = &tasks[&id];
        let mut best = 0u32;
        let mut best_pred = None;
        for dep in &task.dependencies {
            if !known.contains(&dep.predecessor_id) {
                continue;
            }
            let candidate = longest.get(&dep.predecessor_id).copied().unwrap_or(0);
            if candidate >= best {
                best = candidate;
                best_pred = Some(dep.predecessor_id);
            }
        }
        longest.insert(id, best + task.estimated_hours.max(1));
        if let Some(pred) = best_pred {
            predecessor.insert(id, pred);
        }
    }

    let Some(&end) = topo_order
        .iter()
        .max_by_key(|id| (longest.get(*id).copied().unwrap_or(0), std::cmp::Reverse(**id)))
    else {
        return Vec::new();
    };

    let mut path = vec![end];
    let mut current = end;
    while let Some(&pred) = predecessor.get(&current) {
        path.push(pred);
        current = pred;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::topological_order;
    use crate::model::{DependencyType, TaskDependency};

    fn task(id: Uuid, hours: u32, deps: &[Uuid]) -> SchedulableTask {
        SchedulableTask {
            id,
            title: id.to_string(),
            estimated_hours: hours,
            dependencies: deps
                .iter()
                .map(|&p| TaskDependency { predecessor_id: p, dependency_type: DependencyType::FinishToStart, lag: 0 })
                .collect(),
            required_resources: vec![],
            resource_demand: HashMap::new(),
            earliest_start: None,
            deadline: None,
            skills_needed: vec![],
        }
    }

    #[test]
    fn diamond_picks_the_longer_branch() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let d = Uuid::new_v4();
        let list = vec![task(a, 8, &[]), task(b, 16, &[a]), task(c, 8, &[a]), task(d, 8, &[b, c])];
        let tasks: HashMap<Uuid, SchedulableTask> = list.iter().cloned().map(|t| (t.id, t)).collect();
        let order = topological_order(&list);
        let path = critical_path(&tasks, &order);
        assert_eq!(path, vec![a, b, d]);
    }
}
