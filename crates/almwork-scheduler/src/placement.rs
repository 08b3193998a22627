//! Deterministic list-scheduling placement: processes tasks in topological
//! order (so every predecessor already has a final start/end by the time a
//! task is placed) and, for each task, picks the earliest start that
//! satisfies its dependency constraints and doesn't push any required
//! resource's cumulative demand over capacity.
//!
//! This is a greedy heuristic, not an exact optimum, but it is deterministic
//! and respects every hard constraint — the conflict list that makes a
//! schedule *infeasible* is distinct from optimality, and this only
//! guarantees the former.

use std::collections::HashMap;

use uuid::Uuid;

use crate::model::{DependencyType, SchedulableTask, SchedulerResource};

#[derive(Debug, Clone, Copy)]
pub struct Placement {
    pub start: u32,
    pub end: u32,
}

/// A resource's already-committed intervals: (start, end, demand).
type Timeline = Vec<(u32, u32, u32)>;

fn max_overlap(timeline: &Timeline, window_start: u32, window_end: u32) -> u32 {
    let mut breakpoints: Vec<u32> = vec![window_start];
    for &(s, e, _) in timeline {
        if s > window_start && s < window_end {
            breakpoints.push(s);
        }
        if e > window_start && e < window_end {
            breakpoints.push(e);
        }
    }
    breakpoints
        .into_iter()
        .map(|bp| {
            timeline
                .iter()
                .filter(|&&(s, e, _)| s <= bp && bp < e)
                .map(|&(_, _, d)| d)
                .sum::<u32>()
        })
        .max()
        .unwrap_or(0)
}

fn earliest_feasible_start(
    not_before: u32,
    duration: u32,
    requirements: &[(u32, u32, &Timeline)], // (capacity, demand, timeline) per required resource
) -> u32 {
    if requirements.is_empty() {
        return not_before;
    }
    let mut candidates: Vec<u32> = vec![not_before];
    for (_, _, timeline) in requirements {
        for &(_, end, _) in timeline.iter() {
            if end > not_before {
                candidates.push(end);
            }
        }
    }
    candidates.sort_unstable();
    candidates.dedup();

    for candidate in candidates {
        let window_end = candidate + duration.max(1);
        let fits = requirements.iter().all(|(capacity, demand, timeline)| {
            max_overlap(timeline, candidate, window_end) + demand <= *capacity
        });
        if fits {
            return candidate;
        }
    }
    // Fallback: place after every committed interval for the needed resources.
    requirements
        .iter()
        .flat_map(|(_, _, timeline)| timeline.iter().map(|&(_, e, _)| e))
        .max()
        .unwrap_or(not_before)
        .max(not_before)
}

/// Places every task in `order`, returning each task's computed
/// (start, end) in hours-since-project-start.
pub fn place_all(
    tasks: &HashMap<Uuid, SchedulableTask>,
    resources: &HashMap<Uuid, SchedulerResource>,
    order: &[Uuid],
    earliest_start_hours: &HashMap<Uuid, u32>,
) -> HashMap<Uuid, Placement> {
    let mut placements: HashMap<Uuid, Placement> = HashMap::new();
    let mut resource_timelines: HashMap<Uuid, Timeline> = HashMap::new();

    for &task_id in order {
        let task = &tasks[&task_id];
        let mut not_before = earliest_start_hours.get(&task_id).copied().unwrap_or(0);

        for dep in &task.dependencies {
            let Some(pred) = placements.get(&dep.predecessor_id) else {
                continue; // dangling or not-yet-placed (dangling only, given topo order)
            };
            let lag = dep.lag;
            let bound = match dep.dependency_type {
                DependencyType::FinishToStart => add_lag(pred.end, lag),
                DependencyType::StartToStart => add_lag(pred.start, lag),
                DependencyType::FinishToFinish => {
                    add_lag(pred.end, lag).saturating_sub(task.estimated_hours)
                }
            };
            not_before = not_before.max(bound);
        }

        let requirements: Vec<(u32, u32, &Timeline)> = task
            .required_resources
            .iter()
            .filter_map(|rid| resources.get(rid).map(|r| (r, rid)))
            .map(|(resource, rid)| {
                let demand = task.demand_for(*rid);
                let timeline = resource_timelines.entry(*rid).or_default();
                (resource.capacity, demand, timeline as &Timeline)
            })
            .collect();

        let start = earliest_feasible_start(not_before, task.estimated_hours.max(1), &requirements);
        let end = start + task.estimated_hours.max(1);

        for rid in &task.required_resources {
            if resources.contains_key(rid) {
                let demand = task.demand_for(*rid);
                resource_timelines.entry(*rid).or_default().push((start, end, demand));
            }
        }

        placements.insert(task_id, Placement { start, end });
    }

    placements
}

fn add_lag(hours: u32, lag: i64) -> u32 {
    let signed = i64::from(hours) + lag;
    u32::try_from(signed.max(0)).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskDependency;

    fn resource(id: Uuid, capacity: u32) -> SchedulerResource {
        SchedulerResource { id, name: "r".into(), capacity, skills: vec![], lead: false }
    }

    fn task(id: Uuid, hours: u32, deps: Vec<TaskDependency>, resource: Option<Uuid>) -> SchedulableTask {
        SchedulableTask {
            id,
            title: id.to_string(),
            estimated_hours: hours,
            dependencies: deps,
            required_resources: resource.into_iter().collect(),
            resource_demand: HashMap::new(),
            earliest_start: None,
            deadline: None,
            skills_needed: vec![],
        }
    }

    #[test]
    fn independent_tasks_share_a_capacity_one_resource_sequentially() {
        let r = Uuid::new_v4();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tasks: HashMap<_, _> = [
            (a, task(a, 8, vec![], Some(r))),
            (b, task(b, 8, vec![], Some(r))),
        ]
        .into_iter()
        .collect();
        let resources: HashMap<_, _> = [(r, resource(r, 1))].into_iter().collect();
        let placements = place_all(&tasks, &resources, &[a, b], &HashMap::new());
        assert_eq!(placements[&a].start, 0);
        assert_eq!(placements[&b].start, 8);
    }

    #[test]
    fn finish_to_start_dependency_is_respected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let tasks: HashMap<_, _> = [
            (a, task(a, 8, vec![], None)),
            (
                b,
                task(
                    b,
                    4,
                    vec![TaskDependency { predecessor_id: a, dependency_type: DependencyType::FinishToStart, lag: 2 }],
                    None,
                ),
            ),
        ]
        .into_iter()
        .collect();
        let placements = place_all(&tasks, &HashMap::new(), &[a, b], &HashMap::new());
        assert_eq!(placements[&a].end, 8);
        assert_eq!(placements[&b].start, 10);
    }
}
