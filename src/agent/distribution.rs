//! Assign tasks to agents.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment<T> {
    pub assignee: String,
    pub task: T,
}

/// An agent's declared capacity and current load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLoad {
    pub id: String,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default)]
    pub load: usize,
}

fn default_capacity() -> usize {
    1
}

impl AgentLoad {
    pub fn new(id: impl Into<String>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            capacity,
            load: 0,
        }
    }

    fn effective_capacity(&self) -> u128 {
        self.capacity.max(1) as u128
    }

    /// Compare `load / capacity` exactly.
    fn utilization_cmp(&self, other: &Self) -> Ordering {
        let lhs = self.load as u128 * other.effective_capacity();
        let rhs = other.load as u128 * self.effective_capacity();
        lhs.cmp(&rhs)
    }
}

/// Task `i` goes to `agents[i % agents.len()]`.
pub fn round_robin<T>(agents: &[String], tasks: Vec<T>) -> Vec<Assignment<T>> {
    if agents.is_empty() {
        return Vec::new();
    }
    tasks
        .into_iter()
        .enumerate()
        .map(|(i, task)| Assignment {
            assignee: agents[i % agents.len()].clone(),
            task,
        })
        .collect()
}

/// Each task goes to the least utilized agent, whose load is then bumped.
///
/// Ties keep the order from the previous assignment step, starting from the
/// input order. Loads in `agents` are updated in place.
pub fn by_capacity<T>(agents: &mut [AgentLoad], tasks: Vec<T>) -> Vec<Assignment<T>> {
    if agents.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..agents.len()).collect();
    order.sort_by(|&a, &b| agents[a].utilization_cmp(&agents[b]));

    let mut assigned = Vec::with_capacity(tasks.len());
    for task in tasks {
        let agent = &mut agents[order[0]];
        assigned.push(Assignment {
            assignee: agent.id.clone(),
            task,
        });
        agent.load += 1;
        order.sort_by(|&a, &b| agents[a].utilization_cmp(&agents[b]));
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignees<T>(assigned: &[Assignment<T>]) -> Vec<&str> {
        assigned.iter().map(|a| a.assignee.as_str()).collect()
    }

    #[test]
    fn test_round_robin_wraps() {
        let agents = vec!["a".to_string(), "b".to_string()];
        let assigned = round_robin(&agents, vec![1, 2, 3]);
        assert_eq!(assignees(&assigned), ["a", "b", "a"]);
        assert_eq!(assigned[2].task, 3);
    }

    #[test]
    fn test_no_agents_assigns_nothing() {
        assert!(round_robin::<u8>(&[], vec![1, 2]).is_empty());
        assert!(by_capacity::<u8>(&mut [], vec![1, 2]).is_empty());
    }

    #[test]
    fn test_by_capacity_prefers_spare_capacity() {
        let mut agents = vec![AgentLoad::new("small", 1), AgentLoad::new("large", 3)];
        let assigned = by_capacity(&mut agents, vec!["t1", "t2", "t3", "t4"]);

        // small and large tie at 0; then large stays below small's 1/1 until 3/3.
        assert_eq!(assignees(&assigned), ["small", "large", "large", "large"]);
        assert_eq!(agents[0].load, 1);
        assert_eq!(agents[1].load, 3);
    }

    #[test]
    fn test_by_capacity_respects_existing_load_and_zero_capacity() {
        let mut agents = vec![
            AgentLoad {
                id: "busy".into(),
                capacity: 2,
                load: 2,
            },
            AgentLoad {
                id: "zero".into(),
                capacity: 0,
                load: 0,
            },
        ];
        let assigned = by_capacity(&mut agents, vec![(), (), ()]);
        // zero counts as capacity 1; after one task it ties busy and keeps its place.
        assert_eq!(assignees(&assigned), ["zero", "zero", "busy"]);
        assert_eq!(agents[1].load, 2);
    }
}
