use log::{debug, trace};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::error::{RcpspError, Result};
use crate::instance::Instance;

type Graph = DiGraph<usize, ()>;
type NodeId = NodeIndex;

/// Start time window of every activity.
///
/// `latest_start` is signed: a horizon shorter than the slowest remaining path
/// leaves no room and yields negative values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bounds {
    earliest_start: Vec<u32>,
    latest_start: Vec<i64>,
}

impl Bounds {
    pub fn earliest_start(&self, activity: usize) -> u32 {
        self.earliest_start[activity]
    }

    pub fn latest_start(&self, activity: usize) -> i64 {
        self.latest_start[activity]
    }

    pub fn earliest_starts(&self) -> &[u32] {
        &self.earliest_start
    }

    pub fn latest_starts(&self) -> &[i64] {
        &self.latest_start
    }

    pub fn slack(&self, activity: usize) -> i64 {
        self.latest_start[activity] - self.earliest_start[activity] as i64
    }

    /// Every window is non-empty
    pub fn is_consistent(&self) -> bool {
        (0..self.earliest_start.len()).all(|activity| self.slack(activity) >= 0)
    }
}

pub struct PrecedenceGraph<'a> {
    graph: Graph,
    order: Vec<NodeId>,
    pub instance: &'a Instance,
}

impl<'a> PrecedenceGraph<'a> {
    pub fn new(instance: &'a Instance) -> Result<Self> {
        let mut graph = Graph::with_capacity(instance.activities(), instance.precedences().len());

        let nodes: Vec<NodeId> = (0..instance.activities())
            .map(|activity| graph.add_node(activity))
            .collect();

        for &(i, j) in instance.precedences() {
            graph.add_edge(nodes[i], nodes[j], ());
        }

        let order = algo::toposort(&graph, None).map_err(|cycle| RcpspError::CyclicPrecedence {
            activity: graph[cycle.node_id()],
        })?;

        trace!(
            "topological order: {:?}",
            order.iter().map(|&node| graph[node]).collect::<Vec<_>>()
        );

        Ok(Self {
            graph,
            order,
            instance,
        })
    }

    /// Activities in an order compatible with all precedence relations
    pub fn topological_order(&self) -> Vec<usize> {
        self.order.iter().map(|&node| self.graph[node]).collect()
    }

    /// Forward pass: longest path from the source using the fastest mode of
    /// every predecessor.
    pub fn earliest_starts(&self) -> Vec<u32> {
        let mut earliest = vec![0_u32; self.instance.activities()];

        for &node in &self.order {
            let activity = self.graph[node];

            let start = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|predecessor| {
                    let predecessor = self.graph[predecessor];
                    earliest[predecessor].saturating_add(self.instance.min_duration(predecessor))
                })
                .max()
                .unwrap_or(0);

            earliest[activity] = start;
        }

        earliest
    }

    /// Backward pass: the horizon minus the longest path to the sink using the
    /// slowest mode of the activity itself and of every activity after it.
    pub fn latest_starts(&self) -> Vec<i64> {
        let mut remaining = vec![0_i64; self.instance.activities()];

        for &node in self.order.iter().rev() {
            let activity = self.graph[node];

            let tail = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(|successor| remaining[self.graph[successor]])
                .max()
                .unwrap_or(0);

            remaining[activity] = self.instance.max_duration(activity) as i64 + tail;
        }

        let horizon = self.instance.horizon() as i64;
        remaining.into_iter().map(|tail| horizon - tail).collect()
    }

    pub fn compute_bounds(&self) -> Bounds {
        let bounds = Bounds {
            earliest_start: self.earliest_starts(),
            latest_start: self.latest_starts(),
        };

        debug!("earliest starts: {:?}", bounds.earliest_start);
        debug!("latest starts: {:?}", bounds.latest_start);

        bounds
    }

    /// Find the lower bound of the makespan, the critical path with the
    /// fastest modes
    pub fn compute_lower_bound(&self) -> u32 {
        self.earliest_starts()[self.instance.sink()]
    }

    /// Compute the upper bound of the makespan by accumulating all slowest
    /// durations
    pub fn compute_upper_bound(&self) -> u64 {
        (0..self.instance.activities())
            .map(|activity| self.instance.max_duration(activity) as u64)
            .sum()
    }
}

pub fn estimate_bounds(instance: &Instance) -> Result<Bounds> {
    Ok(PrecedenceGraph::new(instance)?.compute_bounds())
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use crate::error::RcpspError;
    use crate::testing::{build, chain_instance, linked_instance, random_instance};

    use super::{estimate_bounds, PrecedenceGraph};

    #[test]
    fn chain_bounds() {
        let instance = chain_instance();

        let bounds = estimate_bounds(&instance).unwrap();
        assert_eq!(bounds.earliest_starts(), &[0, 0, 3]);
        assert_eq!(bounds.latest_starts(), &[3, 3, 6]);
        assert!(bounds.is_consistent());
    }

    #[test]
    fn linked_bounds() {
        let bounds = estimate_bounds(&linked_instance()).unwrap();

        assert_eq!(bounds.earliest_starts(), &[0, 0, 0, 2]);
        assert_eq!(bounds.latest_starts(), &[3, 4, 3, 6]);
        assert_eq!(bounds.slack(2), 3);
    }

    #[test]
    fn hand_computed_critical_path_with_unsorted_numbering() {
        // 0 -> 4 -> 2 -> 1 -> 5 and 0 -> 3 -> {2, 5}
        let instance = build(
            12,
            &[1],
            &[(0, 4), (0, 3), (4, 2), (3, 2), (2, 1), (1, 5), (3, 5)],
            &[&[0, 0], &[2, 2], &[3, 4], &[1, 1], &[2, 5], &[0, 0]],
            &[],
            &[&[&[0], &[0]], &[&[1], &[1]], &[&[1], &[0]], &[&[0], &[1]], &[&[1], &[1]], &[&[0], &[0]]],
        );

        let graph = PrecedenceGraph::new(&instance).unwrap();
        assert_eq!(graph.earliest_starts(), vec![0, 5, 2, 0, 0, 7]);
        assert_eq!(graph.latest_starts(), vec![1, 10, 6, 5, 1, 12]);
        assert_eq!(graph.compute_lower_bound(), 7);
        assert_eq!(graph.compute_upper_bound(), 12);

        let order = graph.topological_order();
        let position = |activity: usize| order.iter().position(|&a| a == activity).unwrap();
        for &(i, j) in instance.precedences() {
            assert!(position(i) < position(j));
        }
    }

    #[test]
    fn short_horizon_gives_inconsistent_windows() {
        let instance = build(
            2,
            &[1],
            &[(0, 1), (1, 2)],
            &[&[0], &[3], &[0]],
            &[],
            &[&[&[0]], &[&[1]], &[&[0]]],
        );

        let bounds = estimate_bounds(&instance).unwrap();
        assert_eq!(bounds.latest_start(1), -1);
        assert!(!bounds.is_consistent());
    }

    #[test]
    fn cycle_is_detected() {
        let instance = build(
            10,
            &[1],
            &[(0, 1), (1, 2), (2, 1), (2, 3)],
            &[&[0], &[1], &[1], &[0]],
            &[],
            &[&[&[0]], &[&[1]], &[&[1]], &[&[0]]],
        );

        match estimate_bounds(&instance) {
            Err(RcpspError::CyclicPrecedence { activity }) => assert!(activity == 1 || activity == 2),
            other => panic!("expected a cycle, got {other:?}"),
        }
    }

    #[test]
    fn random_instances_have_consistent_windows() {
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..50 {
            let activities = rng.gen_range(3..12);
            let instance = random_instance(rng.gen(), activities, 2, 2);

            let bounds = estimate_bounds(&instance).unwrap();
            assert!(bounds.is_consistent(), "{instance:?} {bounds:?}");
            assert_eq!(bounds.earliest_start(instance.source()), 0);

            for &(i, j) in instance.precedences() {
                assert!(
                    bounds.earliest_start(i) + instance.min_duration(i) <= bounds.earliest_start(j)
                );
                assert!(
                    bounds.latest_start(i) + instance.max_duration(i) as i64 <= bounds.latest_start(j)
                );
            }
        }
    }
}
