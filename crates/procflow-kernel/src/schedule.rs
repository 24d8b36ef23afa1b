//! Topological execution scheduling.
//!
//! Converts a process's step/connection set into a deterministic linear
//! execution order with Kahn's algorithm. Two properties are load-bearing
//! for callers:
//!
//! 1. **Deterministic ties** — the ready queue is seeded and drained in
//!    definition order, so independently-ready steps always execute in
//!    the order they appear in the process, not by id or label.
//! 2. **Best-effort on cycles** — steps that never reach in-degree 0 are
//!    appended after the queue drains, in definition order, instead of
//!    being dropped or raising an error. Every step appears exactly once
//!    and the function never fails, at the cost of cyclic steps running
//!    in a non-causal position.
//!
//! Pure function of its inputs; connection handles are ignored.

use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

use crate::process::{Connection, Step};

/// Order `steps` for execution according to `connections`.
///
/// Connections whose endpoints are not present in `steps` carry no
/// scheduling weight (they are a validation concern, not an ordering
/// one).
pub fn execution_order<'a>(steps: &'a [Step], connections: &[Connection]) -> Vec<&'a Step> {
    let index: HashMap<&str, usize> = steps
        .iter()
        .enumerate()
        .map(|(i, step)| (step.id.as_str(), i))
        .collect();

    let mut in_degree: HashMap<&str, usize> =
        steps.iter().map(|step| (step.id.as_str(), 0)).collect();
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();

    for connection in connections {
        if !index.contains_key(connection.source.as_str())
            || !index.contains_key(connection.target.as_str())
        {
            continue;
        }
        adjacency
            .entry(connection.source.as_str())
            .or_default()
            .push(connection.target.as_str());
        if let Some(degree) = in_degree.get_mut(connection.target.as_str()) {
            *degree += 1;
        }
    }

    // Seed with in-degree-0 steps in definition order; this is the
    // deterministic tie-break.
    let mut queue: VecDeque<&str> = steps
        .iter()
        .filter(|step| in_degree.get(step.id.as_str()) == Some(&0))
        .map(|step| step.id.as_str())
        .collect();

    let mut ordered: Vec<&'a Step> = Vec::with_capacity(steps.len());
    let mut placed: HashSet<&str> = HashSet::with_capacity(steps.len());

    while let Some(step_id) = queue.pop_front() {
        if !placed.insert(step_id) {
            continue;
        }
        if let Some(&i) = index.get(step_id) {
            ordered.push(&steps[i]);
        }

        if let Some(targets) = adjacency.get(step_id) {
            for &target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push_back(target);
                    }
                }
            }
        }
    }

    // Cycle leftovers: append in definition order so every step runs
    // exactly once. Callers must treat the result as best-effort for
    // cyclic graphs.
    if ordered.len() != steps.len() {
        warn!(
            leftover = steps.len() - ordered.len(),
            "process graph contains a cycle; appending unordered steps"
        );
        for step in steps {
            if !placed.contains(step.id.as_str()) {
                ordered.push(step);
            }
        }
    }

    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{StateMarkerConfig, StepKind};

    fn marker(id: &str) -> Step {
        Step::new(id, id.to_uppercase(), StepKind::StateMarker(StateMarkerConfig::default()))
    }

    fn ids(ordered: &[&Step]) -> Vec<String> {
        ordered.iter().map(|s| s.id.clone()).collect()
    }

    #[test]
    fn linear_chain_respects_edges() {
        let steps = vec![marker("c"), marker("a"), marker("b")];
        let connections = vec![
            Connection::new("e1", "a", "b"),
            Connection::new("e2", "b", "c"),
        ];

        let order = execution_order(&steps, &connections);
        assert_eq!(ids(&order), vec!["a", "b", "c"]);
    }

    #[test]
    fn ties_break_by_definition_order() {
        // b and a are both ready; b is defined first so b runs first.
        let steps = vec![marker("b"), marker("a"), marker("z")];
        let connections = vec![
            Connection::new("e1", "b", "z"),
            Connection::new("e2", "a", "z"),
        ];

        let order = execution_order(&steps, &connections);
        assert_eq!(ids(&order), vec!["b", "a", "z"]);
    }

    #[test]
    fn diamond_is_a_permutation_respecting_every_edge() {
        let steps = vec![marker("a"), marker("b"), marker("c"), marker("d")];
        let connections = vec![
            Connection::new("e1", "a", "b"),
            Connection::new("e2", "a", "c"),
            Connection::new("e3", "b", "d"),
            Connection::new("e4", "c", "d"),
        ];

        let order = execution_order(&steps, &connections);
        let ordered_ids = ids(&order);
        assert_eq!(ordered_ids.len(), 4);

        let pos = |id: &str| ordered_ids.iter().position(|x| x == id).unwrap();
        for (from, to) in [("a", "b"), ("a", "c"), ("b", "d"), ("c", "d")] {
            assert!(pos(from) < pos(to), "{from} must precede {to}");
        }
        // Tie between b and c goes to definition order.
        assert_eq!(ordered_ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn cycle_steps_are_appended_not_dropped() {
        // a <-> b cycle plus independent c: c leads the in-degree-0
        // front, the cyclic pair follows in definition order.
        let steps = vec![marker("a"), marker("b"), marker("c")];
        let connections = vec![
            Connection::new("e1", "a", "b"),
            Connection::new("e2", "b", "a"),
        ];

        let order = execution_order(&steps, &connections);
        assert_eq!(ids(&order), vec!["c", "a", "b"]);
    }

    #[test]
    fn self_loop_still_returns_the_step() {
        let steps = vec![marker("a")];
        let connections = vec![Connection::new("e1", "a", "a")];

        let order = execution_order(&steps, &connections);
        assert_eq!(ids(&order), vec!["a"]);
    }

    #[test]
    fn dangling_connections_carry_no_weight() {
        let steps = vec![marker("a"), marker("b")];
        let connections = vec![
            Connection::new("e1", "ghost", "b"),
            Connection::new("e2", "a", "ghost"),
        ];

        let order = execution_order(&steps, &connections);
        assert_eq!(ids(&order), vec!["a", "b"]);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let steps = vec![marker("x"), marker("y"), marker("z"), marker("w")];
        let connections = vec![
            Connection::new("e1", "x", "w"),
            Connection::new("e2", "y", "w"),
            Connection::new("e3", "z", "w"),
        ];

        let first = ids(&execution_order(&steps, &connections));
        for _ in 0..10 {
            assert_eq!(first, ids(&execution_order(&steps, &connections)));
        }
    }

    #[test]
    fn empty_input_yields_empty_order() {
        let order = execution_order(&[], &[]);
        assert!(order.is_empty());
    }
}
