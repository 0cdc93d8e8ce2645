//! Graph traversal algorithms shared by the verifier and the test
//! synthesizer. The machine is treated as a plain directed graph here.
//!
//! Cycle and simple-path enumeration is worst-case exponential in the number
//! of edges; callers cap the output through `testgen::Budget`.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::model::StateMachine;

/// Enumerate every simple cycle of the graph, each reported exactly once,
/// rooted at its smallest node index. A self-loop yields a length-1 cycle.
pub fn simple_cycles<N, E>(g: &DiGraph<N, E>) -> Vec<Vec<NodeIndex>> {
    let mut cycles = Vec::new();
    for start in g.node_indices() {
        let mut on_path = vec![false; g.node_count()];
        on_path[start.index()] = true;
        let mut path = vec![start];
        dfs_cycles(g, start, start, &mut path, &mut on_path, &mut cycles);
    }
    cycles
}

fn dfs_cycles<N, E>(
    g: &DiGraph<N, E>,
    start: NodeIndex,
    current: NodeIndex,
    path: &mut Vec<NodeIndex>,
    on_path: &mut [bool],
    cycles: &mut Vec<Vec<NodeIndex>>,
) {
    // Global edge order keeps the enumeration deterministic.
    let successors: Vec<NodeIndex> = g
        .edge_references()
        .filter(|e| e.source() == current)
        .map(|e| e.target())
        .collect();
    for next in successors {
        if next == start {
            cycles.push(path.clone());
        } else if next.index() > start.index() && !on_path[next.index()] {
            on_path[next.index()] = true;
            path.push(next);
            dfs_cycles(g, start, next, path, on_path, cycles);
            path.pop();
            on_path[next.index()] = false;
        }
    }
}

/// All simple cycles rotated so they begin at a direct successor of the
/// initial state, with the start state appended again to close the loop.
/// Cycles not touching any initial-state successor are unreachable from
/// machine start and dropped.
pub fn rotated_cycles(m: &StateMachine) -> Vec<Vec<String>> {
    if m.initial_state.is_empty() || !m.contains_state(&m.initial_state) {
        return Vec::new();
    }
    let entry_points: Vec<String> = m
        .successors(&m.initial_state)
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut out = Vec::new();
    for cycle in simple_cycles(m.graph()) {
        let names: Vec<&str> = cycle.iter().map(|&ix| m.graph()[ix].name.as_str()).collect();
        // The initial state may have several successors: rotate to the first
        // one that is a member of the cycle.
        let pivot = entry_points
            .iter()
            .find_map(|ep| names.iter().position(|n| n == ep));
        if let Some(i) = pivot {
            let mut rotated: Vec<String> = names[i..]
                .iter()
                .chain(names[..i].iter())
                .map(|s| (*s).to_string())
                .collect();
            rotated.push(rotated[0].clone());
            out.push(rotated);
        }
    }
    out
}

/// States with no incoming transition, node order.
pub fn source_states(m: &StateMachine) -> Vec<String> {
    m.states()
        .filter(|s| m.in_degree(&s.name) == 0)
        .map(|s| s.name.clone())
        .collect()
}

/// States with no outgoing transition, node order.
pub fn sink_states(m: &StateMachine) -> Vec<String> {
    m.states()
        .filter(|s| m.out_degree(&s.name) == 0)
        .map(|s| s.name.clone())
        .collect()
}
