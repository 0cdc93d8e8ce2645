//! Test synthesis.
//!
//! Enumerates cycle and source-to-sink scenarios over the elaborated graph
//! and computes the exact expected invocation count of every guard, action,
//! entry and exit hook for each scenario. The test-file emitter turns these
//! counts into mock expectations.

use std::collections::HashMap;

use petgraph::algo::all_simple_paths;

use crate::graph;
use crate::model::StateMachine;


/// Cap on scenario enumeration. Cycle and simple-path enumeration is
/// worst-case exponential; truncation is reported like any other warning
/// instead of hanging on densely connected graphs.
#[derive(Debug, Clone)]
pub struct Budget {
    /// Maximum number of scenarios kept per kind.
    pub max_scenarios: usize,
    /// Maximum number of intermediate states along one path.
    pub max_path_len: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_scenarios: 256,
            max_path_len: 64,
        }
    }
}

/// All scenarios of one machine.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSet {
    /// Rotated, closed cycles starting at an initial-state successor.
    pub cycles: Vec<Vec<String>>,
    /// Simple paths from every zero-in-degree state to every zero-out-degree
    /// state. Not restricted to the initial state: nested machines may have
    /// several legitimate entry points.
    pub paths: Vec<Vec<String>>,
    /// Set when the budget cut the enumeration short.
    pub truncated: bool,
}

pub fn enumerate_scenarios(m: &StateMachine, budget: &Budget) -> ScenarioSet {
    let mut set = ScenarioSet {
        cycles: graph::rotated_cycles(m),
        ..ScenarioSet::default()
    };
    if set.cycles.len() > budget.max_scenarios {
        set.cycles.truncate(budget.max_scenarios);
        set.truncated = true;
    }

    'outer: for sink in graph::sink_states(m) {
        for source in graph::source_states(m) {
            let (Some(s), Some(t)) = (m.node(&source), m.node(&sink)) else {
                continue;
            };
            for path in
                all_simple_paths::<Vec<_>, _>(m.graph(), s, t, 0, Some(budget.max_path_len))
            {
                if set.paths.len() >= budget.max_scenarios {
                    set.truncated = true;
                    break 'outer;
                }
                set.paths
                    .push(path.iter().map(|&ix| m.graph()[ix].name.clone()).collect());
            }
        }
    }

    if set.truncated {
        log::warn!(
            "state machine {}: scenario enumeration truncated at {} scenarios",
            m.name,
            budget.max_scenarios
        );
    }
    set
}

/// Expected mock-invocation counts of one scenario. Recomputed from scratch
/// for every scenario so nothing leaks between test cases.
#[derive(Debug, Clone, Default)]
pub struct HitCounts {
    guards: HashMap<(String, String), u32>,
    actions: HashMap<(String, String), u32>,
    entries: HashMap<String, u32>,
    exits: HashMap<String, u32>,
}

impl HitCounts {
    /// Walk consecutive state pairs of the sequence and accumulate hits.
    /// Self-loops never count as entering or leaving their state.
    pub fn count(m: &StateMachine, sequence: &[String]) -> Self {
        let mut counts = Self::default();
        for pair in sequence.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if let Some(tr) = m.transition(a, b) {
                if !tr.guard.is_empty() {
                    *counts.guards.entry((a.clone(), b.clone())).or_insert(0) += 1;
                }
                if !tr.action.is_empty() {
                    *counts.actions.entry((a.clone(), b.clone())).or_insert(0) += 1;
                }
            }
            if a != b {
                if m.state(a).is_some_and(|s| !s.leaving.is_empty()) {
                    *counts.exits.entry(a.clone()).or_insert(0) += 1;
                }
                if m.state(b).is_some_and(|s| !s.entering.is_empty()) {
                    *counts.entries.entry(b.clone()).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    pub fn guard_hits(&self, origin: &str, destination: &str) -> u32 {
        self.guards
            .get(&(origin.to_string(), destination.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn action_hits(&self, origin: &str, destination: &str) -> u32 {
        self.actions
            .get(&(origin.to_string(), destination.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn entry_hits(&self, state: &str) -> u32 {
        self.entries.get(state).copied().unwrap_or(0)
    }

    pub fn exit_hits(&self, state: &str) -> u32 {
        self.exits.get(state).copied().unwrap_or(0)
    }
}
