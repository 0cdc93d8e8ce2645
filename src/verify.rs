//! Static verification passes.
//!
//! Read-only over the graph structure: every finding is appended to the
//! machine's warning list and surfaced in the generated code, but none of
//! them ever aborts translation. Only the shape of the transition set is
//! checked, never the semantics of guard expressions.

use crate::graph;
use crate::model::{StateMachine, INITIAL_STATE};

/// Run every pass on one machine.
pub fn verify(m: &mut StateMachine) {
    verify_initial_state(m);
    verify_number_of_events(m);
    verify_incoming_transitions(m);
    verify_transitions(m);
    verify_infinite_loops(m);
}

/// The main state machine shall declare an initial state.
///
/// Nested machines may start from any zero-in-degree state instead; the
/// stricter rule for them (at least one entering transition whose source is
/// not the machine itself) is deliberately not enforced, matching upstream.
pub fn verify_initial_state(m: &mut StateMachine) {
    if m.parent.is_none() && m.initial_state.is_empty() {
        m.warn("missing initial state in the main state machine");
    }
}

/// A machine where every transition is anonymous is likely mis-modeled.
pub fn verify_number_of_events(m: &mut StateMachine) {
    if m.dispatch.iter().any(|d| !d.event.name.is_empty()) {
        return;
    }
    m.warn("the state machine shall have at least one event");
}

/// Every state except the initial sentinel needs an incoming transition.
pub fn verify_incoming_transitions(m: &mut StateMachine) {
    let unreachable: Vec<String> = m
        .states()
        .filter(|s| s.name != INITIAL_STATE && m.predecessors(&s.name).is_empty())
        .map(|s| s.name.clone())
        .collect();
    for name in unreachable {
        m.warn(format!(
            "the state {name} shall have at least one incoming transition"
        ));
    }
}

/// Determinism, case 1: a state with several outgoing transitions where one
/// of them carries neither event nor guard. That transition is always true,
/// so the choice among siblings is non-deterministic.
///
/// Case 2 (a set of guards not covering all input values) is a known gap:
/// guard expressions are opaque and never interpreted.
pub fn verify_transitions(m: &mut StateMachine) {
    let mut findings = Vec::new();
    for state in m.states() {
        let out = m.transitions_from(&state.name);
        if out.len() <= 1 {
            continue;
        }
        for tr in out {
            if tr.event.is_anonymous() && tr.guard.is_empty() {
                findings.push(format!(
                    "the state {} has an issue with its transitions: the way to state {} \
                     is always true and will always be a candidate, so transitioning to \
                     the other states is non-deterministic",
                    state.name, tr.destination
                ));
            }
        }
    }
    for finding in findings {
        m.warn(finding);
    }
}

/// A cycle where no edge carries a named event can be traversed without any
/// external trigger. Self-loops are exempt: they come from "on event"
/// annotations and always carry an event by construction.
pub fn verify_infinite_loops(m: &mut StateMachine) {
    for cycle in graph::rotated_cycles(m) {
        if cycle.len() == 2 && cycle[0] == cycle[1] {
            continue;
        }
        let triggered = cycle.windows(2).any(|pair| {
            m.transition(&pair[0], &pair[1])
                .map(|tr| !tr.event.name.is_empty())
                .unwrap_or(false)
        });
        if !triggered {
            let sequence = cycle.join(" ");
            m.warn(format!(
                "the state machine has an infinite loop: {sequence}. Add an event!"
            ));
            return;
        }
    }
}
