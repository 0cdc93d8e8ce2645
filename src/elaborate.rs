//! Elaboration of event-less transitions.
//!
//! An event-less transition has no public method to trigger it, so it must
//! fire automatically when its source state is entered. For each such state
//! this pass synthesizes a chained conditional dispatch into the state's
//! `internal` field: candidates are tried in diagram-declaration order and
//! the first whose guard holds wins. Runs exactly once, after verification
//! and before any emitter.

use std::fmt::Write as _;

use crate::codegen::names;
use crate::model::StateMachine;

pub fn elaborate(m: &mut StateMachine) {
    let states: Vec<String> = m
        .states()
        .filter(|s| {
            m.transitions_from(&s.name)
                .iter()
                .any(|t| t.event.is_anonymous())
        })
        .map(|s| s.name.clone())
        .collect();

    for state in states {
        let (code, findings) = internal_dispatch(m, &state);
        for finding in findings {
            m.warn(finding);
        }
        if let Some(s) = m.state_mut(&state) {
            s.internal.push_str(&code);
        }
    }
}

/// Synthesize the dispatch block for one source state.
///
/// Guard-less candidates: the sole candidate fires unconditionally; a
/// guard-less candidate among several gets a missing-guard annotation, and
/// every guard-less candidate after the first is flagged non-deterministic,
/// naming both destinations.
fn internal_dispatch(m: &StateMachine, state: &str) -> (String, Vec<String>) {
    let candidates: Vec<_> = m
        .transitions_from(state)
        .into_iter()
        .filter(|t| t.event.is_anonymous())
        .collect();

    let mut code = String::new();
    let mut findings = Vec::new();
    let mut chained = false;
    let mut first_guardless: Option<String> = None;

    for tr in &candidates {
        if !tr.guard.is_empty() {
            let keyword = if chained { "        else if " } else { "        if " };
            // Plain call, never class-qualified: a qualified call would pin
            // the MOCKABLE guard to this class and skip any override.
            let _ = writeln!(
                code,
                "{keyword}({}())",
                names::guard_method(None, state, &tr.destination)
            );
            chained = true;
        } else {
            match &first_guardless {
                None => {
                    first_guardless = Some(tr.destination.clone());
                    if candidates.len() > 1 {
                        let _ = write!(
                            code,
                            "\n#warning \"Missformed state machine: missing guard from state {} to state {}\"\n        /* MISSING GUARD: if (guard) */\n",
                            state, tr.destination
                        );
                        findings.push(format!(
                            "missing guard on the internal transition from state {} to state {}",
                            state, tr.destination
                        ));
                    }
                }
                Some(first) => {
                    let _ = write!(
                        code,
                        "\n#warning \"Undeterminist state machine: in state {} the internal transition to state {} competes with the transition to state {}\"\n",
                        state, tr.destination, first
                    );
                    findings.push(format!(
                        "non-deterministic internal dispatch in state {}: transition to {} competes with transition to {}",
                        state, tr.destination, first
                    ));
                }
            }
            // A guard-less candidate emits a bare block, so the next guarded
            // candidate must open a fresh `if` rather than dangle an `else`.
            chained = false;
        }

        code.push_str("        {\n");
        let _ = writeln!(
            code,
            "            LOGD(\"[{}][STATE {}] Candidate for internal transitioning to state {}\\n\");",
            m.class_name.to_uppercase(),
            state,
            tr.destination
        );
        code.push_str("            static const Transition tr =\n            {\n");
        let _ = writeln!(
            code,
            "                .destination = {},",
            names::state_enum(&m.enum_name, &tr.destination)
        );
        if !tr.action.is_empty() {
            let _ = writeln!(
                code,
                "                .action = &{},",
                names::action_method(Some(&m.class_name), state, &tr.destination)
            );
        }
        code.push_str("            };\n            transition(&tr);\n        }\n");
    }

    (code, findings)
}
