//! Unit tests for the graph model

use super::*;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[test]
fn test_event_name_normalization() {
    let e = Event::from_words(&words(&["Set", "SPEED"]), None);
    assert_eq!(e.name, "setSpeed");

    let e = Event::from_words(&words(&["START"]), None);
    assert_eq!(e.name, "start");
}

#[test]
fn test_single_word_event_with_params_keeps_case() {
    let params = words(&["x"]);
    let e = Event::from_words(&words(&["setSpeed"]), Some(&params));
    assert_eq!(e.name, "setSpeed");
    assert_eq!(e.params, vec!["x"]);
}

#[test]
fn test_event_identity_ignores_params() {
    let a = Event {
        name: "go".to_string(),
        params: words(&["x"]),
    };
    let b = Event {
        name: "go".to_string(),
        params: Vec::new(),
    };
    assert_eq!(a, b);
}

#[test]
fn test_event_header_and_caller() {
    let e = Event {
        name: "setSpeed".to_string(),
        params: words(&["x", "y"]),
    };
    assert_eq!(e.header(), "void setSpeed(X const& x_, Y const& y_)");
    assert_eq!(e.caller("fsm"), "setSpeed(fsm.x, fsm.y)");
    assert_eq!(e.caller(""), "setSpeed(x, y)");
}

#[test]
fn test_transition_display_forward_and_reverse() {
    let tr = Transition {
        origin: "A".to_string(),
        destination: "B".to_string(),
        event: Event {
            name: "go".to_string(),
            params: Vec::new(),
        },
        guard: "x > 0".to_string(),
        action: "launch()".to_string(),
        arrow: "-->".to_string(),
    };
    assert_eq!(tr.to_string(), "A --> B : go [x > 0] / launch()");

    let reversed = Transition {
        arrow: "<-".to_string(),
        ..tr
    };
    assert_eq!(reversed.to_string(), "B <- A : go [x > 0] / launch()");
}

#[test]
fn test_transition_display_final_state_renders_as_initial_token() {
    let tr = Transition {
        origin: "A".to_string(),
        destination: FINAL_STATE.to_string(),
        arrow: "-->".to_string(),
        ..Transition::default()
    };
    assert_eq!(tr.to_string(), "A --> [*]");
}

#[test]
fn test_transition_display_flattens_multiline_action() {
    let tr = Transition {
        origin: "IDLE".to_string(),
        destination: "IDLE".to_string(),
        event: Event {
            name: "poll".to_string(),
            params: Vec::new(),
        },
        action: "// Dummy action\n#warning \"no reaction to event poll for internal transition IDLE -> IDLE\"\n".to_string(),
        arrow: "->".to_string(),
        ..Transition::default()
    };
    let rendered = tr.to_string();
    assert!(!rendered.contains('\n'));
    assert_eq!(
        rendered,
        "IDLE : on poll [] / // Dummy action #warning \"no reaction to event poll for internal transition IDLE -> IDLE\""
    );
}

#[test]
fn test_state_display_annotation_lines() {
    let mut s = State::new("IDLE");
    s.entering = "        resetCounters();\n".to_string();
    s.leaving = "        flush();\n".to_string();
    assert_eq!(
        s.to_string(),
        "IDLE : entering / resetCounters();\nIDLE : leaving / flush();"
    );
}

#[test]
fn test_add_state_is_idempotent() {
    let mut m = StateMachine::new("t");
    let a = m.add_state("A");
    let again = m.add_state("A");
    assert_eq!(a, again);
    assert_eq!(m.states().count(), 1);
}

#[test]
fn test_add_transition_creates_endpoints() {
    let mut m = StateMachine::new("t");
    m.add_transition(Transition {
        origin: "A".to_string(),
        destination: "B".to_string(),
        arrow: "->".to_string(),
        ..Transition::default()
    });
    assert!(m.contains_state("A"));
    assert!(m.contains_state("B"));
    assert!(m.transition("A", "B").is_some());
}

#[test]
fn test_repeated_edge_replaces_payload() {
    let mut m = StateMachine::new("t");
    m.add_transition(Transition {
        origin: "A".to_string(),
        destination: "B".to_string(),
        guard: "old".to_string(),
        arrow: "->".to_string(),
        ..Transition::default()
    });
    m.add_transition(Transition {
        origin: "A".to_string(),
        destination: "B".to_string(),
        guard: "new".to_string(),
        arrow: "->".to_string(),
        ..Transition::default()
    });
    assert_eq!(m.transitions().count(), 1);
    assert_eq!(m.transition("A", "B").unwrap().guard, "new");
}

#[test]
fn test_transitions_from_keeps_declaration_order() {
    let mut m = StateMachine::new("t");
    for dest in ["B", "C", "D"] {
        m.add_transition(Transition {
            origin: "A".to_string(),
            destination: dest.to_string(),
            arrow: "->".to_string(),
            ..Transition::default()
        });
    }
    assert_eq!(m.successors("A"), vec!["B", "C", "D"]);
}

#[test]
fn test_degree_queries() {
    let mut m = StateMachine::new("t");
    m.add_transition(Transition {
        origin: "A".to_string(),
        destination: "B".to_string(),
        arrow: "->".to_string(),
        ..Transition::default()
    });
    m.add_transition(Transition {
        origin: "C".to_string(),
        destination: "B".to_string(),
        arrow: "->".to_string(),
        ..Transition::default()
    });
    assert_eq!(m.in_degree("B"), 2);
    assert_eq!(m.out_degree("B"), 0);
    assert_eq!(m.out_degree("A"), 1);
    assert_eq!(m.in_degree("MISSING"), 0);
    assert_eq!(m.predecessors("B"), vec!["A", "C"]);
    assert!(m.predecessors("MISSING").is_empty());
}

#[test]
fn test_register_event_keeps_declaration_order() {
    let mut m = StateMachine::new("t");
    let go = Event {
        name: "go".to_string(),
        params: Vec::new(),
    };
    let stop = Event {
        name: "halt".to_string(),
        params: Vec::new(),
    };
    m.register_event(&go, "A", "B");
    m.register_event(&stop, "B", "A");
    m.register_event(&go, "C", "D");

    assert_eq!(m.dispatch.len(), 2);
    assert_eq!(m.dispatch[0].event.name, "go");
    assert_eq!(
        m.dispatch[0].arcs,
        vec![
            ("A".to_string(), "B".to_string()),
            ("C".to_string(), "D".to_string())
        ]
    );
    assert_eq!(m.dispatch[1].event.name, "halt");
}

#[test]
fn test_warn_appends() {
    let mut m = StateMachine::new("t");
    m.warn("first");
    m.warn("second");
    assert_eq!(m.warnings, vec!["first", "second"]);
}

#[test]
fn test_registry_iterates_in_discovery_order() {
    let mut reg = Registry::default();
    reg.insert(StateMachine::new("root"));
    reg.insert(StateMachine::new("child_b"));
    reg.insert(StateMachine::new("child_a"));

    let names: Vec<&str> = reg.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["root", "child_b", "child_a"]);
    assert_eq!(reg.root().unwrap().name, "root");
    assert_eq!(reg.len(), 3);
}

#[test]
fn test_registry_reinsert_keeps_position() {
    let mut reg = Registry::default();
    reg.insert(StateMachine::new("a"));
    reg.insert(StateMachine::new("b"));
    let mut replacement = StateMachine::new("a");
    replacement.class_name = "Fresh".to_string();
    reg.insert(replacement);

    let names: Vec<&str> = reg.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(reg.get("a").unwrap().class_name, "Fresh");
}
