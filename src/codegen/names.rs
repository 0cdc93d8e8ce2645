//! C++ identifier derivation shared by the elaborator and the emitters.

use crate::model::{FINAL_STATE, INITIAL_STATE};

/// Convert a raw diagram state name to its C++ enum name.
pub fn state_name(state: &str) -> &str {
    match state {
        INITIAL_STATE => "CONSTRUCTOR",
        FINAL_STATE => "DESTRUCTOR",
        other => other,
    }
}

/// Fully qualified enum value, e.g. `MotorStates::IDLE`.
pub fn state_enum(enum_name: &str, state: &str) -> String {
    format!("{enum_name}::{}", state_name(state))
}

fn prefixed(class: Option<&str>, name: String) -> String {
    match class {
        Some(class) => format!("{class}::{name}"),
        None => name,
    }
}

/// Guard method of a transition, e.g. `onGuarding_IDLE_RUNNING`.
pub fn guard_method(class: Option<&str>, origin: &str, destination: &str) -> String {
    prefixed(
        class,
        format!("onGuarding_{}_{}", state_name(origin), state_name(destination)),
    )
}

/// Action method of a transition, e.g. `onTransitioning_IDLE_RUNNING`.
pub fn action_method(class: Option<&str>, origin: &str, destination: &str) -> String {
    prefixed(
        class,
        format!(
            "onTransitioning_{}_{}",
            state_name(origin),
            state_name(destination)
        ),
    )
}

/// Entry hook of a state.
pub fn entering_method(class: Option<&str>, state: &str) -> String {
    prefixed(class, format!("onEntering_{}", state_name(state)))
}

/// Exit hook of a state.
pub fn leaving_method(class: Option<&str>, state: &str) -> String {
    prefixed(class, format!("onLeaving_{}", state_name(state)))
}

/// Internal event-less dispatch method of a state.
pub fn internal_method(class: Option<&str>, state: &str) -> String {
    prefixed(class, format!("onInternal_{}", state_name(state)))
}

/// Activity hook of a state.
pub fn activity_method(class: Option<&str>, state: &str) -> String {
    prefixed(class, format!("onActivity_{}", state_name(state)))
}

/// Member variable holding a nested machine instance.
pub fn child_instance(machine: &str) -> String {
    format!("m_nested_{}", machine.to_lowercase())
}
