//! C++ class emitter.
//!
//! Renders one self-contained C++ class per machine on top of the runtime
//! `StateMachine` base class. The emitter only reads the elaborated model;
//! every warning accumulated upstream lands here as a `#warning` line so a
//! suspicious diagram still compiles loudly.

use std::fmt::Write as _;

use crate::model::{Registry, StateMachine, INITIAL_STATE};
use crate::tables;

pub mod names;
pub mod testwriter;
pub mod uml;

/// Flavor of the generated class file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    /// One `.cpp` file per machine.
    Source,
    /// One `.hpp` file per machine, with include guards.
    Header,
}

impl Flavor {
    pub fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "cpp" => Some(Self::Source),
            "hpp" | "h" | "hh" | "hxx" => Some(Self::Header),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Source => "cpp",
            Self::Header => "hpp",
        }
    }
}

/// Generated-file banner shared by class and test files.
pub(crate) fn banner(out: &mut String, diagram: &str) {
    let _ = writeln!(
        out,
        "// This file has been generated from the PlantUML statechart {diagram}"
    );
    out.push_str(
        "// This code generation is still experimental. Some border cases may not be correctly managed!\n\n",
    );
}

pub(crate) fn line_separator(out: &mut String, spaces: usize, width: usize, c: char) {
    for _ in 0..spaces {
        out.push(' ');
    }
    out.push_str("//");
    for _ in 0..width {
        out.push(c);
    }
    out.push('\n');
}

/// A `//! \brief` comment framed by separator lines sized to its content.
fn comment_block(out: &mut String, spaces: usize, comment: &str, c: char) {
    let mut text = String::from("//! \\brief");
    if !comment.is_empty() {
        text.push(' ');
        text.push_str(comment);
    }
    let longest = text.lines().map(str::len).max().unwrap_or(0);
    let width = longest.max(80) - spaces;
    line_separator(out, spaces, width, c);
    for _ in 0..spaces {
        out.push(' ');
    }
    out.push_str(&text);
    out.push('\n');
    line_separator(out, spaces, width, c);
}

pub(crate) fn function_comment(out: &mut String, comment: &str) {
    comment_block(out, 0, comment, '*');
}

pub(crate) fn method_comment(out: &mut String, comment: &str) {
    comment_block(out, 4, comment, '-');
}

/// Render the whole class file of one machine.
pub fn render_class(machines: &Registry, m: &StateMachine, flavor: Flavor, diagram: &str) -> String {
    let mut out = String::new();
    render_file_header(machines, m, flavor, diagram, &mut out);
    render_state_enums(m, &mut out);
    render_stringify(m, &mut out);
    render_machine_class(machines, m, &mut out);
    out.push_str(&m.extra.footer);
    if flavor == Flavor::Header {
        let _ = write!(out, "#endif // {}_HPP", m.class_name.to_uppercase());
    }
    out
}

fn child_class_name(machines: &Registry, child: &str) -> String {
    machines
        .get(child)
        .map(|c| c.class_name.clone())
        .unwrap_or_else(|| format!("Nested{child}"))
}

fn include(out: &mut String, hpp: bool, file: &str) {
    let pad = if hpp { "  " } else { "" };
    let _ = writeln!(out, "#{pad}include \"{file}\"");
}

fn render_file_header(
    machines: &Registry,
    m: &StateMachine,
    flavor: Flavor,
    diagram: &str,
    out: &mut String,
) {
    let hpp = flavor == Flavor::Header;
    banner(out, diagram);
    if hpp {
        let _ = writeln!(out, "#ifndef {}_HPP", m.class_name.to_uppercase());
        let _ = writeln!(out, "#  define {}_HPP\n", m.class_name.to_uppercase());
    }
    for child in &m.children {
        include(out, hpp, &format!("{}.hpp", child_class_name(machines, child)));
    }
    if m.children.is_empty() {
        include(out, hpp, "StateMachine.hpp");
    }
    for w in &m.warnings {
        let _ = write!(out, "\n#warning \"{w}\"\n");
    }
    out.push_str(&m.extra.header);
    out.push('\n');
}

fn render_state_enums(m: &StateMachine, out: &mut String) {
    function_comment(out, "States of the state machine.");
    let _ = writeln!(out, "enum class {}\n{{", m.enum_name);
    out.push_str("    // Client states:\n");
    for state in m.states() {
        let _ = write!(out, "    {},", names::state_name(&state.name));
        if !state.comment.is_empty() {
            let _ = write!(out, " //!< {}", state.comment);
        }
        out.push('\n');
    }
    out.push_str("    // Mandatory internal states:\n");
    out.push_str("    IGNORING_EVENT, CANNOT_HAPPEN, MAX_STATES\n};\n\n");
}

fn render_stringify(m: &StateMachine, out: &mut String) {
    function_comment(out, "Convert enum states to human readable string.");
    let _ = writeln!(
        out,
        "static inline const char* stringify({} const state)\n{{",
        m.enum_name
    );
    out.push_str("    static const char* s_states[] =\n    {\n");
    for state in m.states() {
        let _ = writeln!(
            out,
            "        [int({})] = \"{}\",",
            names::state_enum(&m.enum_name, &state.name),
            state.name
        );
    }
    out.push_str("    };\n\n    return s_states[int(state)];\n};\n\n");
}

fn render_class_comment(m: &StateMachine, out: &mut String) {
    let mut comment = if m.extra.brief.is_empty() {
        "State machine concrete implementation.".to_string()
    } else {
        m.extra.brief.clone()
    };
    comment.push_str("\n//! \\startuml\n");
    comment.push_str(&uml::diagram_body(m, "//! "));
    comment.push_str("//! \\enduml");
    function_comment(out, &comment);
}

fn render_machine_class(machines: &Registry, m: &StateMachine, out: &mut String) {
    render_class_comment(m, out);
    let _ = writeln!(
        out,
        "class {} : public StateMachine<{}, {}>",
        m.class_name, m.class_name, m.enum_name
    );
    out.push_str("{\npublic: // Constructor and destructor\n\n");
    render_constructor(m, out);
    render_destructor(m, out);
    render_enter(m, out);
    render_exit(m, out);
    out.push_str("public: // External events\n\n");
    render_events(m, out);
    out.push_str("private: // Guards and actions on transitions\n\n");
    render_transition_methods(m, out);
    out.push_str("private: // Actions on states\n\n");
    render_state_methods(m, out);
    out.push_str("private: // Nested state machines\n\n");
    for child in &m.children {
        let _ = writeln!(
            out,
            "    {} {};",
            child_class_name(machines, child),
            names::child_instance(child)
        );
    }
    out.push_str("private: // Data events\n\n");
    for dispatch in &m.dispatch {
        for param in &dispatch.event.params {
            let _ = writeln!(out, "    //! \\brief Data for event {}", dispatch.event.name);
            let _ = writeln!(out, "    {} {};", param.to_uppercase(), param);
        }
    }
    out.push_str("\nprivate: // Client code\n\n");
    out.push_str(&m.extra.code);
    out.push_str("};\n\n");
}

/// The sparse table binding states to their entry/exit/internal callbacks.
/// Only states carrying at least one callback get a row.
fn render_state_table(m: &StateMachine, out: &mut String) {
    for state in m.states() {
        if state.name == INITIAL_STATE {
            continue;
        }
        if state.entering.is_empty() && state.leaving.is_empty() && state.internal.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            "        m_states[int({})] =",
            names::state_enum(&m.enum_name, &state.name)
        );
        out.push_str("        {\n");
        if !state.leaving.is_empty() {
            let _ = writeln!(
                out,
                "            .leaving = &{},",
                names::leaving_method(Some(&m.class_name), &state.name)
            );
        }
        if !state.entering.is_empty() {
            let _ = writeln!(
                out,
                "            .entering = &{},",
                names::entering_method(Some(&m.class_name), &state.name)
            );
        }
        if !state.internal.is_empty() {
            let _ = writeln!(
                out,
                "            .internal = &{},",
                names::internal_method(Some(&m.class_name), &state.name)
            );
        }
        if !state.activity.is_empty() {
            let _ = writeln!(
                out,
                "            .activity = &{},",
                names::activity_method(Some(&m.class_name), &state.name)
            );
        }
        out.push_str("        };\n");
    }
}

fn render_constructor(m: &StateMachine, out: &mut String) {
    method_comment(
        out,
        "Default constructor. Start from initial state and call it actions.",
    );
    let _ = writeln!(out, "    {}({})", m.class_name, m.extra.argvs);
    let _ = writeln!(
        out,
        "        : StateMachine({}){}",
        names::state_enum(&m.enum_name, &m.initial_state),
        m.extra.cons
    );
    out.push_str("    {\n        // Init actions on states\n");
    render_state_table(m, out);
    out.push_str("\n        // Init user code\n");
    out.push_str(&m.extra.init);
    out.push_str("    }\n\n");
}

fn render_destructor(m: &StateMachine, out: &mut String) {
    out.push_str("#if defined(MOCKABLE)\n");
    method_comment(out, "Needed because of virtual methods.");
    let _ = writeln!(out, "    virtual ~{}() = default;", m.class_name);
    out.push_str("#endif\n\n");
}

fn render_enter(m: &StateMachine, out: &mut String) {
    method_comment(
        out,
        "Reset the state machine and nested machines. Do the initial internal transition.",
    );
    out.push_str("    void enter()\n    {\n");
    out.push_str("        StateMachine::enter();\n");
    for child in &m.children {
        let _ = writeln!(out, "        {}.enter();", names::child_instance(child));
    }
    if !m.extra.init.is_empty() {
        out.push_str("\n        // Init user code\n");
        out.push_str(&m.extra.init);
    }
    if let Some(initial) = m.state(INITIAL_STATE) {
        if !initial.internal.is_empty() {
            out.push_str("\n        // Internal transition\n");
            out.push_str(&initial.internal);
        }
    }
    out.push_str("    }\n\n");
}

fn render_exit(m: &StateMachine, out: &mut String) {
    method_comment(out, "Reset the state machine and nested machines.");
    out.push_str("    void exit()\n    {\n");
    out.push_str("        StateMachine::exit();\n");
    for child in &m.children {
        let _ = writeln!(out, "        {}.exit();", names::child_instance(child));
    }
    out.push_str("    }\n\n");
}

fn render_events(m: &StateMachine, out: &mut String) {
    // The root forwards external events declared inside nested machines.
    for (child, event) in &m.broadcasts {
        method_comment(out, "Broadcast external event.");
        let _ = writeln!(
            out,
            "    inline {} {{ {}.{}; }}\n",
            event.header(),
            names::child_instance(child),
            event.caller("")
        );
    }
    for table in tables::event_tables(m) {
        method_comment(out, "External event.");
        let _ = writeln!(out, "    {}", table.event.header());
        out.push_str("    {\n");
        let _ = writeln!(
            out,
            "        LOGD(\"[{}][EVENT %s]\\n\", __func__);\n",
            m.class_name.to_uppercase()
        );
        for param in &table.event.params {
            let _ = writeln!(out, "        {param} = {param}_;\n");
        }
        out.push_str("        // State transition and actions\n");
        out.push_str("        static const Transitions s_transitions =\n        {\n");
        for row in &table.rows {
            out.push_str("            {\n");
            let _ = writeln!(
                out,
                "                {},",
                names::state_enum(&m.enum_name, &row.origin)
            );
            out.push_str("                {\n");
            let _ = writeln!(
                out,
                "                    .destination = {},",
                names::state_enum(&m.enum_name, &row.destination)
            );
            if row.guard.is_some() {
                let _ = writeln!(
                    out,
                    "                    .guard = &{},",
                    names::guard_method(Some(&m.class_name), &row.origin, &row.destination)
                );
            }
            if row.action.is_some() {
                let _ = writeln!(
                    out,
                    "                    .action = &{},",
                    names::action_method(Some(&m.class_name), &row.origin, &row.destination)
                );
            }
            out.push_str("                },\n");
            out.push_str("            },\n");
        }
        out.push_str("        };\n\n");
        out.push_str("        transition(s_transitions);\n    }\n\n");
    }
}

fn render_transition_methods(m: &StateMachine, out: &mut String) {
    let class = m.class_name.to_uppercase();
    for tr in m.transitions() {
        if !tr.guard.is_empty() {
            method_comment(
                out,
                &format!(
                    "Guard the transition from state {} to state {}.",
                    tr.origin, tr.destination
                ),
            );
            let _ = writeln!(
                out,
                "    MOCKABLE bool {}()",
                names::guard_method(None, &tr.origin, &tr.destination)
            );
            out.push_str("    {\n");
            let _ = writeln!(out, "        const bool guard = ({});", tr.guard);
            let _ = writeln!(
                out,
                "        LOGD(\"[{}][GUARD {} --> {}: {}] result: %s\\n\",",
                class, tr.origin, tr.destination, tr.guard
            );
            out.push_str("            (guard ? \"true\" : \"false\"));\n");
            out.push_str("        return guard;\n    }\n\n");
        }
        if !tr.action.is_empty() {
            method_comment(
                out,
                &format!(
                    "Do the action when transitioning from state {} to state {}.",
                    tr.origin, tr.destination
                ),
            );
            let _ = writeln!(
                out,
                "    MOCKABLE void {}()",
                names::action_method(None, &tr.origin, &tr.destination)
            );
            out.push_str("    {\n");
            let _ = write!(
                out,
                "        LOGD(\"[{}][TRANSITION {} --> {}",
                class, tr.origin, tr.destination
            );
            // A synthesized action starts with a comment and cannot sit
            // inside a LOGD string.
            if tr.action.starts_with("//") {
                out.push_str("]\\n\");\n");
            } else {
                let _ = write!(out, ": {}]\\n\");\n", tr.action);
            }
            let _ = writeln!(out, "        {};", tr.action);
            out.push_str("    }\n\n");
        }
    }
}

fn render_state_methods(m: &StateMachine, out: &mut String) {
    let class = m.class_name.to_uppercase();
    for state in m.states() {
        if !state.entering.is_empty() {
            method_comment(
                out,
                &format!("Do the action when entering the state {}.", state.name),
            );
            let _ = writeln!(
                out,
                "    MOCKABLE void {}()",
                names::entering_method(None, &state.name)
            );
            out.push_str("    {\n");
            let _ = writeln!(
                out,
                "        LOGD(\"[{}][ENTERING STATE {}]\\n\");",
                class, state.name
            );
            out.push_str(&state.entering);
            out.push_str("    }\n\n");
        }
        if !state.leaving.is_empty() {
            method_comment(
                out,
                &format!("Do the action when leaving the state {}.", state.name),
            );
            let _ = writeln!(
                out,
                "    MOCKABLE void {}()",
                names::leaving_method(None, &state.name)
            );
            out.push_str("    {\n");
            let _ = writeln!(
                out,
                "        LOGD(\"[{}][LEAVING STATE {}]\\n\");",
                class, state.name
            );
            out.push_str(&state.leaving);
            out.push_str("    }\n\n");
        }
        // The initial state's internal dispatch is inlined in enter().
        if !state.internal.is_empty() && state.name != INITIAL_STATE {
            method_comment(
                out,
                &format!(
                    "Do the internal transition when leaving the state {}.",
                    state.name
                ),
            );
            let _ = writeln!(
                out,
                "    void {}()",
                names::internal_method(None, &state.name)
            );
            out.push_str("    {\n");
            let _ = writeln!(
                out,
                "        LOGD(\"[{}][INTERNAL TRANSITION FROM STATE {}]\\n\");",
                class, state.name
            );
            out.push_str(&state.internal);
            out.push_str("    }\n\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::elaborate::elaborate;
    use crate::parser::parse_diagram;

    fn build(source: &str) -> Registry {
        let nodes = parse_diagram(source).expect("diagram should parse");
        let mut machines = Builder::new("Motor", "").build(&nodes).expect("build");
        for name in machines.names().to_vec() {
            if let Some(m) = machines.get_mut(&name) {
                elaborate(m);
            }
        }
        machines
    }

    const MOTOR: &str = r#"@startuml
[*] --> IDLE
IDLE --> RUNNING : start [ready] / logStart
RUNNING --> IDLE : stop / logStop
IDLE : entry / resetCounters()
@enduml
"#;

    #[test]
    fn test_header_flavor_has_include_guards() {
        let machines = build(MOTOR);
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Header, "motor.plantuml");
        assert!(text.contains("#ifndef MOTOR_HPP"));
        assert!(text.contains("#  define MOTOR_HPP"));
        assert!(text.trim_end().ends_with("#endif // MOTOR_HPP"));
        assert!(text.contains("#  include \"StateMachine.hpp\""));
    }

    #[test]
    fn test_source_flavor_has_no_include_guards() {
        let machines = build(MOTOR);
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "motor.plantuml");
        assert!(!text.contains("#ifndef"));
        assert!(text.contains("#include \"StateMachine.hpp\""));
    }

    #[test]
    fn test_enum_lists_states_and_sentinels() {
        let machines = build(MOTOR);
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "motor.plantuml");
        assert!(text.contains("enum class MotorStates"));
        assert!(text.contains("    CONSTRUCTOR,"));
        assert!(text.contains("    IDLE,"));
        assert!(text.contains("    RUNNING,"));
        assert!(text.contains("    IGNORING_EVENT, CANNOT_HAPPEN, MAX_STATES"));
    }

    #[test]
    fn test_event_method_emits_transition_table() {
        let machines = build(MOTOR);
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "motor.plantuml");
        assert!(text.contains("void start()"));
        assert!(text.contains("static const Transitions s_transitions ="));
        assert!(text.contains(".destination = MotorStates::RUNNING,"));
        assert!(text.contains(".guard = &Motor::onGuarding_IDLE_RUNNING,"));
        assert!(text.contains(".action = &Motor::onTransitioning_IDLE_RUNNING,"));
        assert!(text.contains("transition(s_transitions);"));
    }

    #[test]
    fn test_guard_and_action_methods_are_mockable() {
        let machines = build(MOTOR);
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "motor.plantuml");
        assert!(text.contains("MOCKABLE bool onGuarding_IDLE_RUNNING()"));
        assert!(text.contains("const bool guard = (ready);"));
        assert!(text.contains("MOCKABLE void onTransitioning_IDLE_RUNNING()"));
        assert!(text.contains("MOCKABLE void onEntering_IDLE()"));
    }

    #[test]
    fn test_warnings_embedded_as_pragma() {
        let machines = build(
            r#"@startuml
[*] --> A
A --> B : go
A --> C
@enduml
"#,
        );
        // Verifier not run here; warn manually to pin the embedding format.
        let mut machines = machines;
        machines.get_mut("Motor").unwrap().warn("something is odd");
        let m = machines.get("Motor").unwrap();
        let text = render_class(&machines, m, Flavor::Source, "motor.plantuml");
        assert!(text.contains("#warning \"something is odd\""));
    }

    #[test]
    fn test_nested_machine_members_and_includes() {
        let machines = build(
            r#"@startuml
[*] --> OFF
OFF --> BACKUP : backup
state BACKUP {
    [*] --> COPYING
    COPYING --> DONE : finished
}
@enduml
"#,
        );
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "backup.plantuml");
        assert!(text.contains("#include \"NestedBACKUP.hpp\""));
        assert!(!text.contains("#include \"StateMachine.hpp\""));
        assert!(text.contains("NestedBACKUP m_nested_backup;"));
        assert!(text.contains("m_nested_backup.enter();"));
        assert!(text.contains("m_nested_backup.exit();"));
        // Nested events are forwarded from the root.
        assert!(text.contains("inline void finished() { m_nested_backup.finished(); }"));
    }

    #[test]
    fn test_internal_dispatch_of_initial_state_inlined_in_enter() {
        let machines = build(MOTOR);
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "motor.plantuml");
        assert!(text.contains("// Internal transition"));
        assert!(!text.contains("void onInternal_CONSTRUCTOR()"));
    }

    #[test]
    fn test_event_parameters_become_members() {
        let machines = build(
            r#"@startuml
[*] --> A
A --> B : setSpeed(x)
B --> A : halt
@enduml
"#,
        );
        let m = machines.root().unwrap();
        let text = render_class(&machines, m, Flavor::Source, "speed.plantuml");
        assert!(text.contains("void setSpeed(X const& x_)"));
        assert!(text.contains("        x = x_;"));
        assert!(text.contains("    X x;"));
    }
}
