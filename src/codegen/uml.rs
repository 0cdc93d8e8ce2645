//! Round-trip diagram renderer.
//!
//! Serializes a built machine back to diagram text. Re-parsing the output
//! yields an isomorphic model, which is the contract the tests below check.

use crate::model::StateMachine;

/// Diagram body without the `@startuml`/`@enduml` wrapper. Every line gets
/// the given prefix, so the same body serves both the standalone file and
/// the generated class doc comment.
pub fn diagram_body(m: &StateMachine, prefix: &str) -> String {
    let mut code = String::new();
    let continuation = format!("\n{prefix}");
    for state in m.states() {
        if state.is_sentinel() || !state.has_annotations() {
            continue;
        }
        code.push_str(prefix);
        code.push_str(&state.to_string().replace('\n', &continuation));
        code.push('\n');
    }
    for tr in m.transitions() {
        code.push_str(prefix);
        code.push_str(&tr.to_string());
        code.push('\n');
    }
    code
}

/// Standalone `-interpreted.plantuml` file content.
pub fn render(m: &StateMachine) -> String {
    format!("@startuml\n{}@enduml\n", diagram_body(m, ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::parser::parse_diagram;

    fn build(source: &str) -> StateMachine {
        let nodes = parse_diagram(source).expect("diagram should parse");
        let machines = Builder::new("demo", "").build(&nodes).expect("build");
        machines.get("demo").expect("root machine").clone()
    }

    // The builder re-indents entry/exit snippets and appends ';', so code
    // bodies are compared up to that normalization.
    fn normalize(code: &str) -> String {
        code.trim().trim_end_matches(';').to_string()
    }

    #[test]
    fn test_rendered_diagram_reparses_isomorphic() {
        let first = build(
            r#"@startuml
[*] --> IDLE
IDLE --> RUNNING : start [ready] / logStart
RUNNING --> IDLE : stop / logStop
RUNNING --> [*]
IDLE : entry / resetCounters()
IDLE : exit / flush()
@enduml
"#,
        );
        let second = build(&render(&first));

        let names = |m: &StateMachine| {
            let mut v: Vec<String> = m.states().map(|s| s.name.clone()).collect();
            v.sort();
            v
        };
        assert_eq!(names(&first), names(&second));

        for tr in first.transitions() {
            let other = second
                .transition(&tr.origin, &tr.destination)
                .unwrap_or_else(|| panic!("missing edge {} -> {}", tr.origin, tr.destination));
            assert_eq!(tr.event.name, other.event.name);
            assert_eq!(tr.guard, other.guard);
            assert_eq!(normalize(&tr.action), normalize(&other.action));
        }
        for state in first.states() {
            let other = second.state(&state.name).expect("state survives round-trip");
            assert_eq!(normalize(&state.entering), normalize(&other.entering));
            assert_eq!(normalize(&state.leaving), normalize(&other.leaving));
        }
    }

    #[test]
    fn test_sentinels_never_rendered_as_annotations() {
        let m = build(
            r#"@startuml
[*] --> A
A --> [*]
@enduml
"#,
        );
        let text = render(&m);
        assert!(text.contains("[*] --> A"));
        assert!(text.contains("A --> [*]"));
        assert!(!text.contains("* :"));
    }

    #[test]
    fn test_reverse_arrow_direction_preserved() {
        let m = build(
            r#"@startuml
[*] --> A
B <- A : go
@enduml
"#,
        );
        let text = render(&m);
        assert!(text.contains("B <- A : go"));
    }
}
