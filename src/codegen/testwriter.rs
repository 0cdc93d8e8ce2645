//! gtest/gmock test-file emitter.
//!
//! One test file per machine: a mock subclass overriding every guard and
//! action hook, one TEST per cycle scenario and per source-to-sink path,
//! with EXPECT_CALL stubs derived from the scenario's hit counts. Guards on
//! the walked route return true; every other guard returns false so the
//! machine cannot wander off the scenario.

use std::fmt::Write as _;

use crate::codegen::{banner, function_comment, line_separator, names};
use crate::model::StateMachine;
use crate::testgen::{HitCounts, ScenarioSet};

/// Render the whole test file of one machine. `main_files` carries the list
/// of generated test files for the compile hint; `None` skips the embedded
/// main (for the separate-main layout).
pub fn render_tests(
    m: &StateMachine,
    scenarios: &ScenarioSet,
    diagram: &str,
    main_files: Option<&[String]>,
) -> String {
    let mut out = String::new();
    render_header(m, scenarios, diagram, &mut out);
    render_mock_class(m, &mut out);
    render_cycle_tests(m, scenarios, &mut out);
    render_path_tests(m, scenarios, &mut out);
    if let Some(files) = main_files {
        render_main_function(files, &mut out);
    }
    out
}

/// Standalone main file, for the layout with one shared test runner.
pub fn render_main_file(files: &[String]) -> String {
    let mut out = String::new();
    out.push_str("#include <gmock/gmock.h>\n");
    out.push_str("#include <gtest/gtest.h>\n");
    out.push_str("using namespace ::testing;\n\n");
    render_main_function(files, &mut out);
    out
}

fn render_header(m: &StateMachine, scenarios: &ScenarioSet, diagram: &str, out: &mut String) {
    banner(out, diagram);
    out.push_str("#define MOCKABLE virtual\n");
    let _ = writeln!(out, "#include \"{}.hpp\"", m.class_name);
    out.push_str("#include <gmock/gmock.h>\n");
    out.push_str("#include <gtest/gtest.h>\n");
    out.push_str("#include <cstring>\n\n");
    out.push_str("using namespace ::testing;\n\n");
    if scenarios.truncated {
        out.push_str(
            "#warning \"Scenario enumeration truncated: these tests do not cover every cycle and path\"\n\n",
        );
    }
}

fn render_mock_class(m: &StateMachine, out: &mut String) {
    function_comment(out, "Mocked state machine");
    let _ = writeln!(out, "class Mock{} : public {}", m.class_name, m.class_name);
    out.push_str("{\npublic:\n");
    for tr in m.transitions() {
        if !tr.guard.is_empty() {
            let _ = writeln!(
                out,
                "    MOCK_METHOD(bool, {}, (), (override));",
                names::guard_method(None, &tr.origin, &tr.destination)
            );
        }
        if !tr.action.is_empty() {
            let _ = writeln!(
                out,
                "    MOCK_METHOD(void, {}, (), (override));",
                names::action_method(None, &tr.origin, &tr.destination)
            );
        }
    }
    for state in m.states() {
        if !state.entering.is_empty() {
            let _ = writeln!(
                out,
                "    MOCK_METHOD(void, {}, (), (override));",
                names::entering_method(None, &state.name)
            );
        }
        if !state.leaving.is_empty() {
            let _ = writeln!(
                out,
                "    MOCK_METHOD(void, {}, (), (override));",
                names::leaving_method(None, &state.name)
            );
        }
    }
    for dispatch in &m.dispatch {
        for param in &dispatch.event.params {
            let _ = writeln!(out, "    // Data for event {}", dispatch.event.name);
            let _ = writeln!(out, "    {} {}{{}};", param.to_uppercase(), param);
        }
    }
    out.push_str(&m.extra.unit_tests);
    if !m.extra.unit_tests.is_empty() {
        out.push('\n');
    }
    out.push_str("};\n\n");
}

/// Flatten an opaque code snippet into a one-line LOGD-safe string.
fn cleaning_code(code: &str) -> String {
    code.replace("        ", " ")
        .replace('\n', " ")
        .replace('"', "\\\"")
        .trim()
        .to_string()
}

/// EXPECT_CALL stubs for one scenario. Walked guards return true with a
/// trace of the real expression; untouched guards are pinned to false.
fn render_expectations(m: &StateMachine, counts: &HitCounts, out: &mut String) {
    for tr in m.transitions() {
        if !tr.guard.is_empty() {
            let _ = write!(
                out,
                "    EXPECT_CALL(fsm, {}())",
                names::guard_method(None, &tr.origin, &tr.destination)
            );
            if counts.guard_hits(&tr.origin, &tr.destination) == 0 {
                out.push_str(".WillRepeatedly(Return(false));\n");
            } else {
                let _ = writeln!(
                    out,
                    ".WillRepeatedly(Invoke([](){{ LOGD(\"{}\\n\"); return true; }}));",
                    cleaning_code(&tr.guard)
                );
            }
        }
        if !tr.action.is_empty() {
            let hits = counts.action_hits(&tr.origin, &tr.destination);
            let _ = write!(
                out,
                "    EXPECT_CALL(fsm, {}()).Times({})",
                names::action_method(None, &tr.origin, &tr.destination),
                hits
            );
            if hits >= 1 {
                let _ = write!(
                    out,
                    ".WillRepeatedly(Invoke([](){{ LOGD(\"{}\\n\"); }}))",
                    cleaning_code(&tr.action)
                );
            }
            out.push_str(";\n");
        }
    }
    for state in m.states() {
        if !state.entering.is_empty() {
            let hits = counts.entry_hits(&state.name);
            let _ = write!(
                out,
                "    EXPECT_CALL(fsm, {}()).Times({})",
                names::entering_method(None, &state.name),
                hits
            );
            if hits >= 1 {
                let _ = write!(
                    out,
                    ".WillRepeatedly(Invoke([](){{ LOGD(\"{}\\n\"); }}))",
                    cleaning_code(&state.entering)
                );
            }
            out.push_str(";\n");
        }
        if !state.leaving.is_empty() {
            let hits = counts.exit_hits(&state.name);
            let _ = write!(
                out,
                "    EXPECT_CALL(fsm, {}()).Times({})",
                names::leaving_method(None, &state.name),
                hits
            );
            if hits >= 1 {
                let _ = write!(
                    out,
                    ".WillRepeatedly(Invoke([](){{ LOGD(\"{}\\n\"); }}))",
                    cleaning_code(&state.leaving)
                );
            }
            out.push_str(";\n");
        }
    }
}

fn render_state_assertion(m: &StateMachine, state: &str, out: &mut String) {
    out.push_str("    LOGD(\"[UNIT TEST] Current state: %s\\n\", fsm.c_str());\n");
    let _ = writeln!(
        out,
        "    ASSERT_EQ(fsm.state(), {});",
        names::state_enum(&m.enum_name, state)
    );
    let _ = writeln!(out, "    ASSERT_STREQ(fsm.c_str(), \"{state}\");");
}

fn is_evented(m: &StateMachine, origin: &str, destination: &str) -> bool {
    m.transition(origin, destination)
        .is_some_and(|t| !t.event.is_anonymous())
}

fn render_cycle_tests(m: &StateMachine, scenarios: &ScenarioSet, out: &mut String) {
    let class = m.class_name.to_uppercase();
    for (count, cycle) in scenarios.cycles.iter().enumerate() {
        line_separator(out, 0, 80, '-');
        let _ = writeln!(out, "TEST({}Tests, TestCycle{count})\n{{", m.class_name);
        out.push_str("    LOGD(\"===========================================\\n\");\n");
        out.push_str("    LOGD(\"Check cycle: [*]");
        for state in cycle {
            let _ = write!(out, " {state}");
        }
        out.push_str("\\n\");\n");
        out.push_str("    LOGD(\"===========================================\\n\");\n");
        let _ = writeln!(out, "    Mock{} fsm;", m.class_name);

        let mut sequence = vec![crate::model::INITIAL_STATE.to_string()];
        sequence.extend(cycle.iter().cloned());
        let counts = HitCounts::count(m, &sequence);
        render_expectations(m, &counts, out);

        out.push_str("\n    fsm.enter();\n");
        render_state_assertion(m, &cycle[0], out);

        for i in 0..cycle.len() - 1 {
            if let Some(tr) = m.transition(&cycle[i], &cycle[i + 1]) {
                if !tr.event.is_anonymous() {
                    let _ = writeln!(
                        out,
                        "\n    LOGD(\"\\n[{}] Triggering event {} [{}]: {} ==> {}\\n\");",
                        class,
                        tr.event.name,
                        tr.guard,
                        cycle[i],
                        cycle[i + 1]
                    );
                    let _ = writeln!(out, "    fsm.{};", tr.event.caller("fsm"));
                }
            }
            if i == cycle.len() - 2 {
                // A closing hop without an event means the machine already
                // moved on by itself; its resting state cannot be asserted.
                if !is_evented(m, &cycle[i + 1], &cycle[1]) {
                    out.push_str(
                        "    \n#warning \"Malformed state machine: unreachable destination state\"\n",
                    );
                } else {
                    render_state_assertion(m, &cycle[i + 1], out);
                }
            } else if is_evented(m, &cycle[i + 1], &cycle[i + 2]) {
                render_state_assertion(m, &cycle[i + 1], out);
            }
        }
        out.push_str("}\n\n");
    }
}

fn render_path_tests(m: &StateMachine, scenarios: &ScenarioSet, out: &mut String) {
    let class = m.class_name.to_uppercase();
    for (count, path) in scenarios.paths.iter().enumerate() {
        line_separator(out, 0, 80, '-');
        let _ = writeln!(out, "TEST({}Tests, TestPath{count})\n{{", m.class_name);
        out.push_str("    LOGD(\"===========================================\\n\");\n");
        out.push_str("    LOGD(\"Check path:");
        for state in path {
            let _ = write!(out, " {state}");
        }
        out.push_str("\\n\");\n");
        out.push_str("    LOGD(\"===========================================\\n\");\n");
        let _ = writeln!(out, "    Mock{} fsm;", m.class_name);

        let counts = HitCounts::count(m, path);
        render_expectations(m, &counts, out);

        out.push_str("\n    fsm.enter();\n");

        for i in 0..path.len() - 1 {
            if let Some(tr) = m.transition(&path[i], &path[i + 1]) {
                if !tr.event.is_anonymous() {
                    let _ = writeln!(
                        out,
                        "\n    LOGD(\"[{}] Event {} [{}]: {} ==> {}\\n\");",
                        class,
                        tr.event.name,
                        tr.guard,
                        path[i],
                        path[i + 1]
                    );
                    let _ = writeln!(out, "\n    fsm.{};", tr.event.caller(""));
                }
            }
            if i == path.len() - 2 {
                render_state_assertion(m, &path[i + 1], out);
            } else if is_evented(m, &path[i + 1], &path[i + 2]) {
                render_state_assertion(m, &path[i + 1], out);
            }
        }
        out.push_str("}\n\n");
    }
}

fn render_main_function(files: &[String], out: &mut String) {
    function_comment(
        out,
        &format!(
            "Compile with:\n//! g++ --std=c++14 -Wall -Wextra -Wshadow -I../../include -DFSM_DEBUG \\\n//! {} `pkg-config --cflags --libs gtest gmock`",
            files.join(" ")
        ),
    );
    out.push_str("int main(int argc, char *argv[])\n{\n");
    out.push_str("    // The following line must be executed to initialize Google Mock\n");
    out.push_str("    // (and Google Test) before running the tests.\n");
    out.push_str("    ::testing::InitGoogleMock(&argc, argv);\n");
    out.push_str("    return RUN_ALL_TESTS();\n}\n");
}
