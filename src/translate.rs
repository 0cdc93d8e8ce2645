//! End-to-end translation pipeline.
//!
//! Parse, build, verify, elaborate, then render every output file of one
//! diagram: a class file and a test file per machine (root first), the
//! re-serialized diagram per machine, and the shared test runner.

use std::path::{Path, PathBuf};

use crate::builder::Builder;
use crate::codegen::{self, testwriter, uml, Flavor};
use crate::elaborate::elaborate;
use crate::error::{Error, Result};
use crate::model::Registry;
use crate::parser::parse_diagram;
use crate::testgen::{enumerate_scenarios, Budget};
use crate::verify::verify;

/// One generated file, path relative to the output directory.
#[derive(Debug, Clone)]
pub struct Output {
    pub path: PathBuf,
    pub contents: String,
}

/// Parse and build the model of one diagram, verified and elaborated.
pub fn build_model(source: &str, stem: &str, postfix: &str) -> Result<Registry> {
    let nodes = parse_diagram(source)?;
    let mut machines = Builder::new(stem, postfix).build(&nodes)?;
    for name in machines.names().to_vec() {
        if let Some(m) = machines.get_mut(&name) {
            verify(m);
            elaborate(m);
        }
    }
    Ok(machines)
}

/// Translate one diagram into its full set of output files.
pub fn translate(source: &str, diagram: &Path, flavor: Flavor, postfix: &str) -> Result<Vec<Output>> {
    let stem = diagram
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::BadStem(diagram.display().to_string()))?;
    let diagram_name = diagram
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(stem)
        .to_string();

    let machines = build_model(source, stem, postfix)?;
    let budget = Budget::default();

    let mut outputs = Vec::new();
    let mut test_files: Vec<String> = Vec::new();
    for m in machines.iter() {
        log::info!(
            "generating state machine {} ({} states)",
            m.name,
            m.states().count()
        );
        let scenarios = enumerate_scenarios(m, &budget);
        let test_file = format!("{}Tests.cpp", m.class_name);
        test_files.push(test_file.clone());
        outputs.push(Output {
            path: PathBuf::from(format!("{}.{}", m.class_name, flavor.extension())),
            contents: codegen::render_class(&machines, m, flavor, &diagram_name),
        });
        outputs.push(Output {
            path: PathBuf::from(test_file),
            contents: testwriter::render_tests(m, &scenarios, &diagram_name, Some(&test_files)),
        });
        outputs.push(Output {
            path: PathBuf::from(format!("{}-interpreted.plantuml", m.name)),
            contents: uml::render(m),
        });
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOTOR: &str = r#"@startuml
[*] --> IDLE
IDLE --> RUNNING : start [ready] / logStart
RUNNING --> IDLE : stop / logStop
@enduml
"#;

    #[test]
    fn test_translate_emits_three_files_per_machine() {
        let outputs = translate(MOTOR, Path::new("motor.plantuml"), Flavor::Source, "").unwrap();
        let paths: Vec<String> = outputs
            .iter()
            .map(|o| o.path.display().to_string())
            .collect();
        assert_eq!(
            paths,
            vec!["motor.cpp", "motorTests.cpp", "motor-interpreted.plantuml"]
        );
    }

    #[test]
    fn test_postfix_extends_class_name() {
        let outputs = translate(MOTOR, Path::new("motor.plantuml"), Flavor::Header, "Ctrl").unwrap();
        assert_eq!(outputs[0].path, PathBuf::from("motorCtrl.hpp"));
        assert!(outputs[0].contents.contains("class motorCtrl"));
        assert!(outputs[0].contents.contains("enum class motorCtrlStates"));
    }

    #[test]
    fn test_nested_machines_generated_root_first() {
        let source = r#"@startuml
[*] --> OFF
OFF --> BACKUP : backup
state BACKUP {
    [*] --> COPYING
    COPYING --> DONE : finished
}
@enduml
"#;
        let outputs = translate(source, Path::new("backup.plantuml"), Flavor::Source, "").unwrap();
        let paths: Vec<String> = outputs
            .iter()
            .map(|o| o.path.display().to_string())
            .collect();
        assert_eq!(
            paths,
            vec![
                "backup.cpp",
                "backupTests.cpp",
                "backup-interpreted.plantuml",
                "NestedBACKUP.cpp",
                "NestedBACKUPTests.cpp",
                "BACKUP-interpreted.plantuml",
            ]
        );
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let err = translate(
            "@startuml\nIDLE -> : oops\n@enduml\n",
            Path::new("bad.plantuml"),
            Flavor::Source,
            "",
        );
        assert!(err.is_err());
    }
}
