//! statemill CLI - translate a PlantUML statechart into C++

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use statemill::codegen::Flavor;
use statemill::{build_model, translate, Error};

fn usage(program: &str) {
    println!("Usage: {program} <diagram.plantuml> cpp|hpp|json [postfix]");
    println!("Where:");
    println!("   <diagram.plantuml>: the path of a PlantUML statechart");
    println!("   cpp|hpp: generate a C++ source file or a C++ header file per state machine");
    println!("   json: dump the interpreted model as JSON instead of generating code");
    println!("   [postfix]: optional postfix extending the state machine class name");
    println!("Example:");
    println!("   {program} motor.plantuml hpp Controller");
    println!("Will create MotorController.hpp with a state machine class MotorController");
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        usage(&args[0]);
        return Err("missing arguments".to_string());
    }

    let diagram = Path::new(&args[1]);
    let flavor_arg = args[2].as_str();
    let postfix = args.get(3).map(String::as_str).unwrap_or("");

    let source = fs::read_to_string(diagram).map_err(|e| {
        Error::Io {
            path: diagram.display().to_string(),
            source: e,
        }
        .to_string()
    })?;

    if flavor_arg == "json" {
        let stem = diagram
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::BadStem(diagram.display().to_string()).to_string())?;
        let machines = build_model(&source, stem, postfix).map_err(|e| e.to_string())?;
        let dump =
            serde_json::to_string_pretty(&machines).map_err(|e| Error::from(e).to_string())?;
        println!("{dump}");
        return Ok(());
    }

    let Some(flavor) = Flavor::from_arg(flavor_arg) else {
        usage(&args[0]);
        return Err(format!(
            "invalid flavor '{flavor_arg}', expected cpp, hpp or json"
        ));
    };

    let outputs = translate(&source, diagram, flavor, postfix).map_err(|e| e.to_string())?;
    for output in &outputs {
        fs::write(&output.path, &output.contents)
            .map_err(|e| format!("cannot write '{}': {e}", output.path.display()))?;
        println!("generated {}", output.path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::FAILURE
        }
    }
}
