//! statemill - PlantUML statechart to C++ state machine translator
//! Turns a statechart diagram into a C++ class and its gtest/gmock test suite

pub mod ast;
pub mod builder;
pub mod codegen;
pub mod elaborate;
pub mod error;
pub mod graph;
pub mod model;
pub mod parser;
pub mod tables;
pub mod testgen;
pub mod translate;
pub mod verify;

pub use codegen::Flavor;
pub use error::{Error, Result};
pub use parser::parse_diagram;
pub use translate::{build_model, translate};
