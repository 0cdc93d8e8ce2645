//! Graph model of a hierarchical state machine.
//!
//! One `StateMachine` per nesting level: states are graph nodes, transitions
//! are graph edges. The builder populates it, the verifier appends warnings,
//! the elaborator fills the `internal` fields, and everything downstream
//! treats it as read-only.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Diagram name of the pseudo-initial state.
pub const INITIAL_STATE: &str = "[*]";
/// Diagram name of the pseudo-final state.
pub const FINAL_STATE: &str = "*";

/// Method names already taken by the runtime base class.
pub const RESERVED_NAMES: [&str; 5] = ["start", "stop", "state", "c_str", "transition"];

/// An external event the machine reacts to.
///
/// The name is normalized method-style: first diagram word lower-cased,
/// following words capitalized, so `set speed(x)` becomes `setSpeed`.
/// Parameters are not part of the identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// Method-style name, empty for the anonymous (event-less) event.
    pub name: String,
    /// Ordered parameter names, without types.
    pub params: Vec<String>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Event {}

impl std::hash::Hash for Event {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl Event {
    /// Build an event from its diagram words and optional parameter list.
    ///
    /// A single word directly followed by a parameter list keeps its case;
    /// otherwise the first word is lower-cased and later words capitalized.
    pub fn from_words(words: &[String], params: Option<&[String]>) -> Self {
        let mut name = String::new();
        for (i, word) in words.iter().enumerate() {
            if i == 0 {
                if words.len() == 1 && params.is_some() {
                    name.push_str(word);
                } else {
                    name.push_str(&word.to_lowercase());
                }
            } else {
                name.push_str(&capitalize(word));
            }
        }
        Self {
            name,
            params: params.map(<[String]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    /// C++ method signature, e.g. `void setSpeed(X const& x_)`.
    pub fn header(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| format!("{} const& {}_", p.to_uppercase(), p))
            .collect::<Vec<_>>()
            .join(", ");
        format!("void {}({})", self.name, params)
    }

    /// C++ call expression, e.g. `setSpeed(fsm.x)` for `var = "fsm"`.
    pub fn caller(&self, var: &str) -> String {
        let prefix = if var.is_empty() {
            String::new()
        } else {
            format!("{var}.")
        };
        let params = self
            .params
            .iter()
            .map(|p| format!("{prefix}{p}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.name, params)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// A transition stored as edge payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transition {
    /// Origin state, always "where we come from" whatever the arrow said.
    pub origin: String,
    /// Destination state.
    pub destination: String,
    /// Triggering event; anonymous when the transition is event-less.
    pub event: Event,
    /// Opaque boolean guard expression, possibly empty.
    pub guard: String,
    /// Opaque action statement, possibly empty.
    pub action: String,
    /// Arrow token as drawn, kept only for diagram round-trips.
    pub arrow: String,
}

/// Collapse a code snippet to a single line so it survives re-parsing.
/// Synthesized placeholder actions span several lines.
fn one_line(code: &str) -> String {
    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Self-loops come from "on event" annotations and render back as such.
        if self.origin == self.destination {
            write!(
                f,
                "{} : on {} [{}] / {}",
                self.origin,
                self.event.name,
                self.guard,
                one_line(&self.action)
            )
        } else {
            let dest = if self.destination == FINAL_STATE {
                INITIAL_STATE
            } else {
                &self.destination
            };
            let arrow = if self.arrow.is_empty() { "->" } else { &self.arrow };
            if arrow.ends_with('>') {
                write!(f, "{} {} {}", self.origin, arrow, dest)?;
            } else {
                write!(f, "{} {} {}", dest, arrow, self.origin)?;
            }
            if !self.event.name.is_empty() || !self.guard.is_empty() || !self.action.is_empty() {
                write!(f, " : ")?;
            }
            if !self.event.name.is_empty() {
                write!(f, "{}", self.event.name)?;
            }
            if !self.guard.is_empty() {
                write!(f, " [{}]", self.guard)?;
            }
            if !self.action.is_empty() {
                write!(f, " / {}", one_line(&self.action))?;
            }
            Ok(())
        }
    }
}

/// A state stored as node payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct State {
    /// Raw diagram name (`[*]`, `*` or an upper-cased identifier).
    pub name: String,
    /// Comment placed next to the generated enum value.
    pub comment: String,
    /// Opaque code run when entering the state.
    pub entering: String,
    /// Opaque code run when leaving the state.
    pub leaving: String,
    /// Opaque activity code.
    pub activity: String,
    /// Event-less dispatch synthesized by the elaborator. Build output,
    /// empty until elaboration.
    pub internal: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.name == INITIAL_STATE || self.name == FINAL_STATE
    }

    /// Does the state carry any authored or derived action code?
    pub fn has_hooks(&self) -> bool {
        !self.entering.is_empty()
            || !self.leaving.is_empty()
            || !self.activity.is_empty()
            || !self.internal.is_empty()
    }

    /// Does the state carry any diagram-visible annotation? Unlike
    /// `has_hooks` this ignores the derived `internal` code, which has no
    /// diagram syntax of its own.
    pub fn has_annotations(&self) -> bool {
        !self.entering.is_empty() || !self.leaving.is_empty() || !self.activity.is_empty()
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines = Vec::new();
        if !self.entering.is_empty() {
            lines.push(format!("{} : entering / {}", self.name, self.entering.trim()));
        }
        if !self.leaving.is_empty() {
            lines.push(format!("{} : leaving / {}", self.name, self.leaving.trim()));
        }
        if !self.activity.is_empty() {
            lines.push(format!("{} : activity / {}", self.name, self.activity.trim()));
        }
        write!(f, "{}", lines.join("\n"))
    }
}

/// User code spliced verbatim into fixed points of the generated class.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraCode {
    /// Class docstring.
    pub brief: String,
    /// Code before the class definition.
    pub header: String,
    /// Code after the class definition.
    pub footer: String,
    /// Extra constructor parameters.
    pub argvs: String,
    /// Extra constructor initializer-list entries.
    pub cons: String,
    /// Code inside the constructor and reset path.
    pub init: String,
    /// Extra member declarations.
    pub code: String,
    /// Extra members of the generated mock class.
    pub unit_tests: String,
}

/// One event of the dispatch map with its arcs in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDispatch {
    pub event: Event,
    /// (origin, destination) pairs, diagram-declaration order. This order is
    /// the dispatch precedence of the generated transition table.
    pub arcs: Vec<(String, String)>,
}

/// One nesting level of the statechart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateMachine {
    /// Diagram-derived machine name (file stem or composite state name).
    pub name: String,
    /// Generated C++ class name.
    pub class_name: String,
    /// Generated C++ state enum name.
    pub enum_name: String,
    graph: DiGraph<State, Transition>,
    indices: HashMap<String, NodeIndex>,
    /// `[*]` once an initial transition was seen, empty otherwise.
    pub initial_state: String,
    /// `*` once a final transition was seen, empty otherwise.
    pub final_state: String,
    /// Name of the parent machine; lookup key, not ownership.
    pub parent: Option<String>,
    /// Names of nested machines, declaration order.
    pub children: Vec<String>,
    /// Event dispatch map, event-declaration order.
    pub dispatch: Vec<EventDispatch>,
    /// (child machine name, event) pairs the root forwards downward.
    pub broadcasts: Vec<(String, Event)>,
    /// User code injections.
    pub extra: ExtraCode,
    /// Append-only diagnostics; never fatal.
    pub warnings: Vec<String>,
}

impl StateMachine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a state node unless one with this name already exists.
    pub fn add_state(&mut self, name: &str) -> NodeIndex {
        if let Some(&ix) = self.indices.get(name) {
            return ix;
        }
        let ix = self.graph.add_node(State::new(name));
        self.indices.insert(name.to_string(), ix);
        ix
    }

    /// Add a transition edge. Endpoint nodes are created when missing so the
    /// graph never holds a dangling edge; a repeated (origin, destination)
    /// pair replaces the previous payload.
    pub fn add_transition(&mut self, tr: Transition) {
        let o = self.add_state(&tr.origin);
        let d = self.add_state(&tr.destination);
        match self.graph.find_edge(o, d) {
            Some(e) => self.graph[e] = tr,
            None => {
                self.graph.add_edge(o, d, tr);
            }
        }
    }

    /// Record an (origin, destination) arc under its event, keeping both the
    /// event order and the per-event arc order as declared.
    pub fn register_event(&mut self, event: &Event, origin: &str, destination: &str) {
        let arc = (origin.to_string(), destination.to_string());
        match self.dispatch.iter_mut().find(|d| d.event == *event) {
            Some(entry) => entry.arcs.push(arc),
            None => self.dispatch.push(EventDispatch {
                event: event.clone(),
                arcs: vec![arc],
            }),
        }
    }

    pub fn node(&self, name: &str) -> Option<NodeIndex> {
        self.indices.get(name).copied()
    }

    pub fn contains_state(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }

    pub fn state(&self, name: &str) -> Option<&State> {
        self.node(name).map(|ix| &self.graph[ix])
    }

    pub fn state_mut(&mut self, name: &str) -> Option<&mut State> {
        self.node(name).map(|ix| &mut self.graph[ix])
    }

    /// All states in insertion order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.graph.node_indices().map(|ix| &self.graph[ix])
    }

    pub fn transition(&self, origin: &str, destination: &str) -> Option<&Transition> {
        let o = self.node(origin)?;
        let d = self.node(destination)?;
        self.graph.find_edge(o, d).map(|e| &self.graph[e])
    }

    /// All transitions in diagram-declaration order.
    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.graph.edge_references().map(|e| e.weight())
    }

    /// Outgoing transitions of a state, declaration order.
    ///
    /// petgraph walks adjacency lists newest-first, so this filters the
    /// global edge list instead, which is stable insertion order.
    pub fn transitions_from(&self, origin: &str) -> Vec<&Transition> {
        let Some(o) = self.node(origin) else {
            return Vec::new();
        };
        self.graph
            .edge_references()
            .filter(|e| e.source() == o)
            .map(|e| e.weight())
            .collect()
    }

    /// Successor state names, declaration order.
    pub fn successors(&self, origin: &str) -> Vec<&str> {
        self.transitions_from(origin)
            .into_iter()
            .map(|t| t.destination.as_str())
            .collect()
    }

    /// Predecessor state names, declaration order.
    pub fn predecessors(&self, destination: &str) -> Vec<&str> {
        let Some(d) = self.node(destination) else {
            return Vec::new();
        };
        self.graph
            .edge_references()
            .filter(|e| e.target() == d)
            .map(|e| self.graph[e.source()].name.as_str())
            .collect()
    }

    pub fn in_degree(&self, name: &str) -> usize {
        self.node(name)
            .map(|ix| self.graph.edges_directed(ix, Direction::Incoming).count())
            .unwrap_or(0)
    }

    pub fn out_degree(&self, name: &str) -> usize {
        self.node(name)
            .map(|ix| self.graph.edges_directed(ix, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Underlying graph, for traversal algorithms.
    pub fn graph(&self) -> &DiGraph<State, Transition> {
        &self.graph
    }

    /// Append a diagnostic warning; never aborts anything.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::warn!("state machine {}: {}", self.name, msg);
        self.warnings.push(msg);
    }
}

/// All machines of one translation run, discovery order (root first).
///
/// The registry owns every machine; parent/child links between machines are
/// names resolved here, so there is no reference cycle to tear down.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Registry {
    order: Vec<String>,
    machines: HashMap<String, StateMachine>,
}

impl Registry {
    pub fn insert(&mut self, machine: StateMachine) {
        if !self.machines.contains_key(&machine.name) {
            self.order.push(machine.name.clone());
        }
        self.machines.insert(machine.name.clone(), machine);
    }

    pub fn get(&self, name: &str) -> Option<&StateMachine> {
        self.machines.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut StateMachine> {
        self.machines.get_mut(name)
    }

    /// Machines in discovery order: root first, then nested machines in
    /// declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &StateMachine> {
        self.order.iter().filter_map(|n| self.machines.get(n))
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn root(&self) -> Option<&StateMachine> {
        self.order.first().and_then(|n| self.machines.get(n))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
