//! Model builder.
//!
//! Walks the typed diagram tree and populates one `StateMachine` per nesting
//! level. The traversal context is this struct itself: nested state blocks
//! save and restore the current machine name around the recursion, so the
//! builder is re-entrant and nothing global leaks into the model.

use crate::ast::{AnnotationKind, Label, Node, TransitionNode};
use crate::error::{Error, Result};
use crate::model::{
    Event, Registry, StateMachine, Transition, FINAL_STATE, INITIAL_STATE, RESERVED_NAMES,
};


pub struct Builder {
    machines: Registry,
    /// Name of the machine currently being populated.
    current: String,
    /// Name of the root machine, target of broadcast bindings.
    root: String,
}

impl Builder {
    /// Create a builder holding the root machine. `stem` is the diagram file
    /// stem, `postfix` the optional class-name suffix.
    pub fn new(stem: &str, postfix: &str) -> Self {
        let mut machine = StateMachine::new(stem);
        machine.class_name = format!("{stem}{postfix}");
        machine.enum_name = format!("{}States", machine.class_name);
        let mut machines = Registry::default();
        machines.insert(machine);
        Self {
            machines,
            current: stem.to_string(),
            root: stem.to_string(),
        }
    }

    /// Consume the tree and return all machines, root first.
    pub fn build(mut self, nodes: &[Node]) -> Result<Registry> {
        for node in nodes {
            self.visit(node)?;
        }
        Ok(self.machines)
    }

    fn visit(&mut self, node: &Node) -> Result<()> {
        match node {
            Node::Transition(t) => {
                self.add_transition_node(t, false);
                Ok(())
            }
            Node::StateOn { state, label } => {
                self.add_on_event(state, label);
                Ok(())
            }
            Node::StateAnnotation { state, kind, code } => {
                self.merge_annotation(state, *kind, code);
                Ok(())
            }
            Node::StateBlock { name, children } => self.enter_block(name, children),
            Node::CodeInjection { tag, code } => self.inject(tag, code),
        }
    }

    fn cur(&mut self) -> &mut StateMachine {
        self.machines
            .get_mut(&self.current)
            .expect("current machine is registered")
    }

    /// Normalize a transition line and store it as a graph edge.
    ///
    /// `from_on` marks self-loops synthesized from an "on event" annotation;
    /// those must never end up with an empty action.
    fn add_transition_node(&mut self, t: &TransitionNode, from_on: bool) {
        // A reverse arrow swaps the sides: origin is always where we come from.
        let (origin_raw, dest_raw) = if t.arrow.ends_with('>') {
            (&t.lhs, &t.rhs)
        } else {
            (&t.rhs, &t.lhs)
        };
        let mut tr = Transition {
            origin: origin_raw.to_uppercase(),
            destination: dest_raw.to_uppercase(),
            arrow: t.arrow.clone(),
            ..Transition::default()
        };

        if tr.origin == INITIAL_STATE {
            self.cur().initial_state = INITIAL_STATE.to_string();
        } else if tr.destination == INITIAL_STATE {
            // A transition into [*] targets the pseudo-final state.
            tr.destination = FINAL_STATE.to_string();
            self.cur().final_state = FINAL_STATE.to_string();
        }

        // Nodes first, so the edge never dangles.
        let origin = tr.origin.clone();
        let destination = tr.destination.clone();
        self.cur().add_state(&origin);
        self.cur().add_state(&destination);

        if let Some(label) = &t.label {
            let event = Event::from_words(&label.event_words, label.params.as_deref());
            if !event.is_anonymous() {
                self.check_reserved(&event.name);
                if self.cur().parent.is_some() {
                    // The root forwards external events down to nested machines.
                    let binding = (self.current.clone(), event.clone());
                    if let Some(root) = self.machines.get_mut(&self.root) {
                        root.broadcasts.push(binding);
                    }
                }
                self.cur().register_event(&event, &origin, &destination);
            }
            tr.event = event;
            if let Some(guard) = &label.guard {
                self.check_reserved(guard);
                tr.guard = guard.clone();
            }
            if let Some(action) = &label.action {
                self.check_reserved(action);
                tr.action = action.clone();
            }
        }

        if from_on && tr.origin == tr.destination && tr.action.is_empty() {
            tr.action = format!(
                "// Dummy action\n#warning \"no reaction to event {} for internal transition {} -> {}\"\n",
                tr.event.name, tr.origin, tr.destination
            );
            self.cur().warn(format!(
                "no reaction to event {} on self-transition of state {}",
                tr.event.name, origin
            ));
        }

        self.cur().add_transition(tr);
    }

    /// "on event" keeps graph algorithms uniform: it becomes a real self-loop
    /// edge rather than state-local text. Entry and exit hooks are suppressed
    /// by the self-loop itself (source == destination never counts as
    /// entering or leaving).
    fn add_on_event(&mut self, state: &str, label: &Label) {
        let node = TransitionNode {
            lhs: state.to_string(),
            arrow: "->".to_string(),
            rhs: state.to_string(),
            label: Some(label.clone()),
        };
        self.add_transition_node(&node, true);
    }

    fn merge_annotation(&mut self, state: &str, kind: AnnotationKind, code: &str) {
        let name = state.to_uppercase();
        self.cur().add_state(&name);
        let machine = self.cur();
        if let Some(s) = machine.state_mut(&name) {
            match kind {
                AnnotationKind::Entry => {
                    s.entering.push_str("        ");
                    s.entering.push_str(code);
                    s.entering.push_str(";\n");
                }
                AnnotationKind::Exit => {
                    s.leaving.push_str("        ");
                    s.leaving.push_str(code);
                    s.leaving.push_str(";\n");
                }
                AnnotationKind::Activity => s.activity.push_str(code),
                AnnotationKind::Comment => s.comment.push_str(code),
            }
        }
    }

    /// Composite state: snapshot the current machine, populate the child,
    /// restore. Arbitrarily deep nesting reduces to this save/restore.
    fn enter_block(&mut self, name: &str, children: &[Node]) -> Result<()> {
        let saved = self.current.clone();

        let mut child = StateMachine::new(name);
        child.class_name = format!("Nested{name}");
        child.enum_name = format!("{}States", child.class_name);
        child.parent = Some(saved.clone());
        self.cur().children.push(name.to_string());
        self.machines.insert(child);

        self.current = name.to_string();
        for node in children {
            self.visit(node)?;
        }
        self.current = saved;
        Ok(())
    }

    fn inject(&mut self, tag: &str, code: &str) -> Result<()> {
        let extra = &mut self.cur().extra;
        match tag.trim_start_matches('[').trim_end_matches(']') {
            "brief" => {
                if !extra.brief.is_empty() {
                    extra.brief.push_str("\n//! ");
                }
                extra.brief.push_str(code);
            }
            "header" => {
                extra.header.push_str(code);
                extra.header.push('\n');
            }
            "footer" => {
                extra.footer.push_str(code);
                extra.footer.push('\n');
            }
            "param" => {
                if !extra.argvs.is_empty() {
                    extra.argvs.push_str(", ");
                }
                extra.argvs.push_str(code);
            }
            "cons" => {
                extra.cons.push_str(", \n          ");
                extra.cons.push_str(code);
            }
            "init" => {
                extra.init.push_str("        ");
                extra.init.push_str(code);
                extra.init.push('\n');
            }
            "code" => {
                if !matches!(code, "public:" | "protected:" | "private:") {
                    extra.code.push_str("    ");
                }
                extra.code.push_str(code);
                extra.code.push('\n');
            }
            "test" => {
                extra.unit_tests.push_str(code);
                extra.unit_tests.push('\n');
            }
            _ => return Err(Error::UnknownTag(tag.to_string())),
        }
        Ok(())
    }

    /// Colliding with a base-class method is a warning, not a hard failure.
    fn check_reserved(&mut self, name: &str) {
        let base = name.split('(').next().unwrap_or(name);
        if RESERVED_NAMES.contains(&base) {
            self.cur().warn(format!(
                "the method name {name} is already used by the base class StateMachine"
            ));
        }
    }
}
