//! Typed syntax-tree shape consumed by the model builder.
//!
//! The parser flattens the diagram text into these nodes; the builder never
//! touches raw text. Guard expressions and action statements stay opaque
//! strings from here on out.

use serde::{Deserialize, Serialize};

/// One node of the diagram tree, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// `origin ARROW destination [: event [guard] / action]`
    Transition(TransitionNode),
    /// `state Name { ... }` composite state holding a nested machine.
    StateBlock { name: String, children: Vec<Node> },
    /// `Name : entry / code` and friends.
    StateAnnotation {
        state: String,
        kind: AnnotationKind,
        code: String,
    },
    /// `Name : on event [guard] / action` — becomes a self-loop transition.
    StateOn { state: String, label: Label },
    /// `'[tag] code` comment splicing user code into the generated class.
    CodeInjection { tag: String, code: String },
}

/// Which state field a `Name : kind / code` line feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationKind {
    Entry,
    Exit,
    Activity,
    Comment,
}

/// The three positional tokens of a transition line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionNode {
    /// Left-hand state token as written.
    pub lhs: String,
    /// Arrow token; a leading `<` means the sides are swapped.
    pub arrow: String,
    /// Right-hand state token as written.
    pub rhs: String,
    /// Optional `event [guard] / action` suffix.
    pub label: Option<Label>,
}

/// Parsed `event [guard] / action` suffix of a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Label {
    /// Raw event words, in order. Empty for an event-less transition.
    pub event_words: Vec<String>,
    /// Parameter names when the event carries a `(a, b)` list.
    pub params: Option<Vec<String>>,
    /// Guard expression without its brackets.
    pub guard: Option<String>,
    /// Action statement without its leading slash.
    pub action: Option<String>,
}
