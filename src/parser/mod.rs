//! Diagram parser.
//!
//! Parses the PlantUML statechart subset into the typed tree of `ast::Node`
//! values the model builder consumes. Guard and action bodies are captured
//! verbatim; nothing here interprets user code.

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use thiserror::Error;

use crate::ast::{AnnotationKind, Label, Node, TransitionNode};


#[derive(Parser)]
#[grammar = "parser/statechart.pest"]
pub struct StatechartParser;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("diagram syntax error: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Parse diagram text into the flat list of top-level tree nodes.
pub fn parse_diagram(source: &str) -> ParseResult<Vec<Node>> {
    let mut pairs = StatechartParser::parse(Rule::file, source).map_err(Box::new)?;
    let file = pairs.next().expect("grammar yields one file node");
    Ok(collect_items(file))
}

fn collect_items(pair: Pair<Rule>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::transition => nodes.push(parse_transition(item)),
            Rule::annotation => nodes.push(parse_annotation(item)),
            Rule::state_block => nodes.push(parse_state_block(item)),
            Rule::injection => nodes.push(parse_injection(item)),
            _ => {}
        }
    }
    nodes
}

fn parse_transition(pair: Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let lhs = inner.next().unwrap().as_str().to_string();
    let arrow = inner.next().unwrap().as_str().to_string();
    let rhs = inner.next().unwrap().as_str().to_string();
    let label = inner.next().map(parse_label);
    Node::Transition(TransitionNode {
        lhs,
        arrow,
        rhs,
        label,
    })
}

fn parse_label(pair: Pair<Rule>) -> Label {
    let mut label = Label::default();
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::event_clause => parse_event_clause(item, &mut label),
            Rule::guard_clause => {
                let text = item.into_inner().next().unwrap().as_str();
                label.guard = Some(text.trim().to_string());
            }
            Rule::action_clause => {
                let text = item.into_inner().next().unwrap().as_str();
                label.action = Some(text.trim().to_string());
            }
            _ => {}
        }
    }
    label
}

fn parse_event_clause(pair: Pair<Rule>, label: &mut Label) {
    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::ident => label.event_words.push(item.as_str().to_string()),
            Rule::params => {
                let params = item.into_inner().map(|p| p.as_str().to_string()).collect();
                label.params = Some(params);
            }
            _ => {}
        }
    }
}

fn parse_annotation(pair: Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let state = inner.next().unwrap().as_str().to_string();
    let body = inner.next().unwrap();
    match body.as_rule() {
        Rule::entry_ann | Rule::exit_ann | Rule::activity_ann | Rule::comment_ann => {
            let kind = match body.as_rule() {
                Rule::entry_ann => AnnotationKind::Entry,
                Rule::exit_ann => AnnotationKind::Exit,
                Rule::activity_ann => AnnotationKind::Activity,
                _ => AnnotationKind::Comment,
            };
            let code = body.into_inner().next().unwrap().as_str().trim().to_string();
            Node::StateAnnotation { state, kind, code }
        }
        Rule::on_ann => {
            let mut label = Label::default();
            for item in body.into_inner() {
                match item.as_rule() {
                    Rule::event_clause => parse_event_clause(item, &mut label),
                    Rule::guard_clause => {
                        let text = item.into_inner().next().unwrap().as_str();
                        label.guard = Some(text.trim().to_string());
                    }
                    Rule::action_clause => {
                        let text = item.into_inner().next().unwrap().as_str();
                        label.action = Some(text.trim().to_string());
                    }
                    _ => {}
                }
            }
            Node::StateOn { state, label }
        }
        rule => unreachable!("unexpected annotation body {rule:?}"),
    }
}

fn parse_state_block(pair: Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let name = inner.next().unwrap().as_str().to_string();
    let children = inner
        .filter_map(|item| match item.as_rule() {
            Rule::transition => Some(parse_transition(item)),
            Rule::annotation => Some(parse_annotation(item)),
            Rule::state_block => Some(parse_state_block(item)),
            Rule::injection => Some(parse_injection(item)),
            _ => None,
        })
        .collect();
    Node::StateBlock { name, children }
}

fn parse_injection(pair: Pair<Rule>) -> Node {
    let mut inner = pair.into_inner();
    let tag = inner.next().unwrap().as_str().to_string();
    let code = inner
        .next()
        .map(|p| p.as_str().trim().to_string())
        .unwrap_or_default();
    Node::CodeInjection { tag, code }
}
