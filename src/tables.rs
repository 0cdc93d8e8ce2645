//! Per-event transition tables.
//!
//! Groups transitions by named event into the ordered dispatch tables the
//! code generator turns into `static const Transitions` blocks. Row order is
//! diagram-declaration order, which is the dispatch precedence at run time.
//! Only one row per distinct origin state should match at run time; that is
//! a precondition of the generated machine, not re-verified here.

use serde::{Deserialize, Serialize};

use crate::model::{Event, StateMachine};

/// One row of a dispatch table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub origin: String,
    pub destination: String,
    /// Guard expression, `None` when the transition is unguarded.
    pub guard: Option<String>,
    /// Action statement, `None` when the transition has no action.
    pub action: Option<String>,
}

/// The ordered dispatch table of one named event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventTable {
    pub event: Event,
    pub rows: Vec<TableRow>,
}

/// Build one table per named event, in event-declaration order. Anonymous
/// events never get a table: they were folded into internal dispatch by the
/// elaborator.
pub fn event_tables(m: &StateMachine) -> Vec<EventTable> {
    m.dispatch
        .iter()
        .filter(|d| !d.event.name.is_empty())
        .map(|d| EventTable {
            event: d.event.clone(),
            rows: d
                .arcs
                .iter()
                .map(|(origin, destination)| {
                    let tr = m.transition(origin, destination);
                    TableRow {
                        origin: origin.clone(),
                        destination: destination.clone(),
                        guard: tr
                            .map(|t| t.guard.clone())
                            .filter(|g| !g.is_empty()),
                        action: tr
                            .map(|t| t.action.clone())
                            .filter(|a| !a.is_empty()),
                    }
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Transition;

    fn evented(m: &mut StateMachine, from: &str, to: &str, event: &str, guard: &str, action: &str) {
        let ev = Event {
            name: event.to_string(),
            params: Vec::new(),
        };
        m.register_event(&ev, from, to);
        m.add_transition(Transition {
            origin: from.to_string(),
            destination: to.to_string(),
            event: ev,
            guard: guard.to_string(),
            action: action.to_string(),
            arrow: "->".to_string(),
            ..Transition::default()
        });
    }

    #[test]
    fn test_one_table_per_named_event() {
        let mut m = StateMachine::new("t");
        evented(&mut m, "IDLE", "RUNNING", "start", "ready", "logStart");
        evented(&mut m, "RUNNING", "IDLE", "stop", "", "logStop");
        evented(&mut m, "RUNNING", "RUNNING", "tick", "count<3", "increment");

        let tables = event_tables(&m);
        assert_eq!(tables.len(), 3);

        assert_eq!(tables[0].event.name, "start");
        assert_eq!(
            tables[0].rows,
            vec![TableRow {
                origin: "IDLE".to_string(),
                destination: "RUNNING".to_string(),
                guard: Some("ready".to_string()),
                action: Some("logStart".to_string()),
            }]
        );

        assert_eq!(tables[1].event.name, "stop");
        assert_eq!(tables[1].rows[0].guard, None);
        assert_eq!(tables[1].rows[0].action, Some("logStop".to_string()));

        assert_eq!(tables[2].event.name, "tick");
        assert_eq!(tables[2].rows[0].origin, "RUNNING");
        assert_eq!(tables[2].rows[0].destination, "RUNNING");
        assert_eq!(tables[2].rows[0].guard, Some("count<3".to_string()));
    }

    #[test]
    fn test_arcs_keep_declaration_order() {
        let mut m = StateMachine::new("t");
        evented(&mut m, "B", "C", "go", "", "");
        evented(&mut m, "A", "B", "go", "", "");
        let tables = event_tables(&m);
        assert_eq!(tables.len(), 1);
        let origins: Vec<&str> = tables[0].rows.iter().map(|r| r.origin.as_str()).collect();
        assert_eq!(origins, vec!["B", "A"]);
    }

    #[test]
    fn test_event_identity_groups_unrelated_edges() {
        let mut m = StateMachine::new("t");
        evented(&mut m, "A", "B", "go", "", "");
        evented(&mut m, "C", "D", "go", "fast", "");
        let tables = event_tables(&m);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows.len(), 2);
    }
}
