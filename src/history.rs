//! Append-only transcript store.

use std::collections::HashSet;

use crate::model::{CallId, Turn};

/// Ordered log of conversation turns for one chat session.
///
/// The store only appends and swaps; it does no validation and no I/O.
/// Pairing of tool calls and results is the orchestrator's contract,
/// checkable with [`unresolved_calls`].
#[derive(Debug, Default, Clone)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one turn to the log.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// A copy of the transcript in insertion order.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Swap in a transcript, e.g. one restored from [`snapshot`](Self::snapshot).
    pub fn replace(&mut self, turns: Vec<Turn>) {
        self.turns = turns;
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

/// Ids of tool calls in `turns` that have no matching result.
///
/// Counts both calls carried on assistant turns and the dispatch entries
/// the orchestrator appends. The orchestrator keeps this empty at every
/// model invocation; tests use it to verify the pairing end to end.
pub fn unresolved_calls(turns: &[Turn]) -> Vec<CallId> {
    let mut resolved = HashSet::new();
    for turn in turns {
        if let Turn::ToolResult(result) = turn {
            resolved.insert(result.id.clone());
        }
    }

    let mut open = Vec::new();
    let mut note = |id: &CallId| {
        if !resolved.contains(id) && !open.contains(id) {
            open.push(id.clone());
        }
    };
    for turn in turns {
        match turn {
            Turn::Assistant { calls, .. } => {
                for call in calls {
                    note(&call.id);
                }
            }
            Turn::ToolCall(call) => note(&call.id),
            _ => {}
        }
    }
    open
}
