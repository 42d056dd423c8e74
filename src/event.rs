//! Notifications the grid reports to its host.
//!
//! Events are queued on a channel and drained by the host once the handler
//! that produced them has returned, so a host reacting to a change can never
//! observe (or re-enter) a half-applied mutation.

use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use serde_json::Value;

use crate::header::Sorter;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub row: usize,
    pub column: usize,
}

impl Coordinate {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SelectionChange {
    Exact { rows: Vec<usize> },
    Delta { added: Vec<usize>, removed: Vec<usize> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum GridEvent {
    FocusChanged {
        row: usize,
        column: usize,
    },
    EditOpened {
        row: usize,
        column: usize,
    },
    EditClosed {
        row: usize,
        column: usize,
        committed: bool,
    },
    FieldChange {
        before: Value,
        after: Value,
        row: usize,
        column: String,
    },
    RecordChange {
        before: Option<Record>,
        after: Record,
        row: usize,
        column: Option<String>,
    },
    RecordReset {
        record: Record,
        row: usize,
    },
    SelectAllChange {
        selected: bool,
    },
    SelectRecordChange(SelectionChange),
    SortersChange {
        sorters: Vec<Sorter>,
    },
    ColumnWidthChange {
        index: usize,
        width: u16,
    },
}

impl GridEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GridEvent::FocusChanged { .. } => "focus-changed",
            GridEvent::EditOpened { .. } => "edit-opened",
            GridEvent::EditClosed { .. } => "edit-closed",
            GridEvent::FieldChange { .. } => "field-change",
            GridEvent::RecordChange { .. } => "record-change",
            GridEvent::RecordReset { .. } => "record-reset",
            GridEvent::SelectAllChange { .. } => "select-all-change",
            GridEvent::SelectRecordChange(_) => "select-record-change",
            GridEvent::SortersChange { .. } => "sorters-change",
            GridEvent::ColumnWidthChange { .. } => "column-width-change",
        }
    }
}

/// Sending half of the grid's notification queue
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: Sender<GridEvent>,
}

impl Notifier {
    pub fn new(tx: Sender<GridEvent>) -> Self {
        Self { tx }
    }

    /// Unbounded notifier plus the receiver the host drains.
    pub fn channel() -> (Self, Receiver<GridEvent>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: GridEvent) {
        tracing::trace!(event = event.name(), "grid event");
        // host dropped the receiver: nobody is listening, nothing to do
        let _ = self.tx.send(event);
    }
}
