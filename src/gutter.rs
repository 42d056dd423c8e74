//! Row selector gutter
//!
//! The gutter is an injected leading column holding one checkbox per row plus
//! a select-all checkbox in the header. Toggles turn into reconciler calls
//! and the matching selection events.

use crate::column::Column;
use crate::event::{GridEvent, SelectionChange};
use crate::record::RecordSet;
use crate::selection::{self, SelectionReconciler};

/// Prepend the row selector column when rows are selectable and none is configured.
pub fn with_row_selector(mut columns: Vec<Column>, reconciler: &SelectionReconciler) -> Vec<Column> {
    if reconciler.is_selectable() && !columns.iter().any(Column::is_row_selector) {
        columns.insert(0, Column::row_selector(reconciler.is_multiple()));
    }
    columns
}

/// Header checkbox state: checked while any row is selected.
pub fn header_checked(records: &RecordSet) -> bool {
    selection::any_selected(records)
}

pub fn toggle_header(
    reconciler: &SelectionReconciler,
    records: &mut RecordSet,
    checked: bool,
) -> Option<GridEvent> {
    let selected = checked && reconciler.is_multiple();
    reconciler
        .select_all(records, selected)
        .then_some(GridEvent::SelectAllChange { selected })
}

pub fn toggle_row(
    reconciler: &SelectionReconciler,
    records: &mut RecordSet,
    row: usize,
    checked: bool,
) -> Option<GridEvent> {
    if row >= records.len() {
        return None;
    }
    let change = if reconciler.is_multiple() {
        let (added, removed) = if checked {
            (vec![row], vec![])
        } else {
            (vec![], vec![row])
        };
        if !reconciler.adjust_selection(records, &added, &removed) {
            return None;
        }
        SelectionChange::Delta { added, removed }
    } else {
        let rows = if checked { vec![row] } else { vec![] };
        if !reconciler.set_selection(records, &rows) {
            return None;
        }
        SelectionChange::Exact { rows }
    };
    Some(GridEvent::SelectRecordChange(change))
}
