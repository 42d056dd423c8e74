//! Row selection rules.

use serde::{Deserialize, Serialize};

use crate::record::RecordSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Single,
    Multiple,
}

/// Owns the rules for the per-record `selected` flags.
///
/// With no mode the rows are not selectable and every operation is a no-op.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionReconciler {
    mode: Option<SelectionMode>,
}

impl SelectionReconciler {
    pub fn new(mode: Option<SelectionMode>) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> Option<SelectionMode> {
        self.mode
    }

    pub fn is_selectable(&self) -> bool {
        self.mode.is_some()
    }

    pub fn is_multiple(&self) -> bool {
        self.mode == Some(SelectionMode::Multiple)
    }

    /// Select or clear every row. Single mode can only clear.
    pub fn select_all(&self, records: &mut RecordSet, selected: bool) -> bool {
        let Some(mode) = self.mode else {
            return false;
        };
        let selected = selected && mode == SelectionMode::Multiple;
        for record in records.iter_mut() {
            record.selected = selected;
        }
        tracing::debug!(selected, "select all");
        true
    }

    /// Replace the selection with exactly `rows`.
    pub fn set_selection(&self, records: &mut RecordSet, rows: &[usize]) -> bool {
        let Some(mode) = self.mode else {
            return false;
        };
        for record in records.iter_mut() {
            record.selected = false;
        }
        let rows = match mode {
            SelectionMode::Single => rows.last().map(std::slice::from_ref).unwrap_or_default(),
            SelectionMode::Multiple => rows,
        };
        for &row in rows {
            if let Some(record) = records.get_mut(row) {
                record.selected = true;
            }
        }
        tracing::debug!(?rows, "selection set");
        true
    }

    /// Clear `removed`, then select `added`.
    ///
    /// In single mode an addition replaces the whole selection.
    pub fn adjust_selection(&self, records: &mut RecordSet, added: &[usize], removed: &[usize]) -> bool {
        let Some(mode) = self.mode else {
            return false;
        };
        for &row in removed {
            if let Some(record) = records.get_mut(row) {
                record.selected = false;
            }
        }
        match (mode, added.last()) {
            (SelectionMode::Single, Some(&row)) => {
                for record in records.iter_mut() {
                    record.selected = false;
                }
                if let Some(record) = records.get_mut(row) {
                    record.selected = true;
                }
            }
            _ => {
                for &row in added {
                    if let Some(record) = records.get_mut(row) {
                        record.selected = true;
                    }
                }
            }
        }
        tracing::debug!(?added, ?removed, "selection adjusted");
        true
    }
}

pub fn selected_rows(records: &RecordSet) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.selected)
        .map(|(idx, _)| idx)
        .collect()
}

pub fn any_selected(records: &RecordSet) -> bool {
    records.iter().any(|r| r.selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::fields;
    use serde_json::json;

    fn rows(n: usize) -> RecordSet {
        RecordSet::from_rows((0..n).map(|i| fields([("id", json!(i))])).collect())
    }

    #[test]
    fn test_multiple_select_all() {
        let mut records = rows(3);
        let sel = SelectionReconciler::new(Some(SelectionMode::Multiple));
        assert!(sel.select_all(&mut records, true));
        assert_eq!(selected_rows(&records), vec![0, 1, 2]);
        sel.select_all(&mut records, false);
        assert!(!any_selected(&records));
    }

    #[test]
    fn test_single_select_all_only_clears() {
        let mut records = rows(3);
        let sel = SelectionReconciler::new(Some(SelectionMode::Single));
        sel.set_selection(&mut records, &[1]);
        sel.select_all(&mut records, true);
        assert!(selected_rows(&records).is_empty());
    }

    #[test]
    fn test_single_set_selection_keeps_last() {
        let mut records = rows(4);
        let sel = SelectionReconciler::new(Some(SelectionMode::Single));
        sel.set_selection(&mut records, &[0, 3, 2]);
        assert_eq!(selected_rows(&records), vec![2]);
    }

    #[test]
    fn test_single_adjust_replaces_selection() {
        let mut records = rows(3);
        let sel = SelectionReconciler::new(Some(SelectionMode::Single));
        sel.adjust_selection(&mut records, &[0], &[]);
        sel.adjust_selection(&mut records, &[2], &[]);
        assert_eq!(selected_rows(&records), vec![2]);
        sel.adjust_selection(&mut records, &[], &[2]);
        assert!(selected_rows(&records).is_empty());
    }

    #[test]
    fn test_multiple_adjust() {
        let mut records = rows(4);
        let sel = SelectionReconciler::new(Some(SelectionMode::Multiple));
        sel.set_selection(&mut records, &[0, 1]);
        sel.adjust_selection(&mut records, &[3, 9], &[0]);
        assert_eq!(selected_rows(&records), vec![1, 3]);
    }

    #[test]
    fn test_disabled_selection_is_noop() {
        let mut records = rows(2);
        let sel = SelectionReconciler::new(None);
        assert!(!sel.select_all(&mut records, true));
        assert!(!sel.set_selection(&mut records, &[0]));
        assert!(!sel.adjust_selection(&mut records, &[1], &[]));
        assert!(!any_selected(&records));
    }
}
