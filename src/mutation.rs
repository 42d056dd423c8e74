//! Record mutations with dirty tracking.
//!
//! Every change to record data goes through [`MutationPipeline`]. It validates
//! the change, drops no-op edits, stamps the dirty marker and reports the
//! before/after records to the host.

use serde_json::Value;

use crate::column::Column;
use crate::event::{GridEvent, Notifier};
use crate::record::{DirtyState, FieldMap, Record, RecordSet};

/// A change that passed validation, ready to be stored.
struct Staged {
    row: usize,
    before: Option<Record>,
    after: Record,
}

#[derive(Debug, Clone)]
pub struct MutationPipeline {
    notifier: Notifier,
}

impl MutationPipeline {
    pub fn new(notifier: Notifier) -> Self {
        Self { notifier }
    }

    /// Merge `patch` into the record at `row`, appending when the row does
    /// not exist yet. Returns the row the change landed on.
    pub fn apply_change(
        &self,
        records: &mut RecordSet,
        row: usize,
        patch: FieldMap,
        column: Option<&Column>,
    ) -> Option<usize> {
        let staged = stage(records, row, patch, column)?;
        Some(self.store(records, staged, column.map(|c| c.name.clone())))
    }

    /// Field-level change from a committed edit: reports the field values
    /// first, then the record change.
    pub fn commit_field(
        &self,
        records: &mut RecordSet,
        row: usize,
        column: &Column,
        value: Value,
    ) -> bool {
        let before = records
            .get(row)
            .map(|r| r.get(&column.name).clone())
            .unwrap_or(Value::Null);
        let patch = FieldMap::from([(column.name.clone(), value.clone())]);
        let Some(staged) = stage(records, row, patch, Some(column)) else {
            return false;
        };
        self.notifier.emit(GridEvent::FieldChange {
            before,
            after: value,
            row: staged.row,
            column: column.name.clone(),
        });
        self.store(records, staged, Some(column.name.clone()));
        true
    }

    /// Restore a record to its origin. Records without an origin, or already
    /// clean, are left alone.
    pub fn reset(&self, records: &mut RecordSet, row: usize) -> bool {
        let Some(current) = records.get(row) else {
            return false;
        };
        let Some(origin) = current.origin.clone() else {
            tracing::debug!(row, "reset skipped: record has no origin");
            return false;
        };
        if current.dirty == DirtyState::Clean && current.data == origin {
            return false;
        }

        let before = current.clone();
        let after = Record {
            data: origin.clone(),
            selected: before.selected,
            dirty: DirtyState::Clean,
            origin: Some(origin),
        };
        self.notifier.emit(GridEvent::RecordReset {
            record: after.clone(),
            row,
        });
        self.store(
            records,
            Staged {
                row,
                before: Some(before),
                after,
            },
            None,
        );
        true
    }

    fn store(&self, records: &mut RecordSet, staged: Staged, column: Option<String>) -> usize {
        let Staged { row, before, after } = staged;
        let row = if before.is_some() {
            records.replace(row, after.clone());
            row
        } else {
            records.push(after.clone())
        };
        tracing::debug!(row, dirty = after.dirty.marker(), "record changed");
        self.notifier.emit(GridEvent::RecordChange {
            before,
            after,
            row,
            column,
        });
        row
    }
}

fn stage(
    records: &RecordSet,
    row: usize,
    patch: FieldMap,
    column: Option<&Column>,
) -> Option<Staged> {
    let before = records.get(row).cloned();

    if let Some((column, validator)) = column.and_then(|c| c.validation.as_ref().map(|v| (c, v))) {
        let blank = Record::created(FieldMap::new());
        let record = before.as_ref().unwrap_or(&blank);
        let next = patch.get(&column.name).unwrap_or(&Value::Null);
        if !validator.check(next, record.get(&column.name), record, column) {
            tracing::debug!(row, column = %column.name, "change rejected by validation");
            return None;
        }
    }

    if before.as_ref().is_some_and(|current| current.matches(&patch)) {
        tracing::debug!(row, "change dropped: values unchanged");
        return None;
    }

    let after = match &before {
        Some(current) => {
            let mut data = current.data.clone();
            data.extend(patch);
            Record {
                data,
                selected: current.selected,
                dirty: match current.dirty {
                    DirtyState::Created => DirtyState::Created,
                    _ => DirtyState::Modified,
                },
                origin: current.origin.clone(),
            }
        }
        None => Record::created(patch),
    };

    Some(Staged {
        row: if before.is_some() { row } else { records.len() },
        before,
        after,
    })
}
