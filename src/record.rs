//! Records and the record set the grid edits.
//!
//! A record carries its field values plus the per-row metadata the grid
//! tracks: the selection flag, the dirty marker and the origin snapshot that a
//! reset restores.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Ordered field name -> value mapping
pub type FieldMap = IndexMap<String, Value>;

/// Dirty marker of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirtyState {
    #[default]
    #[serde(rename = "")]
    Clean,
    #[serde(rename = "M")]
    Modified,
    #[serde(rename = "+")]
    Created,
}

impl DirtyState {
    pub fn marker(self) -> &'static str {
        match self {
            DirtyState::Clean => "",
            DirtyState::Modified => "M",
            DirtyState::Created => "+",
        }
    }

    pub fn is_dirty(self) -> bool {
        self != DirtyState::Clean
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub data: FieldMap,
    pub selected: bool,
    pub dirty: DirtyState,
    /// Field values as loaded; never overwritten once set
    pub origin: Option<FieldMap>,
}

impl Record {
    /// Record supplied by the host: clean, with its own data as origin.
    pub fn loaded(data: FieldMap) -> Self {
        Self {
            origin: Some(data.clone()),
            data,
            selected: false,
            dirty: DirtyState::Clean,
        }
    }

    /// Record appended by the mutation pipeline. It has no origin to reset to.
    pub fn created(data: FieldMap) -> Self {
        Self {
            data,
            selected: false,
            dirty: DirtyState::Created,
            origin: None,
        }
    }

    pub fn get(&self, field: &str) -> &Value {
        self.data.get(field).unwrap_or(&Value::Null)
    }

    /// True when every entry of `patch` already holds the same value.
    pub fn matches(&self, patch: &FieldMap) -> bool {
        patch
            .iter()
            .all(|(name, value)| same_value(self.get(name), value))
    }

    pub fn is_pristine(&self) -> bool {
        self.origin.as_ref().is_some_and(|origin| origin == &self.data)
    }
}

/// Ordered records; the row index is the position in this sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecordSet {
    records: Vec<Record>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record set from host data. Every row is clean and captures its origin.
    pub fn from_rows(rows: Vec<FieldMap>) -> Self {
        Self {
            records: rows.into_iter().map(Record::loaded).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Record> {
        self.records.get(row)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.records.iter_mut()
    }

    pub(crate) fn get_mut(&mut self, row: usize) -> Option<&mut Record> {
        self.records.get_mut(row)
    }

    pub(crate) fn replace(&mut self, row: usize, record: Record) -> Record {
        std::mem::replace(&mut self.records[row], record)
    }

    pub(crate) fn push(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    pub fn dirty_rows(&self) -> impl Iterator<Item = (usize, &Record)> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.dirty.is_dirty())
    }
}

// numbers compare by value, so 3 and 3.0 are the same
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Shorthand for building a field map from literal pairs.
pub fn fields<I, K>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_loaded_record_captures_origin() {
        let record = Record::loaded(fields([("qty", json!(5))]));
        assert_eq!(record.dirty, DirtyState::Clean);
        assert_eq!(record.origin.as_ref(), Some(&record.data));
        assert!(record.is_pristine());
    }

    #[test]
    fn test_created_record_has_no_origin() {
        let record = Record::created(fields([("name", json!("x"))]));
        assert_eq!(record.dirty, DirtyState::Created);
        assert!(record.origin.is_none());
        assert!(!record.is_pristine());
    }

    #[test]
    fn test_matches_treats_missing_field_as_null() {
        let record = Record::loaded(fields([("a", json!(1))]));
        assert!(record.matches(&fields([("a", json!(1))])));
        assert!(record.matches(&fields([("b", Value::Null)])));
        assert!(!record.matches(&fields([("a", json!(2))])));
    }

    #[test]
    fn test_matches_compares_numbers_by_value() {
        let record = Record::loaded(fields([("price", json!(3.0)), ("qty", json!(2))]));
        assert!(record.matches(&fields([("price", json!(3))])));
        assert!(record.matches(&fields([("qty", json!(2.0))])));
        assert!(!record.matches(&fields([("qty", json!("2"))])));
    }

    #[test]
    fn test_dirty_markers() {
        assert_eq!(DirtyState::Clean.marker(), "");
        assert_eq!(DirtyState::Modified.marker(), "M");
        assert_eq!(DirtyState::Created.marker(), "+");
        assert_eq!(serde_json::to_value(DirtyState::Modified).unwrap(), json!("M"));
    }

    #[test]
    fn test_dirty_rows_lists_only_touched_records() {
        let mut set = RecordSet::from_rows(vec![fields([("a", json!(1))]), fields([("a", json!(2))])]);
        set.get_mut(1).unwrap().dirty = DirtyState::Modified;
        let rows: Vec<usize> = set.dirty_rows().map(|(idx, _)| idx).collect();
        assert_eq!(rows, vec![1]);
    }
}
