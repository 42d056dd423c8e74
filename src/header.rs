//! Header state: sorters and column widths.
//!
//! The grid never reorders rows itself. Toggling a sorter only updates the
//! sorter list and tells the host, which decides how to re-query.

use serde::{Deserialize, Serialize};

use crate::column::{Column, WidthSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorter {
    pub name: String,
    #[serde(default)]
    pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortState {
    sorters: Vec<Sorter>,
}

impl SortState {
    pub fn new(sorters: Vec<Sorter>) -> Self {
        Self { sorters }
    }

    pub fn sorters(&self) -> &[Sorter] {
        &self.sorters
    }

    /// Cycle a column through ascending -> descending -> unsorted.
    ///
    /// Returns false when the column cannot be sorted.
    pub fn toggle(&mut self, column: &Column) -> bool {
        if !column.sortable || column.is_gutter() {
            return false;
        }
        match self.sorters.iter().position(|s| s.name == column.name) {
            Some(idx) if self.sorters[idx].descending => {
                self.sorters.remove(idx);
            }
            Some(idx) => self.sorters[idx].descending = true,
            None => self.sorters.push(Sorter {
                name: column.name.clone(),
                descending: false,
            }),
        }
        true
    }

    /// Header marker for a column, with its rank when several sorters apply.
    pub fn marker(&self, column: &Column) -> Option<String> {
        if column.is_gutter() {
            return None;
        }
        let idx = self.sorters.iter().position(|s| s.name == column.name)?;
        let arrow = if self.sorters[idx].descending { '▲' } else { '▼' };
        if self.sorters.len() > 1 {
            Some(format!("{arrow}{}", idx + 1))
        } else {
            Some(arrow.to_string())
        }
    }
}

/// Set a fixed width on a resizable column. Zero widths are refused.
pub fn resize_column(column: &mut Column, width: u16) -> bool {
    if !column.resizable || width == 0 {
        return false;
    }
    column.width = Some(WidthSpec::Fixed(width));
    true
}
