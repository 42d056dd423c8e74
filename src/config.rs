//! Grid configuration
//!
//! Loaded from an optional JSON file:
//!
//! ```json
//! {
//!   "columns": [{ "name": "qty", "type": "integer", "record": { "editable": true } }],
//!   "rows": { "selectable": { "multiple": true } },
//!   "pagination": { "infinite": false },
//!   "sorters": [{ "name": "qty", "descending": true }]
//! }
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::column::Column;
use crate::header::Sorter;
use crate::selection::SelectionMode;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: Vec<Column>,
    pub rows: RowsConfig,
    pub pagination: PaginationConfig,
    pub sorters: Vec<Sorter>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RowsConfig {
    /// Absent: rows cannot be selected
    pub selectable: Option<SelectableConfig>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SelectableConfig {
    pub multiple: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Infinite lists have no footer
    pub infinite: bool,
}

impl GridConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read grid config {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse grid config {}", path.display()))?;
        tracing::info!(
            columns = config.columns.len(),
            "Loaded grid config from {}",
            path.display()
        );
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        self.rows.selectable.map(|s| {
            if s.multiple {
                SelectionMode::Multiple
            } else {
                SelectionMode::Single
            }
        })
    }

    pub fn set_selection_mode(&mut self, mode: Option<SelectionMode>) {
        self.rows.selectable = mode.map(|mode| SelectableConfig {
            multiple: mode == SelectionMode::Multiple,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = GridConfig::from_json("{}").unwrap();
        assert!(config.columns.is_empty());
        assert_eq!(config.selection_mode(), None);
        assert!(!config.pagination.infinite);
    }

    #[test]
    fn test_parse_full_config() {
        let config = GridConfig::from_json(
            r#"{
                "columns": [
                    { "name": "qty", "type": "integer", "record": { "editable": true }, "sortable": true },
                    { "name": "id", "hidden": true }
                ],
                "rows": { "selectable": { "multiple": true } },
                "pagination": { "infinite": true },
                "sorters": [{ "name": "qty", "descending": true }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.columns.len(), 2);
        assert_eq!(config.columns[0].data_type, ColumnType::Integer);
        assert!(config.columns[0].is_editable());
        assert!(config.columns[1].hidden);
        assert_eq!(config.selection_mode(), Some(SelectionMode::Multiple));
        assert!(config.sorters[0].descending);
    }

    #[test]
    fn test_selection_override() {
        let mut config = GridConfig::default();
        config.set_selection_mode(Some(SelectionMode::Single));
        assert_eq!(config.selection_mode(), Some(SelectionMode::Single));
        config.set_selection_mode(None);
        assert_eq!(config.selection_mode(), None);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = GridConfig::load(Path::new("/nonexistent/grid.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/grid.json"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(GridConfig::from_json("{ columns: ").is_err());
    }
}
