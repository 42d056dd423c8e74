//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use datagrid::column::ColumnType;
use datagrid::record::fields;
use datagrid::{Column, DataGrid, GridConfig, GridEvent, InputSurface, Notifier, RecordSet, SelectionMode};
use serde_json::json;

pub fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

pub fn type_keys(grid: &mut DataGrid, codes: &[KeyCode]) {
    for &code in codes {
        grid.handle_key(&press(code));
    }
}

/// `n` rows of `name`/`qty`, plus a hidden `id`
pub fn inventory(n: usize) -> RecordSet {
    RecordSet::from_rows(
        (0..n)
            .map(|i| {
                fields([
                    ("id", json!(i)),
                    ("name", json!(format!("item{i}"))),
                    ("qty", json!(i * 10)),
                ])
            })
            .collect(),
    )
}

pub fn inventory_columns() -> Vec<Column> {
    vec![
        Column::new("id", ColumnType::Integer).hidden(true),
        Column::new("name", ColumnType::String).editable(true).sortable(true),
        Column::new("qty", ColumnType::Integer).editable(true),
    ]
}

pub struct Harness {
    pub grid: DataGrid,
    pub surface: InputSurface,
    pub events: Receiver<GridEvent>,
}

impl Harness {
    pub fn new(columns: Vec<Column>, records: RecordSet, selection: Option<SelectionMode>) -> Self {
        let mut config = GridConfig {
            columns,
            ..GridConfig::default()
        };
        config.set_selection_mode(selection);
        let (notifier, events) = Notifier::channel();
        let mut grid = DataGrid::new(config, records, notifier);
        let mut surface = InputSurface::new();
        grid.focus_in(&mut surface);
        Self {
            grid,
            surface,
            events,
        }
    }

    pub fn inventory(rows: usize) -> Self {
        Self::new(inventory_columns(), inventory(rows), None)
    }

    pub fn drain(&self) -> Vec<GridEvent> {
        self.events.try_iter().collect()
    }

    pub fn drain_names(&self) -> Vec<&'static str> {
        self.events.try_iter().map(|e| e.name()).collect()
    }
}
