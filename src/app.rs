use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use datagrid::editor::display_value;
use datagrid::event::SelectionChange;
use datagrid::{Coordinate, DataGrid, GridConfig, GridEvent, InputSurface, Notifier, RecordSet};

use crate::db::{ColumnInfo, DBRequest, DBResponse};
use crate::ui::{GridLayout, HitTarget};

const DOUBLE_CLICK: Duration = Duration::from_millis(400);
const RESIZE_STEP: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Tables,
    Data,
}

pub struct App {
    pub should_quit: bool,
    pub status: String,

    // Schema
    pub tables: Vec<String>,
    pub selected_table: usize,

    /// Which pane receives keys
    pub pane: Pane,

    // Grid
    pub grid: Option<DataGrid>,
    pub loaded_table: Option<String>,
    requested_table: Option<String>,
    pub limit: usize,
    config: GridConfig,
    notifier: Notifier,
    events: Receiver<GridEvent>,
    surface: InputSurface,
    /// Set while the terminal window has focus
    terminal_focused: bool,

    /// Layout of the last drawn frame, for hit-testing and reveal
    pub layout: Option<GridLayout>,
    last_click: Option<(Coordinate, Instant)>,

    // Channels
    pub req_tx: Sender<DBRequest>,
    pub resp_rx: Receiver<DBResponse>,
}

impl App {
    pub fn new(
        limit: usize,
        config: GridConfig,
        req_tx: Sender<DBRequest>,
        resp_rx: Receiver<DBResponse>,
    ) -> Self {
        let (notifier, events) = Notifier::channel();
        Self {
            should_quit: false,
            status: "Enter opens a table | Tab switches panes | Ctrl+Q quits".into(),
            tables: vec![],
            selected_table: 0,
            pane: Pane::Tables,
            grid: None,
            loaded_table: None,
            requested_table: None,
            limit,
            config,
            notifier,
            events,
            surface: InputSurface::new(),
            terminal_focused: true,
            layout: None,
            last_click: None,
            req_tx,
            resp_rx,
        }
    }

    pub fn request_schema_refresh(&mut self) {
        let _ = self.req_tx.send(DBRequest::LoadSchema);
        self.status = "Loading schema...".into();
    }

    pub fn current_table_name(&self) -> Option<&str> {
        self.tables.get(self.selected_table).map(|s| s.as_str())
    }

    pub fn load_selected_table(&mut self) {
        if let Some(table) = self.current_table_name().map(|s| s.to_string()) {
            // a different table starts from a fresh grid
            if self.loaded_table.as_deref() != Some(table.as_str())
                && let Some(mut old) = self.grid.take()
            {
                old.focus_out(&mut self.surface);
                self.loaded_table = None;
            }
            self.request_table(table);
        }
    }

    /// Open a table by name, e.g. from the command line.
    pub fn open_table(&mut self, table: String) {
        self.request_table(table);
    }

    fn request_table(&mut self, table: String) {
        self.requested_table = Some(table.clone());
        let sorters = self
            .grid
            .as_ref()
            .map(|g| g.sorters().to_vec())
            .unwrap_or_else(|| self.config.sorters.clone());
        let _ = self.req_tx.send(DBRequest::LoadTable {
            table,
            limit: self.limit,
            sorters,
        });
        self.status = "Loading table...".into();
    }

    pub fn reload_current_table(&mut self) {
        if let Some(table) = self.loaded_table.clone() {
            self.request_table(table);
        }
    }

    pub fn move_table_selection_up(&mut self) {
        if self.tables.is_empty() {
            return;
        }
        if self.selected_table == 0 {
            self.selected_table = self.tables.len() - 1;
        } else {
            self.selected_table -= 1;
        }
    }

    pub fn move_table_selection_down(&mut self) {
        if self.tables.is_empty() {
            return;
        }
        self.selected_table = (self.selected_table + 1) % self.tables.len();
    }

    pub fn handle_db_response(&mut self, resp: DBResponse) {
        match resp {
            DBResponse::Schema { tables } => {
                self.tables = tables;
                if let Some(idx) = self
                    .requested_table
                    .as_ref()
                    .and_then(|t| self.tables.iter().position(|name| name == t))
                {
                    self.selected_table = idx;
                }
                if self.selected_table >= self.tables.len() {
                    self.selected_table = 0;
                }
                self.status = format!("Loaded {} tables", self.tables.len());
            }
            DBResponse::TableData {
                table,
                columns,
                records,
            } => {
                let count = records.len();
                let records = RecordSet::from_rows(records);
                let same_table = self.loaded_table.as_deref() == Some(table.as_str());
                if let (true, Some(grid)) = (same_table, self.grid.as_mut()) {
                    grid.set_records(records);
                } else {
                    let mut grid = self.build_grid(&columns, records);
                    grid.move_focus_to(Coordinate::new(0, 0));
                    self.grid = Some(grid);
                    self.set_pane(Pane::Data);
                }
                self.loaded_table = Some(table.clone());
                self.status = format!("{table}: {count} rows (edits stay in memory)");
            }
            DBResponse::Error(e) => {
                self.status = format!("Error: {e}");
            }
        }
    }

    fn build_grid(&self, columns: &[ColumnInfo], records: RecordSet) -> DataGrid {
        let mut config = self.config.clone();
        if config.columns.is_empty() {
            config.columns = columns.iter().map(ColumnInfo::to_column).collect();
        }
        DataGrid::new(config, records, self.notifier.clone())
    }

    /// Switch panes; the grid only listens for keys while its pane is active.
    pub fn set_pane(&mut self, pane: Pane) {
        self.pane = pane;
        self.sync_grid_focus();
    }

    pub fn toggle_pane(&mut self) {
        let next = match self.pane {
            Pane::Tables if self.grid.is_some() => Pane::Data,
            _ => Pane::Tables,
        };
        self.set_pane(next);
    }

    pub fn set_terminal_focus(&mut self, focused: bool) {
        self.terminal_focused = focused;
        self.sync_grid_focus();
    }

    fn sync_grid_focus(&mut self) {
        let wants = self.pane == Pane::Data && self.terminal_focused;
        if let Some(grid) = self.grid.as_mut() {
            if wants {
                grid.focus_in(&mut self.surface);
            } else {
                grid.focus_out(&mut self.surface);
            }
        }
    }

    /// Returns true when the screen needs redrawing.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        if key.kind == KeyEventKind::Release {
            return false;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return false;
        }
        match self.pane {
            Pane::Tables => self.on_tables_key(key.code),
            Pane::Data => self.on_data_key(key),
        }
        true
    }

    fn on_tables_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.move_table_selection_up(),
            KeyCode::Down => self.move_table_selection_down(),
            KeyCode::Enter => self.load_selected_table(),
            KeyCode::Tab => self.toggle_pane(),
            _ => {}
        }
    }

    fn on_data_key(&mut self, key: KeyEvent) {
        let Some(grid) = self.grid.as_mut() else {
            self.set_pane(Pane::Tables);
            return;
        };
        if grid.handle_key(&key) {
            return;
        }
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            if key.code == KeyCode::Esc {
                self.set_pane(Pane::Tables);
            }
            return;
        }
        let focus = grid.focus();
        match key.code {
            KeyCode::Left | KeyCode::Right => {
                let Some(f) = focus else { return };
                let current = self
                    .layout
                    .as_ref()
                    .and_then(|l| l.column_width(f.column))
                    .unwrap_or(8);
                let width = if key.code == KeyCode::Left {
                    current.saturating_sub(RESIZE_STEP)
                } else {
                    current.saturating_add(RESIZE_STEP)
                };
                if !grid.resize_column(f.column, width) {
                    self.status = "Column cannot be resized".into();
                }
            }
            KeyCode::Char('s') => {
                if let Some(f) = focus
                    && !grid.toggle_sort(f.column)
                {
                    self.status = "Column is not sortable".into();
                }
            }
            KeyCode::Char('r') => {
                if let Some(f) = focus
                    && !grid.reset_record(f.row)
                {
                    self.status = "Nothing to reset".into();
                }
            }
            KeyCode::Char('a') => {
                let checked = !grid.header_checked();
                if !grid.toggle_header_checkbox(checked) {
                    self.status = "Rows are not selectable".into();
                }
            }
            KeyCode::Char('x') => {
                if let Some(f) = focus {
                    let checked = grid.records().get(f.row).is_some_and(|r| !r.selected);
                    if !grid.toggle_row_checkbox(f.row, checked) {
                        self.status = "Rows are not selectable".into();
                    }
                }
            }
            KeyCode::Char('n') => {
                grid.append_row();
            }
            _ => {}
        }
    }

    pub fn on_mouse(&mut self, mouse: MouseEvent) -> bool {
        let Some(layout) = self.layout.as_ref() else {
            return false;
        };
        let hit = layout.hit_test(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::ScrollDown | MouseEventKind::ScrollUp => {
                let delta = if mouse.kind == MouseEventKind::ScrollDown { 3 } else { -3 };
                match (self.grid.as_mut(), hit) {
                    (Some(grid), Some(HitTarget::Body(_))) => grid.scroll_rows(delta),
                    _ => false,
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                match hit {
                    Some(HitTarget::Table(idx)) => {
                        if idx < self.tables.len() {
                            self.selected_table = idx;
                        }
                        self.set_pane(Pane::Tables);
                    }
                    Some(HitTarget::Header(column)) => {
                        self.set_pane(Pane::Data);
                        self.click_header(column);
                    }
                    Some(HitTarget::Body(target)) => {
                        self.set_pane(Pane::Data);
                        self.click_cell(target);
                    }
                    None => {}
                }
                true
            }
            _ => false,
        }
    }

    fn click_header(&mut self, column: usize) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        if grid.column(column).is_some_and(|c| c.is_row_selector()) {
            let checked = !grid.header_checked();
            grid.toggle_header_checkbox(checked);
        } else {
            grid.toggle_sort(column);
        }
    }

    fn click_cell(&mut self, target: Option<Coordinate>) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        let now = Instant::now();
        let double = match (self.last_click, target) {
            (Some((prev, at)), Some(coord)) => prev == coord && now.duration_since(at) <= DOUBLE_CLICK,
            _ => false,
        };
        self.last_click = target.map(|c| (c, now));

        if let Some(coord) = target
            && grid.column(coord.column).is_some_and(|c| c.is_row_selector())
        {
            let checked = grid.records().get(coord.row).is_some_and(|r| !r.selected);
            grid.toggle_row_checkbox(coord.row, checked);
            grid.focus_from_pointer(target);
            return;
        }
        if double {
            self.last_click = None;
            grid.request_edit_for_double_click(target);
        } else {
            grid.focus_from_pointer(target);
        }
    }

    /// Second phase of a focus move, run after a frame is drawn.
    pub fn after_render(&mut self) -> bool {
        match (self.grid.as_mut(), self.layout.as_ref()) {
            (Some(grid), Some(layout)) => grid.after_render(layout),
            _ => false,
        }
    }

    /// Drain grid notifications. Returns true if anything arrived.
    pub fn drain_grid_events(&mut self) -> bool {
        let events: Vec<GridEvent> = self.events.try_iter().collect();
        for event in &events {
            tracing::debug!(event = event.name(), "grid notification");
            match event {
                GridEvent::FieldChange {
                    before,
                    after,
                    row,
                    column,
                } => {
                    self.status = format!(
                        "Row {row} {column}: {} -> {}",
                        display_value(before),
                        display_value(after)
                    );
                }
                GridEvent::RecordChange {
                    before: None, row, ..
                } => {
                    self.status = format!("Row {row} added");
                }
                GridEvent::RecordReset { row, .. } => {
                    self.status = format!("Row {row} reset");
                }
                GridEvent::SelectAllChange { selected } => {
                    self.status = if *selected {
                        "All rows selected".into()
                    } else {
                        "Selection cleared".into()
                    };
                }
                GridEvent::SelectRecordChange(change) => {
                    let rows = match change {
                        SelectionChange::Exact { rows } => rows.clone(),
                        SelectionChange::Delta { .. } => self
                            .grid
                            .as_ref()
                            .map(|g| g.selected_rows())
                            .unwrap_or_default(),
                    };
                    self.status = format!("Selected rows: {rows:?}");
                }
                GridEvent::SortersChange { sorters } => {
                    let text: Vec<String> = sorters
                        .iter()
                        .map(|s| format!("{} {}", s.name, if s.descending { "desc" } else { "asc" }))
                        .collect();
                    self.status = format!("Sort: {}", text.join(", "));
                    self.reload_current_table();
                }
                GridEvent::ColumnWidthChange { index, width } => {
                    self.status = format!("Column {index} width {width}");
                }
                GridEvent::EditClosed {
                    committed: false, ..
                } => {
                    self.status = "Edit discarded".into();
                }
                _ => {}
            }
        }
        !events.is_empty()
    }
}
