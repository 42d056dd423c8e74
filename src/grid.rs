//! The grid: focus, editing, selection and mutations behind one entry point.
//!
//! [`DataGrid`] owns all mutable grid state. Hosts feed it key and pointer
//! input, call [`DataGrid::after_render`] once a frame is on screen, and drain
//! the [`GridEvent`](crate::event::GridEvent) queue afterwards.

use crossterm::event::KeyEvent;
use serde_json::Value;

use crate::column::{self, Column};
use crate::config::{GridConfig, PaginationConfig};
use crate::edit::{EditSession, EditSessionManager, OpenOutcome};
use crate::editor::{self, RawInput};
use crate::event::{Coordinate, GridEvent, Notifier};
use crate::focus::{FocusController, GridBounds, InputSurface};
use crate::geometry::{self, ScrollOffsets, ViewGeometry};
use crate::gutter;
use crate::header::{self, SortState, Sorter};
use crate::keys::{self, Direction, GridAction, Mode};
use crate::mutation::MutationPipeline;
use crate::record::{FieldMap, RecordSet};
use crate::selection::{self, SelectionMode, SelectionReconciler};

#[derive(Debug)]
pub struct DataGrid {
    columns: Vec<Column>,
    records: RecordSet,
    focus: FocusController,
    edit: EditSessionManager,
    selection: SelectionReconciler,
    pipeline: MutationPipeline,
    sort: SortState,
    scroll: ScrollOffsets,
    pagination: PaginationConfig,
    notifier: Notifier,
}

fn visible_column(columns: &[Column], idx: usize) -> Option<&Column> {
    columns.iter().filter(|c| !c.hidden).nth(idx)
}

impl DataGrid {
    pub fn new(config: GridConfig, records: RecordSet, notifier: Notifier) -> Self {
        let selection = SelectionReconciler::new(config.selection_mode());
        Self {
            columns: gutter::with_row_selector(config.columns, &selection),
            records,
            focus: FocusController::new(),
            edit: EditSessionManager::new(),
            selection,
            pipeline: MutationPipeline::new(notifier.clone()),
            sort: SortState::new(config.sorters),
            scroll: ScrollOffsets::default(),
            pagination: config.pagination,
            notifier,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn visible_columns(&self) -> Vec<&Column> {
        column::visible_columns(&self.columns)
    }

    pub fn column(&self, visible_idx: usize) -> Option<&Column> {
        visible_column(&self.columns, visible_idx)
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds::new(self.records.len(), self.visible_columns().len())
    }

    pub fn focus(&self) -> Option<Coordinate> {
        self.focus.focus()
    }

    pub fn edit_target(&self) -> Option<Coordinate> {
        self.edit.target()
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.edit.session()
    }

    pub fn editor_buffer(&self) -> Option<String> {
        self.edit.buffer()
    }

    pub fn mode(&self) -> Mode {
        if self.edit.is_open() {
            Mode::Editing
        } else {
            Mode::Navigating
        }
    }

    pub fn scroll(&self) -> ScrollOffsets {
        self.scroll
    }

    pub fn sorters(&self) -> &[Sorter] {
        self.sort.sorters()
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn selection_mode(&self) -> Option<SelectionMode> {
        self.selection.mode()
    }

    pub fn pagination(&self) -> PaginationConfig {
        self.pagination
    }

    pub fn selected_rows(&self) -> Vec<usize> {
        selection::selected_rows(&self.records)
    }

    pub fn header_checked(&self) -> bool {
        gutter::header_checked(&self.records)
    }

    // ---- input focus ----

    pub fn focus_in(&mut self, surface: &mut InputSurface) -> bool {
        self.focus.focus_in(surface)
    }

    /// Losing focus discards any pending edit, as Escape does.
    pub fn focus_out(&mut self, surface: &mut InputSurface) -> bool {
        self.cancel_edit();
        self.focus.focus_out(surface)
    }

    pub fn has_key_listener(&self) -> bool {
        self.focus.has_listener()
    }

    /// Route a key. Returns true when the grid consumed it.
    ///
    /// Keys are only routed while the grid holds a key listener.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if !self.focus.has_listener() {
            return false;
        }
        let outcome = keys::route(key, self.mode());
        match outcome.action {
            GridAction::Move(direction) => {
                self.step(direction);
            }
            GridAction::BeginEdit { seed } => {
                if let Some(focus) = self.focus.focus() {
                    self.open_edit(focus, seed);
                }
            }
            GridAction::EndEdit { commit } => {
                self.end_edit(commit);
            }
            GridAction::EndEditAndAdvance => {
                self.end_edit(true);
                self.step(Direction::Right);
            }
            GridAction::Delegate(key) => {
                self.edit.delegate(&key);
            }
            GridAction::Ignore => {}
        }
        outcome.handled
    }

    // ---- focus ----

    fn step(&mut self, direction: Direction) -> bool {
        let bounds = self.bounds();
        let changed = self.focus.step(direction, bounds);
        self.notify_focus(changed);
        changed
    }

    pub fn move_focus_to(&mut self, coord: Coordinate) -> bool {
        let bounds = self.bounds();
        self.cancel_edit_unless(bounds.clamp(coord));
        let changed = self.focus.move_focus_to(coord, bounds);
        self.notify_focus(changed);
        changed
    }

    /// Focus the clicked cell. `None` means the click could not be resolved
    /// to a cell.
    pub fn focus_from_pointer(&mut self, target: Option<Coordinate>) -> bool {
        let Some(coord) = target else {
            tracing::warn!("pointer event without a cell target dropped");
            return false;
        };
        let bounds = self.bounds();
        self.cancel_edit_unless(bounds.clamp(coord));
        let changed = self.focus.focus_from_pointer(coord, bounds);
        self.notify_focus(changed);
        changed
    }

    fn notify_focus(&self, changed: bool) {
        if let (true, Some(focus)) = (changed, self.focus.focus()) {
            self.notifier.emit(GridEvent::FocusChanged {
                row: focus.row,
                column: focus.column,
            });
        }
    }

    fn cancel_edit_unless(&mut self, keep: Option<Coordinate>) {
        if self.edit.target().is_some_and(|t| Some(t) != keep) {
            self.cancel_edit();
        }
    }

    // ---- editing ----

    /// Focus a cell and open an edit session on it. Non-editable columns are
    /// refused, as is any cell while another one is being edited.
    pub fn open_edit(&mut self, coord: Coordinate, seed: Option<char>) -> bool {
        if self.edit.is_open() {
            return false;
        }
        let Some(column) = visible_column(&self.columns, coord.column) else {
            return false;
        };
        if !column.is_editable() {
            tracing::debug!(column = %column.name, "edit refused: column is not editable");
            return false;
        }
        let Some(record) = self.records.get(coord.row) else {
            return false;
        };
        let current = record.get(&column.name).clone();
        let editor = editor::editor_for(column);
        self.move_focus_to(coord);
        match self.edit.open(coord, editor, &current, seed) {
            OpenOutcome::Opened => {
                self.notifier.emit(GridEvent::EditOpened {
                    row: coord.row,
                    column: coord.column,
                });
                true
            }
            OpenOutcome::AlreadyOpen | OpenOutcome::Rejected => false,
        }
    }

    /// Focus the cell and open it for editing when its column allows it.
    pub fn request_edit_for_double_click(&mut self, target: Option<Coordinate>) -> bool {
        let Some(coord) = target else {
            tracing::warn!("double click without a cell target dropped");
            return false;
        };
        let Some(coord) = self.bounds().clamp(coord) else {
            return false;
        };
        self.move_focus_to(coord);
        self.open_edit(coord, None)
    }

    /// Close the open session. On commit the extracted value goes through the
    /// mutation pipeline. Returns true if a value was applied.
    pub fn end_edit(&mut self, commit: bool) -> bool {
        let Some(closed) = self.edit.close(commit) else {
            return false;
        };
        let target = closed.target;
        let applied = match (closed.value, visible_column(&self.columns, target.column)) {
            (Some(value), Some(column)) => {
                self.pipeline
                    .commit_field(&mut self.records, target.row, column, value)
            }
            _ => false,
        };
        self.notifier.emit(GridEvent::EditClosed {
            row: target.row,
            column: target.column,
            committed: applied,
        });
        let bounds = self.bounds();
        let changed = self.focus.move_focus_to(target, bounds);
        self.notify_focus(changed);
        applied
    }

    pub fn cancel_edit(&mut self) -> bool {
        let open = self.edit.is_open();
        self.end_edit(false);
        open
    }

    /// Input from a host-side editor widget (pickers, popups).
    pub fn set_editor_input(&mut self, raw: RawInput) -> bool {
        self.edit.set_raw(raw)
    }

    // ---- mutations ----

    pub fn apply_change(&mut self, row: usize, patch: FieldMap, column: Option<&str>) -> Option<usize> {
        let column = column.and_then(|name| self.columns.iter().find(|c| c.name == name));
        self.pipeline.apply_change(&mut self.records, row, patch, column)
    }

    pub fn reset_record(&mut self, row: usize) -> bool {
        if self.edit.target().is_some_and(|t| t.row == row) {
            self.cancel_edit();
        }
        self.pipeline.reset(&mut self.records, row)
    }

    /// Append an empty row and focus it.
    pub fn append_row(&mut self) -> Option<usize> {
        let patch: FieldMap = self
            .columns
            .iter()
            .filter(|c| !c.is_gutter())
            .map(|c| (c.name.clone(), Value::Null))
            .collect();
        let end = self.records.len();
        let row = self
            .pipeline
            .apply_change(&mut self.records, end, patch, None)?;
        let column = self.focus().map(|f| f.column).unwrap_or(0);
        self.move_focus_to(Coordinate::new(row, column));
        Some(row)
    }

    /// Replace every record, e.g. after the host re-queried its data.
    pub fn set_records(&mut self, records: RecordSet) {
        self.records = records;
        let bounds = self.bounds();
        if self
            .edit
            .target()
            .is_some_and(|t| t.row >= bounds.rows || t.column >= bounds.columns)
        {
            self.cancel_edit();
        }
        let changed = self.focus.clamp_to(bounds);
        self.notify_focus(changed);
        let max_top = bounds.rows.saturating_sub(1).min(u16::MAX as usize) as u16;
        self.scroll.top = self.scroll.top.min(max_top);
        tracing::info!(rows = bounds.rows, "records replaced");
    }

    // ---- selection ----

    pub fn select_all(&mut self, selected: bool) -> bool {
        self.selection.select_all(&mut self.records, selected)
    }

    pub fn set_selection(&mut self, rows: &[usize]) -> bool {
        self.selection.set_selection(&mut self.records, rows)
    }

    pub fn adjust_selection(&mut self, added: &[usize], removed: &[usize]) -> bool {
        self.selection.adjust_selection(&mut self.records, added, removed)
    }

    /// Header checkbox of the row selector gutter
    pub fn toggle_header_checkbox(&mut self, checked: bool) -> bool {
        let event = gutter::toggle_header(&self.selection, &mut self.records, checked);
        self.emit_some(event)
    }

    /// Row checkbox of the row selector gutter
    pub fn toggle_row_checkbox(&mut self, row: usize, checked: bool) -> bool {
        let event = gutter::toggle_row(&self.selection, &mut self.records, row, checked);
        self.emit_some(event)
    }

    fn emit_some(&self, event: Option<GridEvent>) -> bool {
        match event {
            Some(event) => {
                self.notifier.emit(event);
                true
            }
            None => false,
        }
    }

    // ---- header ----

    pub fn toggle_sort(&mut self, visible_idx: usize) -> bool {
        let Some(column) = visible_column(&self.columns, visible_idx) else {
            return false;
        };
        if !self.sort.toggle(column) {
            return false;
        }
        self.notifier.emit(GridEvent::SortersChange {
            sorters: self.sort.sorters().to_vec(),
        });
        true
    }

    pub fn resize_column(&mut self, visible_idx: usize, width: u16) -> bool {
        let Some(idx) = column::source_index(&self.columns, visible_idx) else {
            return false;
        };
        if !header::resize_column(&mut self.columns[idx], width) {
            return false;
        }
        self.notifier.emit(GridEvent::ColumnWidthChange {
            index: visible_idx,
            width,
        });
        true
    }

    // ---- scrolling ----

    /// Second phase of a focus move: reveal the focused cell in the frame
    /// that was just drawn. Returns true when the scroll position changed and
    /// the host should draw again.
    pub fn after_render(&mut self, view: &dyn ViewGeometry) -> bool {
        let Some(coord) = self.focus.take_reveal() else {
            return false;
        };
        let Some(cell) = view.cell_bounds(coord.row, coord.column) else {
            tracing::debug!(?coord, "reveal skipped: cell not laid out");
            return false;
        };
        let target = geometry::calc_scroll_pos(&view.container(), &cell);
        self.scroll.apply(target)
    }

    /// Scroll the body by whole rows, e.g. for the mouse wheel.
    pub fn scroll_rows(&mut self, delta: i32) -> bool {
        let max_top = self.records.len().saturating_sub(1).min(u16::MAX as usize) as i32;
        let top = (self.scroll.top as i32 + delta).clamp(0, max_top) as u16;
        let changed = top != self.scroll.top;
        self.scroll.top = top;
        changed
    }
}
