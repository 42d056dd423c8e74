use datagrid::column::{self, Align, Column};
use datagrid::editor::render_value;
use datagrid::geometry::{Bounds, ScrollContainer, ScrollOffsets, ViewGeometry};
use datagrid::keys::Mode;
use datagrid::{Coordinate, DataGrid, DirtyState};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState,
    },
};

use crate::app::{App, Pane};

/// Width of the vertical scrollbar drawn inside the body
const SCROLLBAR_WIDTH: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Table(usize),
    Header(usize),
    /// A click in the body; `None` when it landed past the data
    Body(Option<Coordinate>),
}

/// Where things were drawn in the last frame.
#[derive(Debug, Clone, Default)]
pub struct GridLayout {
    tables: Rect,
    tables_offset: usize,
    header: Rect,
    body: Rect,
    /// (start, width) of each visible column in content coordinates
    columns: Vec<(u16, u16)>,
    rows: usize,
    scroll: ScrollOffsets,
}

fn within(r: Rect, x: u16, y: u16) -> bool {
    x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height
}

impl GridLayout {
    pub fn column_width(&self, column: usize) -> Option<u16> {
        self.columns.get(column).map(|&(_, w)| w)
    }

    fn column_at(&self, content_x: u16) -> Option<usize> {
        self.columns
            .iter()
            .position(|&(start, width)| content_x >= start && content_x < start + width)
    }

    pub fn hit_test(&self, x: u16, y: u16) -> Option<HitTarget> {
        if within(self.tables, x, y) {
            return Some(HitTarget::Table(
                (y - self.tables.y) as usize + self.tables_offset,
            ));
        }
        if within(self.header, x, y) {
            return self
                .column_at(x - self.header.x + self.scroll.left)
                .map(HitTarget::Header);
        }
        let content = Rect {
            width: self.body.width.saturating_sub(SCROLLBAR_WIDTH),
            ..self.body
        };
        if within(content, x, y) {
            let row = (y - content.y + self.scroll.top) as usize;
            let column = self.column_at(x - content.x + self.scroll.left);
            let target = match column {
                Some(column) if row < self.rows => Some(Coordinate::new(row, column)),
                _ => None,
            };
            return Some(HitTarget::Body(target));
        }
        None
    }
}

impl ViewGeometry for GridLayout {
    fn container(&self) -> ScrollContainer {
        ScrollContainer {
            bounds: Bounds::new(
                self.body.x as i32,
                self.body.y as i32,
                self.body.width as i32,
                self.body.height as i32,
            ),
            scroll_top: self.scroll.top as i32,
            scroll_left: self.scroll.left as i32,
            gutter_width: SCROLLBAR_WIDTH as i32,
            gutter_height: 0,
        }
    }

    fn cell_bounds(&self, row: usize, column: usize) -> Option<Bounds> {
        let &(start, width) = self.columns.get(column)?;
        if row >= self.rows {
            return None;
        }
        Some(Bounds::new(
            self.body.x as i32 + start as i32 - self.scroll.left as i32,
            self.body.y as i32 + row as i32 - self.scroll.top as i32,
            width as i32,
            1,
        ))
    }
}

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)].as_ref())
        .split(f.size());

    let top = chunks[0];
    let status_area = chunks[1];

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(10)].as_ref())
        .split(top);

    let mut layout = GridLayout::default();
    draw_tables(f, body_chunks[0], app, &mut layout);
    draw_data(f, body_chunks[1], app, &mut layout);
    draw_status(f, status_area, app);
    app.layout = Some(layout);
}

fn pane_block(title: String, active: bool) -> Block<'static> {
    let style = if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw_tables(f: &mut Frame, area: Rect, app: &App, layout: &mut GridLayout) {
    let items: Vec<ListItem> = app
        .tables
        .iter()
        .map(|t| ListItem::new(t.clone()))
        .collect();

    let block = pane_block("Tables".into(), app.pane == Pane::Tables);
    layout.tables = block.inner(area);
    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Yellow),
    );

    let mut state = ListState::default();
    if !app.tables.is_empty() {
        state.select(Some(app.selected_table));
    }
    f.render_stateful_widget(list, area, &mut state);
    layout.tables_offset = state.offset();
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let mode = match app.grid.as_ref().map(DataGrid::mode) {
        Some(Mode::Editing) => "EDIT",
        _ => "NAV",
    };
    let text = Line::from(vec![
        Span::styled(
            format!("[{mode}] "),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(app.status.as_str()),
    ]);
    let p = Paragraph::new(text).block(Block::default().borders(Borders::TOP));
    f.render_widget(p, area);
}

/// Pad or cut `text` to exactly `width` characters.
fn fit(text: &str, width: u16, align: Align) -> String {
    let width = width as usize;
    let cut: String = text.chars().take(width).collect();
    let pad = width - cut.chars().count();
    match align {
        Align::Left => format!("{cut}{}", " ".repeat(pad)),
        Align::Right => format!("{}{cut}", " ".repeat(pad)),
        Align::Center => {
            let left = pad / 2;
            format!("{}{cut}{}", " ".repeat(left), " ".repeat(pad - left))
        }
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn header_text(grid: &DataGrid, column: &Column) -> String {
    if column.is_row_selector() {
        return if column.multiple {
            checkbox(grid.header_checked()).to_string()
        } else {
            String::new()
        };
    }
    match grid.sort_state().marker(column) {
        Some(marker) => format!("{} {marker}", column.title_text()),
        None => column.title_text().to_string(),
    }
}

fn draw_data(f: &mut Frame, area: Rect, app: &App, layout: &mut GridLayout) {
    let title = match &app.loaded_table {
        Some(table) => format!("Data: {table}"),
        None => "Data".into(),
    };
    let block = pane_block(title, app.pane == Pane::Data);
    let Some(grid) = app.grid.as_ref() else {
        let p = Paragraph::new("Select a table and press Enter").block(block);
        f.render_widget(p, area);
        return;
    };
    let inner = block.inner(area);
    f.render_widget(block, area);

    let footer_height = if grid.pagination().infinite { 0 } else { 1 };
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(footer_height),
        ])
        .split(inner);
    let (header_area, body_area, footer_area) = (parts[0], parts[1], parts[2]);
    let content_width = body_area.width.saturating_sub(SCROLLBAR_WIDTH);

    let visible = grid.visible_columns();
    let widths = column::resolve_widths(&visible, content_width);
    let mut start = 0u16;
    let spans: Vec<(u16, u16)> = widths
        .iter()
        .map(|&w| {
            let span = (start, w);
            start = start.saturating_add(w + 1);
            span
        })
        .collect();

    let scroll = grid.scroll();
    let header_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let header: Vec<Span> = visible
        .iter()
        .zip(&widths)
        .flat_map(|(col, &w)| {
            [
                Span::styled(fit(&header_text(grid, col), w, Align::Left), header_style),
                Span::raw(" "),
            ]
        })
        .collect();
    f.render_widget(
        Paragraph::new(Line::from(header)).scroll((0, scroll.left)),
        Rect {
            width: content_width,
            ..header_area
        },
    );

    let focus = grid.focus();
    let edit_target = grid.edit_target();
    let buffer = grid.editor_buffer();
    let lines: Vec<Line> = grid
        .records()
        .iter()
        .enumerate()
        .map(|(r, record)| {
            let row_style = match (record.selected, record.dirty) {
                (true, _) => Style::default().bg(Color::DarkGray),
                (false, DirtyState::Modified) => Style::default().fg(Color::Yellow),
                (false, DirtyState::Created) => Style::default().fg(Color::Green),
                (false, DirtyState::Clean) => Style::default(),
            };
            let cells: Vec<Span> = visible
                .iter()
                .zip(&widths)
                .enumerate()
                .flat_map(|(c, (col, &w))| {
                    let here = Some(Coordinate::new(r, c));
                    let (text, style) = if here == edit_target {
                        (
                            format!("{}_", buffer.as_deref().unwrap_or_default()),
                            Style::default().bg(Color::Yellow).fg(Color::Black),
                        )
                    } else if col.is_row_selector() {
                        (checkbox(record.selected).to_string(), row_style)
                    } else {
                        (render_value(col, record.get(&col.name)), row_style)
                    };
                    let style = if here == focus && here != edit_target {
                        Style::default().bg(Color::Blue).fg(Color::Black)
                    } else {
                        style
                    };
                    [
                        Span::styled(fit(&text, w, col.record.align), style),
                        Span::styled(" ", row_style),
                    ]
                })
                .collect();
            Line::from(cells)
        })
        .collect();

    let rows = lines.len();
    f.render_widget(
        Paragraph::new(lines).scroll((scroll.top, scroll.left)),
        Rect {
            width: content_width,
            ..body_area
        },
    );

    let mut bar = ScrollbarState::new(rows).position(scroll.top as usize);
    f.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        body_area,
        &mut bar,
    );

    if footer_height > 0 {
        let dirty = grid.records().dirty_rows().count();
        let footer = format!(
            "{} rows | {} selected | {} changed",
            rows,
            grid.selected_rows().len(),
            dirty
        );
        f.render_widget(
            Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
            footer_area,
        );
    }

    layout.header = header_area;
    layout.body = body_area;
    layout.columns = spans;
    layout.rows = rows;
    layout.scroll = scroll;
}
