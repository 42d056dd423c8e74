//! Cell focus and the grid's keyboard listener.

use std::collections::BTreeSet;

use crate::event::Coordinate;
use crate::keys::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub rows: usize,
    pub columns: usize,
}

impl GridBounds {
    pub fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.columns == 0
    }

    /// Clamp into `[0, rows-1] x [0, columns-1]`; `None` when there is no cell.
    pub fn clamp(&self, coord: Coordinate) -> Option<Coordinate> {
        if self.is_empty() {
            return None;
        }
        Some(Coordinate::new(
            coord.row.min(self.rows - 1),
            coord.column.min(self.columns - 1),
        ))
    }
}

/// Handle for a listener attached to an [`InputSurface`].
///
/// Not `Clone`: the only way to release a listener is to hand the handle back.
#[derive(Debug, PartialEq, Eq)]
pub struct KeyListener {
    id: u64,
}

impl KeyListener {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
pub struct InputSurface {
    next_id: u64,
    attached: BTreeSet<u64>,
}

impl InputSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self) -> KeyListener {
        let id = self.next_id;
        self.next_id += 1;
        self.attached.insert(id);
        tracing::debug!(listener = id, "key listener attached");
        KeyListener { id }
    }

    pub fn detach(&mut self, listener: KeyListener) -> bool {
        let removed = self.attached.remove(&listener.id);
        tracing::debug!(listener = listener.id, removed, "key listener detached");
        removed
    }

    pub fn is_attached(&self, listener: &KeyListener) -> bool {
        self.attached.contains(&listener.id)
    }

    pub fn listener_count(&self) -> usize {
        self.attached.len()
    }
}

#[derive(Debug, Default)]
pub struct FocusController {
    focus: Option<Coordinate>,
    listener: Option<KeyListener>,
    pending_reveal: Option<Coordinate>,
}

impl FocusController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Option<Coordinate> {
        self.focus
    }

    /// Returns true when the focused cell changed.
    pub fn move_focus_to(&mut self, coord: Coordinate, bounds: GridBounds) -> bool {
        let Some(next) = bounds.clamp(coord) else {
            return self.clear();
        };
        self.pending_reveal = Some(next);
        let changed = self.focus != Some(next);
        if changed {
            tracing::debug!(row = next.row, column = next.column, "focus moved");
        }
        self.focus = Some(next);
        changed
    }

    pub fn focus_from_pointer(&mut self, coord: Coordinate, bounds: GridBounds) -> bool {
        if bounds.clamp(coord) == self.focus {
            return false;
        }
        self.move_focus_to(coord, bounds)
    }

    /// Move one step. Without a focused cell any step lands on the first cell.
    pub fn step(&mut self, direction: Direction, bounds: GridBounds) -> bool {
        let Some(Coordinate { row, column }) = self.focus else {
            return self.move_focus_to(Coordinate::new(0, 0), bounds);
        };
        let next = match direction {
            Direction::Up => Coordinate::new(row.saturating_sub(1), column),
            Direction::Down => Coordinate::new(row.saturating_add(1), column),
            Direction::Left => Coordinate::new(row, column.saturating_sub(1)),
            Direction::Right => Coordinate::new(row, column.saturating_add(1)),
        };
        self.move_focus_to(next, bounds)
    }

    /// Re-clamp after the data changed shape. Clears focus when no cell remains.
    pub fn clamp_to(&mut self, bounds: GridBounds) -> bool {
        match self.focus {
            Some(coord) => {
                let next = bounds.clamp(coord);
                let changed = next != self.focus;
                self.focus = next;
                if next.is_none() {
                    self.pending_reveal = None;
                }
                changed
            }
            None => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        self.pending_reveal = None;
        self.focus.take().is_some()
    }

    pub fn take_reveal(&mut self) -> Option<Coordinate> {
        self.pending_reveal.take()
    }

    pub fn pending_reveal(&self) -> Option<Coordinate> {
        self.pending_reveal
    }

    pub fn focus_in(&mut self, surface: &mut InputSurface) -> bool {
        if self.listener.is_some() {
            return false;
        }
        self.listener = Some(surface.attach());
        true
    }

    pub fn focus_out(&mut self, surface: &mut InputSurface) -> bool {
        match self.listener.take() {
            Some(listener) => surface.detach(listener),
            None => false,
        }
    }

    pub fn has_listener(&self) -> bool {
        self.listener.is_some()
    }
}
