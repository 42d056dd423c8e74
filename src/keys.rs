//! Key routing for the grid
//!
//! Maps a key press and the current mode to a [`GridAction`]. The router is
//! pure: it never touches grid state, it only tells the caller what to do and
//! whether the key was consumed.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Navigating,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridAction {
    Move(Direction),
    /// Open an edit session at the focused cell, optionally seeded by the key
    BeginEdit { seed: Option<char> },
    /// Close the open session; `commit` decides whether the value is applied
    EndEdit { commit: bool },
    /// Commit the open session, then move one column right
    EndEditAndAdvance,
    /// Forward the key to the open value editor
    Delegate(KeyEvent),
    Ignore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteOutcome {
    pub action: GridAction,
    /// The grid consumed the key; the host must not act on it
    pub handled: bool,
}

impl RouteOutcome {
    fn handled(action: GridAction) -> Self {
        Self {
            action,
            handled: true,
        }
    }

    fn ignored() -> Self {
        Self {
            action: GridAction::Ignore,
            handled: false,
        }
    }
}

pub fn route(key: &KeyEvent, mode: Mode) -> RouteOutcome {
    if key.kind == KeyEventKind::Release {
        return RouteOutcome::ignored();
    }
    match mode {
        Mode::Navigating => route_navigating(key),
        Mode::Editing => route_editing(key),
    }
}

fn route_navigating(key: &KeyEvent) -> RouteOutcome {
    // modified keys are host shortcuts
    if key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
    {
        return RouteOutcome::ignored();
    }
    match key.code {
        KeyCode::Up => RouteOutcome::handled(GridAction::Move(Direction::Up)),
        KeyCode::Down => RouteOutcome::handled(GridAction::Move(Direction::Down)),
        KeyCode::Left | KeyCode::Backspace => {
            RouteOutcome::handled(GridAction::Move(Direction::Left))
        }
        KeyCode::Right | KeyCode::Tab => RouteOutcome::handled(GridAction::Move(Direction::Right)),
        KeyCode::Enter => RouteOutcome::handled(GridAction::BeginEdit { seed: None }),
        KeyCode::Char(c) if is_printable(c) => {
            RouteOutcome::handled(GridAction::BeginEdit { seed: Some(c) })
        }
        _ => RouteOutcome::ignored(),
    }
}

fn route_editing(key: &KeyEvent) -> RouteOutcome {
    match key.code {
        KeyCode::Enter => RouteOutcome::handled(GridAction::EndEdit { commit: true }),
        KeyCode::Esc => RouteOutcome::handled(GridAction::EndEdit { commit: false }),
        KeyCode::Tab => RouteOutcome::handled(GridAction::EndEditAndAdvance),
        _ => RouteOutcome::handled(GridAction::Delegate(*key)),
    }
}

/// Digits, letters, space, numpad operators and the usual punctuation.
pub fn is_printable(c: char) -> bool {
    c == ' ' || c.is_ascii_graphic() || c.is_alphanumeric()
}
