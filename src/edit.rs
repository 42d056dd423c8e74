//! Edit sessions: which cell is open for editing and with what editor.

use crossterm::event::KeyEvent;
use serde_json::Value;

use crate::editor::{RawInput, ValueEditor};
use crate::event::Coordinate;

#[derive(Debug)]
pub struct EditSession {
    target: Coordinate,
    editor: Box<dyn ValueEditor>,
}

impl EditSession {
    pub fn target(&self) -> Coordinate {
        self.target
    }

    pub fn editor(&self) -> &dyn ValueEditor {
        self.editor.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// The same cell is already open; nothing changed
    AlreadyOpen,
    /// Another cell is open
    Rejected,
}

/// Result of closing a session
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedSession {
    pub target: Coordinate,
    /// Extracted value. Only set on commit, and only if the editor produced a
    /// value it considers valid.
    pub value: Option<Value>,
}

#[derive(Debug, Default)]
pub struct EditSessionManager {
    session: Option<EditSession>,
}

impl EditSessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn target(&self) -> Option<Coordinate> {
        self.session.as_ref().map(|s| s.target)
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn open(
        &mut self,
        target: Coordinate,
        mut editor: Box<dyn ValueEditor>,
        current: &Value,
        seed: Option<char>,
    ) -> OpenOutcome {
        if let Some(open) = &self.session {
            return if open.target == target {
                OpenOutcome::AlreadyOpen
            } else {
                tracing::debug!(?target, open = ?open.target, "edit rejected: another cell is open");
                OpenOutcome::Rejected
            };
        }
        editor.open(current, seed);
        tracing::debug!(row = target.row, column = target.column, ?seed, "edit opened");
        self.session = Some(EditSession { target, editor });
        OpenOutcome::Opened
    }

    pub fn close(&mut self, commit: bool) -> Option<ClosedSession> {
        let session = self.session.take()?;
        let value = if commit {
            session
                .editor
                .extract()
                .filter(|value| session.editor.validate(value))
        } else {
            None
        };
        tracing::debug!(
            row = session.target.row,
            column = session.target.column,
            commit,
            extracted = value.is_some(),
            "edit closed"
        );
        Some(ClosedSession {
            target: session.target,
            value,
        })
    }

    /// Forward a key to the open editor.
    pub fn delegate(&mut self, key: &KeyEvent) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.editor.handle_key(key))
    }

    pub fn set_raw(&mut self, raw: RawInput) -> bool {
        self.session.as_mut().is_some_and(|s| s.editor.set_raw(raw))
    }

    pub fn buffer(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.editor.buffer())
    }
}
