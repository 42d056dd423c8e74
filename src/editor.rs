//! Value editors
//!
//! The grid only records which cell is being edited. Turning keystrokes into a
//! typed value is the job of the editor opened for that cell's column; the
//! grid asks it for the extracted value when the session commits.

use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::{Number, Value};

use crate::column::{Column, ColumnType, ObjectOptions, SelectOption};

/// Raw input pushed by a host-side widget (picker popups and the like)
#[derive(Debug, Clone, PartialEq)]
pub enum RawInput {
    Text(String),
    Checked(bool),
    Choice(usize),
    Reference(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    Text,
    Number,
    Checkbox,
    Select,
    Object,
}

pub trait ValueEditor: fmt::Debug {
    fn kind(&self) -> EditorKind;

    /// Load the current value. A seed character replaces the content.
    fn open(&mut self, current: &Value, seed: Option<char>);

    /// Handle a key delegated by the grid; true if it changed the input.
    fn handle_key(&mut self, key: &KeyEvent) -> bool;

    /// Accept input from a host widget; false if the input kind does not apply.
    fn set_raw(&mut self, raw: RawInput) -> bool;

    /// Display text for a stored value
    fn render(&self, value: &Value) -> String;

    /// Display text for the pending input
    fn buffer(&self) -> String;

    /// Typed value for the pending input, `None` if it does not parse.
    fn extract(&self) -> Option<Value>;

    fn validate(&self, _value: &Value) -> bool {
        true
    }
}

/// Editor matching a column's data type.
pub fn editor_for(column: &Column) -> Box<dyn ValueEditor> {
    match column.data_type {
        ColumnType::Integer | ColumnType::Float | ColumnType::Number => {
            Box::new(NumberEditor::new(column.data_type))
        }
        ColumnType::Boolean => Box::new(CheckboxEditor::default()),
        ColumnType::Select => Box::new(SelectEditor::new(column.editor.options.clone())),
        ColumnType::Object => Box::new(ObjectEditor::new(column.record.options.clone())),
        ColumnType::String | ColumnType::Gutter => Box::new(TextEditor::default()),
    }
}

/// Cell text for a value without opening an editor.
pub fn render_value(column: &Column, value: &Value) -> String {
    match column.data_type {
        ColumnType::Boolean => checkbox_text(truthy(value)),
        ColumnType::Select => select_text(&column.editor.options, value),
        ColumnType::Object => object_text(&column.record.options, value),
        _ => display_value(value),
    }
}

pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn checkbox_text(checked: bool) -> String {
    if checked { "[x]".into() } else { "[ ]".into() }
}

fn select_text(options: &[SelectOption], value: &Value) -> String {
    options
        .iter()
        .find(|o| &o.value() == value)
        .map(|o| o.display().to_string())
        .unwrap_or_else(|| display_value(value))
}

fn object_text(options: &ObjectOptions, value: &Value) -> String {
    let field = |name: &str| value.get(name).map(display_value).unwrap_or_default();
    if value.is_null() {
        return "()".into();
    }
    format!(
        "{}({})",
        field(&options.name_field),
        field(&options.description_field)
    )
}

/// Single-line edit buffer with a char-indexed cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LineBuffer {
    text: String,
    cursor: usize,
}

impl LineBuffer {
    fn reset(&mut self, text: String) {
        self.cursor = text.chars().count();
        self.text = text;
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        let len = self.text.chars().count();
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                let at = self.byte_at(self.cursor);
                self.text.insert(at, c);
                self.cursor += 1;
            }
            KeyCode::Backspace if self.cursor > 0 => {
                let at = self.byte_at(self.cursor - 1);
                self.text.remove(at);
                self.cursor -= 1;
            }
            KeyCode::Delete if self.cursor < len => {
                let at = self.byte_at(self.cursor);
                self.text.remove(at);
            }
            KeyCode::Left if self.cursor > 0 => self.cursor -= 1,
            KeyCode::Right if self.cursor < len => self.cursor += 1,
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = len,
            _ => return false,
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextEditor {
    line: LineBuffer,
}

impl TextEditor {
    pub fn cursor(&self) -> usize {
        self.line.cursor
    }
}

impl ValueEditor for TextEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Text
    }

    fn open(&mut self, current: &Value, seed: Option<char>) {
        match seed {
            Some(c) => self.line.reset(c.to_string()),
            None => self.line.reset(display_value(current)),
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        self.line.handle_key(key)
    }

    fn set_raw(&mut self, raw: RawInput) -> bool {
        match raw {
            RawInput::Text(text) => {
                self.line.reset(text);
                true
            }
            _ => false,
        }
    }

    fn render(&self, value: &Value) -> String {
        display_value(value)
    }

    fn buffer(&self) -> String {
        self.line.text.clone()
    }

    fn extract(&self) -> Option<Value> {
        Some(Value::String(self.line.text.clone()))
    }
}

/// Numeric input typed by the column: integers, floats or plain numbers.
#[derive(Debug, Clone)]
pub struct NumberEditor {
    data_type: ColumnType,
    line: LineBuffer,
}

impl NumberEditor {
    pub fn new(data_type: ColumnType) -> Self {
        Self {
            data_type,
            line: LineBuffer::default(),
        }
    }
}

impl ValueEditor for NumberEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Number
    }

    fn open(&mut self, current: &Value, seed: Option<char>) {
        match seed {
            Some(c) => self.line.reset(c.to_string()),
            None => self.line.reset(display_value(current)),
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        self.line.handle_key(key)
    }

    fn set_raw(&mut self, raw: RawInput) -> bool {
        match raw {
            RawInput::Text(text) => {
                self.line.reset(text);
                true
            }
            _ => false,
        }
    }

    fn render(&self, value: &Value) -> String {
        display_value(value)
    }

    fn buffer(&self) -> String {
        self.line.text.clone()
    }

    fn extract(&self) -> Option<Value> {
        let text = self.line.text.trim();
        if text.is_empty() {
            return Some(Value::Null);
        }
        match self.data_type {
            ColumnType::Integer => parse_leading_int(text).map(Value::from),
            ColumnType::Float => parse_leading_float(text)
                .and_then(Number::from_f64)
                .map(Value::Number),
            _ => text.parse::<f64>().ok().and_then(float_value),
        }
    }
}

fn float_value(f: f64) -> Option<Value> {
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Value::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number)
}

/// Integer prefix of `text`, so `"12.7"` reads as 12 and `"4kg"` as 4.
fn parse_leading_int(text: &str) -> Option<i64> {
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text[..end].parse().ok()
}

/// Longest prefix of `text` that parses as a float.
fn parse_leading_float(text: &str) -> Option<f64> {
    (1..=text.len())
        .rev()
        .filter(|&end| text.is_char_boundary(end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .filter(|f| f.is_finite())
}

#[derive(Debug, Clone, Default)]
pub struct CheckboxEditor {
    checked: bool,
}

impl ValueEditor for CheckboxEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Checkbox
    }

    fn open(&mut self, current: &Value, seed: Option<char>) {
        self.checked = truthy(current);
        if seed == Some(' ') {
            self.checked = !self.checked;
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if key.code == KeyCode::Char(' ') {
            self.checked = !self.checked;
            return true;
        }
        false
    }

    fn set_raw(&mut self, raw: RawInput) -> bool {
        match raw {
            RawInput::Checked(checked) => {
                self.checked = checked;
                true
            }
            _ => false,
        }
    }

    fn render(&self, value: &Value) -> String {
        checkbox_text(truthy(value))
    }

    fn buffer(&self) -> String {
        checkbox_text(self.checked)
    }

    fn extract(&self) -> Option<Value> {
        Some(Value::Bool(self.checked))
    }
}

/// Choice among the column's configured options
#[derive(Debug, Clone)]
pub struct SelectEditor {
    options: Vec<SelectOption>,
    choice: Option<usize>,
}

impl SelectEditor {
    pub fn new(options: Vec<SelectOption>) -> Self {
        Self {
            options,
            choice: None,
        }
    }

    fn jump_to(&mut self, c: char) -> bool {
        let c = c.to_lowercase().next().unwrap_or(c);
        let found = self.options.iter().position(|o| {
            o.display()
                .chars()
                .next()
                .and_then(|first| first.to_lowercase().next())
                == Some(c)
        });
        if found.is_some() {
            self.choice = found;
        }
        found.is_some()
    }

    fn step(&mut self, forward: bool) -> bool {
        let len = self.options.len();
        if len == 0 {
            return false;
        }
        self.choice = Some(match (self.choice, forward) {
            (None, _) => 0,
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
        });
        true
    }
}

impl ValueEditor for SelectEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Select
    }

    fn open(&mut self, current: &Value, seed: Option<char>) {
        self.choice = self.options.iter().position(|o| &o.value() == current);
        if let Some(c) = seed {
            self.jump_to(c);
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Down => self.step(true),
            KeyCode::Up => self.step(false),
            KeyCode::Char(c) => self.jump_to(c),
            _ => false,
        }
    }

    fn set_raw(&mut self, raw: RawInput) -> bool {
        match raw {
            RawInput::Choice(idx) if idx < self.options.len() => {
                self.choice = Some(idx);
                true
            }
            _ => false,
        }
    }

    fn render(&self, value: &Value) -> String {
        select_text(&self.options, value)
    }

    fn buffer(&self) -> String {
        self.choice
            .and_then(|i| self.options.get(i))
            .map(|o| o.display().to_string())
            .unwrap_or_default()
    }

    fn extract(&self) -> Option<Value> {
        self.choice
            .and_then(|i| self.options.get(i))
            .map(SelectOption::value)
    }
}

/// Reference to another object, picked by a host-side selector.
#[derive(Debug, Clone)]
pub struct ObjectEditor {
    options: ObjectOptions,
    value: Value,
}

impl ObjectEditor {
    pub fn new(options: ObjectOptions) -> Self {
        Self {
            options,
            value: Value::Null,
        }
    }
}

impl ValueEditor for ObjectEditor {
    fn kind(&self) -> EditorKind {
        EditorKind::Object
    }

    fn open(&mut self, current: &Value, _seed: Option<char>) {
        self.value = current.clone();
    }

    fn handle_key(&mut self, _key: &KeyEvent) -> bool {
        false
    }

    fn set_raw(&mut self, raw: RawInput) -> bool {
        match raw {
            RawInput::Reference(value) => {
                self.value = value;
                true
            }
            _ => false,
        }
    }

    fn render(&self, value: &Value) -> String {
        object_text(&self.options, value)
    }

    fn buffer(&self) -> String {
        object_text(&self.options, &self.value)
    }

    fn extract(&self) -> Option<Value> {
        Some(self.value.clone())
    }

    fn validate(&self, value: &Value) -> bool {
        value.is_null() || value.get(&self.options.id_field).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_text_editor_seed_replaces_content() {
        let mut editor = TextEditor::default();
        editor.open(&json!("old"), Some('x'));
        assert_eq!(editor.buffer(), "x");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_text_editor_edits_at_cursor() {
        let mut editor = TextEditor::default();
        editor.open(&json!("héllo"), None);
        editor.handle_key(&key(KeyCode::Home));
        editor.handle_key(&key(KeyCode::Right));
        editor.handle_key(&key(KeyCode::Delete));
        editor.handle_key(&key(KeyCode::Char('e')));
        assert_eq!(editor.buffer(), "hello");
        editor.handle_key(&key(KeyCode::End));
        editor.handle_key(&key(KeyCode::Backspace));
        assert_eq!(editor.extract(), Some(json!("hell")));
    }

    #[test]
    fn test_text_editor_ignores_control_chords() {
        let mut editor = TextEditor::default();
        editor.open(&json!("a"), None);
        let chord = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert!(!editor.handle_key(&chord));
        assert_eq!(editor.buffer(), "a");
    }

    #[test]
    fn test_number_editor_types_by_column() {
        let mut int = NumberEditor::new(ColumnType::Integer);
        int.open(&json!(5), Some('7'));
        assert_eq!(int.extract(), Some(json!(7)));
        int.set_raw(RawInput::Text("12.9".into()));
        assert_eq!(int.extract(), Some(json!(12)));

        let mut float = NumberEditor::new(ColumnType::Float);
        float.open(&Value::Null, None);
        float.set_raw(RawInput::Text("2.5kg".into()));
        assert_eq!(float.extract(), Some(json!(2.5)));
        float.set_raw(RawInput::Text("3".into()));
        assert_eq!(float.extract(), Some(json!(3.0)));

        let mut number = NumberEditor::new(ColumnType::Number);
        number.open(&Value::Null, Some('a'));
        assert_eq!(number.extract(), None);
    }

    #[test]
    fn test_number_editor_empty_clears_value() {
        let mut editor = NumberEditor::new(ColumnType::Integer);
        editor.open(&json!(3), None);
        editor.handle_key(&key(KeyCode::Backspace));
        assert_eq!(editor.extract(), Some(Value::Null));
    }

    #[test]
    fn test_checkbox_editor_toggles() {
        let mut editor = CheckboxEditor::default();
        editor.open(&json!(false), Some(' '));
        assert_eq!(editor.extract(), Some(json!(true)));
        editor.handle_key(&key(KeyCode::Char(' ')));
        assert_eq!(editor.buffer(), "[ ]");
        assert!(editor.set_raw(RawInput::Checked(true)));
        assert!(!editor.set_raw(RawInput::Text("x".into())));
    }

    #[test]
    fn test_select_editor_cycles_and_jumps() {
        let options = vec![
            SelectOption::Plain("open".into()),
            SelectOption::Labeled {
                display: "Closed".into(),
                value: json!("closed"),
            },
        ];
        let mut editor = SelectEditor::new(options);
        editor.open(&json!("open"), None);
        assert_eq!(editor.buffer(), "open");

        editor.handle_key(&key(KeyCode::Down));
        assert_eq!(editor.extract(), Some(json!("closed")));
        editor.handle_key(&key(KeyCode::Down));
        assert_eq!(editor.extract(), Some(json!("open")));

        editor.handle_key(&key(KeyCode::Char('c')));
        assert_eq!(editor.buffer(), "Closed");
        assert_eq!(editor.render(&json!("closed")), "Closed");
    }

    #[test]
    fn test_select_editor_without_choice_extracts_nothing() {
        let mut editor = SelectEditor::new(vec![SelectOption::Plain("a".into())]);
        editor.open(&json!("zzz"), None);
        assert_eq!(editor.extract(), None);
    }

    #[test]
    fn test_object_editor_renders_name_and_description() {
        let mut editor = ObjectEditor::new(ObjectOptions::default());
        editor.open(&Value::Null, None);
        assert_eq!(editor.buffer(), "()");

        let picked = json!({ "id": "7", "name": "Widget", "description": "blue" });
        assert!(editor.set_raw(RawInput::Reference(picked.clone())));
        assert_eq!(editor.buffer(), "Widget(blue)");
        assert_eq!(editor.extract(), Some(picked.clone()));
        assert!(editor.validate(&picked));
        assert!(!editor.validate(&json!({ "name": "no id" })));
    }

    #[test]
    fn test_editor_for_picks_variant_by_type() {
        let kinds: Vec<EditorKind> = [
            ColumnType::String,
            ColumnType::Integer,
            ColumnType::Boolean,
            ColumnType::Select,
            ColumnType::Object,
        ]
        .into_iter()
        .map(|t| editor_for(&Column::new("c", t)).kind())
        .collect();
        assert_eq!(
            kinds,
            vec![
                EditorKind::Text,
                EditorKind::Number,
                EditorKind::Checkbox,
                EditorKind::Select,
                EditorKind::Object
            ]
        );
    }

    #[test]
    fn test_render_value_for_cells() {
        assert_eq!(render_value(&Column::new("b", ColumnType::Boolean), &json!(1)), "[x]");
        assert_eq!(render_value(&Column::new("s", ColumnType::String), &Value::Null), "");
        assert_eq!(render_value(&Column::new("n", ColumnType::Float), &json!(1.5)), "1.5");
    }
}
