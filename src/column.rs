//! Column descriptors
//!
//! Columns are read-only to the engine. Hidden columns are dropped before any
//! column index is computed, so every coordinate the grid hands out indexes the
//! visible projection returned by [`visible_columns`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::record::Record;

/// Name of the injected row selection gutter
pub const ROW_SELECTOR: &str = "row-selector";

const AUTO_MIN_WIDTH: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnType {
    #[default]
    String,
    Integer,
    Float,
    Number,
    Boolean,
    Select,
    Object,
    Gutter,
}

// unknown type names fall back to String
impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(match name.to_ascii_lowercase().as_str() {
            "integer" => ColumnType::Integer,
            "float" => ColumnType::Float,
            "number" => ColumnType::Number,
            "boolean" => ColumnType::Boolean,
            "select" => ColumnType::Select,
            "object" => ColumnType::Object,
            "gutter" => ColumnType::Gutter,
            _ => ColumnType::String,
        })
    }
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float | ColumnType::Number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WidthSpec {
    /// Width in character cells
    Fixed(u16),
    /// Literal size such as `"12ch"`, `"30%"` or `"auto"`
    Css(String),
}

/// Field names used to display an object reference value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectOptions {
    #[serde(default = "default_id_field")]
    pub id_field: String,
    #[serde(default = "default_name_field")]
    pub name_field: String,
    #[serde(default = "default_description_field")]
    pub description_field: String,
}

fn default_id_field() -> String {
    "id".into()
}
fn default_name_field() -> String {
    "name".into()
}
fn default_description_field() -> String {
    "description".into()
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            name_field: default_name_field(),
            description_field: default_description_field(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RecordOptions {
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub options: ObjectOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectOption {
    Plain(String),
    Labeled { display: String, value: Value },
}

impl SelectOption {
    pub fn display(&self) -> &str {
        match self {
            SelectOption::Plain(s) => s,
            SelectOption::Labeled { display, .. } => display,
        }
    }

    pub fn value(&self) -> Value {
        match self {
            SelectOption::Plain(s) => Value::String(s.clone()),
            SelectOption::Labeled { value, .. } => value.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EditorOptions {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

type ValidateFn = dyn Fn(&Value, &Value, &Record, &Column) -> bool + Send + Sync;

/// Value-level validation predicate: `(new, old, record, column) -> accept`
#[derive(Clone)]
pub struct Validator(Arc<ValidateFn>);

impl Validator {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &Record, &Column) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn check(&self, after: &Value, before: &Value, record: &Record, column: &Column) -> bool {
        (self.0)(after, before, record, column)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator(..)")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub header: Option<String>,
    #[serde(rename = "type", default)]
    pub data_type: ColumnType,
    #[serde(default)]
    pub record: RecordOptions,
    #[serde(default)]
    pub editor: EditorOptions,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub resizable: bool,
    #[serde(default)]
    pub width: Option<WidthSpec>,
    /// Gutter columns only: whether the gutter offers multi-selection
    #[serde(default)]
    pub multiple: bool,
    #[serde(skip)]
    pub validation: Option<Validator>,
}

fn default_true() -> bool {
    true
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            header: None,
            data_type,
            record: RecordOptions::default(),
            editor: EditorOptions::default(),
            hidden: false,
            sortable: false,
            resizable: true,
            width: None,
            multiple: false,
            validation: None,
        }
    }

    /// The row selection gutter column.
    pub fn row_selector(multiple: bool) -> Self {
        Self {
            width: Some(WidthSpec::Fixed(3)),
            resizable: false,
            multiple,
            record: RecordOptions {
                align: Align::Center,
                ..RecordOptions::default()
            },
            ..Self::new(ROW_SELECTOR, ColumnType::Gutter)
        }
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.record.editable = editable;
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn width(mut self, width: WidthSpec) -> Self {
        self.width = Some(width);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.header = Some(title.into());
        self
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.editor.options = options;
        self
    }

    pub fn validation(mut self, validator: Validator) -> Self {
        self.validation = Some(validator);
        self
    }

    pub fn is_gutter(&self) -> bool {
        self.data_type == ColumnType::Gutter
    }

    pub fn is_row_selector(&self) -> bool {
        self.is_gutter() && self.name == ROW_SELECTOR
    }

    pub fn is_editable(&self) -> bool {
        self.record.editable && !self.is_gutter()
    }

    pub fn title_text(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.name)
    }
}

/// Columns that take part in layout and coordinate indexing.
pub fn visible_columns(columns: &[Column]) -> Vec<&Column> {
    columns.iter().filter(|c| !c.hidden).collect()
}

/// Map a visible column index back to its position in the full column list.
pub fn source_index(columns: &[Column], visible_idx: usize) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !c.hidden)
        .nth(visible_idx)
        .map(|(idx, _)| idx)
}

/// Column width template of the visible columns, with a trailing `auto`
/// filler that takes up whatever space is left.
pub fn grid_template(columns: &[Column]) -> String {
    columns
        .iter()
        .filter(|c| !c.hidden)
        .map(|c| match &c.width {
            Some(WidthSpec::Fixed(n)) => format!("{n}px"),
            Some(WidthSpec::Css(s)) => s.clone(),
            None => "auto".to_string(),
        })
        .chain(std::iter::once("auto".to_string()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve visible column widths to character cells for a body `total` wide.
///
/// Fixed and `ch`/`%` widths are honored; everything else shares the
/// remaining space, never going below a readable minimum.
pub fn resolve_widths(columns: &[&Column], total: u16) -> Vec<u16> {
    let mut widths: Vec<Option<u16>> = columns
        .iter()
        .map(|c| match &c.width {
            Some(WidthSpec::Fixed(n)) => Some((*n).max(1)),
            Some(WidthSpec::Css(s)) => parse_css_width(s, total),
            None => None,
        })
        .collect();

    let fixed: u16 = widths.iter().flatten().fold(0u16, |acc, w| acc.saturating_add(*w));
    let autos = widths.iter().filter(|w| w.is_none()).count() as u16;
    if autos > 0 {
        let share = (total.saturating_sub(fixed) / autos).max(AUTO_MIN_WIDTH);
        for w in widths.iter_mut().filter(|w| w.is_none()) {
            *w = Some(share);
        }
    }
    widths.into_iter().map(|w| w.unwrap_or(AUTO_MIN_WIDTH)).collect()
}

fn parse_css_width(text: &str, total: u16) -> Option<u16> {
    let text = text.trim();
    if let Some(n) = text.strip_suffix("ch").or_else(|| text.strip_suffix("px")) {
        return n.trim().parse::<u16>().ok().map(|n| n.max(1));
    }
    if let Some(p) = text.strip_suffix('%') {
        let pct = p.trim().parse::<f32>().ok()?;
        return Some(((total as f32 * pct / 100.0) as u16).max(1));
    }
    None
}
