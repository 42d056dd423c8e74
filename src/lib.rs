//! Interactive data grid engine
//!
//! Cell focus, key routing, edit sessions, row selection and dirty-tracked
//! record mutations for a tabular grid. [`grid::DataGrid`] ties the pieces
//! together; hosts render it and feed it input.

pub mod column;
pub mod config;
pub mod edit;
pub mod editor;
pub mod event;
pub mod focus;
pub mod geometry;
pub mod grid;
pub mod gutter;
pub mod header;
pub mod keys;
pub mod logging;
pub mod mutation;
pub mod record;
pub mod selection;

pub use column::{Column, ColumnType};
pub use config::GridConfig;
pub use event::{Coordinate, GridEvent, Notifier};
pub use focus::InputSurface;
pub use grid::DataGrid;
pub use record::{DirtyState, FieldMap, Record, RecordSet};
pub use selection::SelectionMode;
