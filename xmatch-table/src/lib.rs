//! Tabular data contract for the cross-match engine.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`value`] | [`Value`] scalar cells, [`KeyValue`] identifier normal form |
//! | [`table`] | [`Table`] trait, [`MemTable`] in-memory implementation |

pub mod table;
pub mod value;

pub use table::{Column, MemTable, MemTableBuilder, Table};
pub use value::{ColumnType, KeyValue, Value};
