//! The narrow table contract and an in-memory implementation.
//!
//! The cross-match engine deliberately knows almost nothing about tables:
//! ordered columns with declared types, a row count, positional cell
//! access, and a null test. Anything satisfying [`Table`] can be matched
//! and merged — the loaders, plotters and filter helpers that produce or
//! consume these tables live elsewhere.
//!
//! [`MemTable`] is the one implementation this workspace ships: a
//! column-major store used for merge output and tests. Merge results are
//! plain tables again, so they feed back into whatever tooling produced
//! the inputs.

use crate::value::{ColumnType, Value};
use xmatch_core::{CoreResult, MatchError};

/// An ordered column: name plus declared scalar type.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub dtype: ColumnType,
}

impl Column {
    pub fn new(name: &str, dtype: ColumnType) -> Self {
        Column {
            name: name.to_string(),
            dtype,
        }
    }
}

/// Read-only tabular data: the only view of a catalog the engine ever takes.
///
/// Invariant: all rows share the column schema reported by
/// [`columns`](Self::columns). Implementations are never mutated by the
/// engine; matching and merging build new tables instead.
pub trait Table {
    /// Ordered column schema.
    fn columns(&self) -> &[Column];

    /// Number of rows.
    fn n_rows(&self) -> usize;

    /// Cell at (row, column index). Both indices must be in bounds.
    fn value(&self, row: usize, col: usize) -> &Value;

    /// Position of a column by name, if present.
    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c.name == name)
    }

    /// Null test for a cell.
    fn is_null(&self, row: usize, col: usize) -> bool {
        self.value(row, col).is_null()
    }
}

/// Column-major in-memory table.
///
/// Construction goes through [`MemTableBuilder`], which enforces the
/// schema invariant (arity and cell types) per pushed row; a built
/// `MemTable` is immutable.
#[derive(Debug, Clone, PartialEq)]
pub struct MemTable {
    columns: Vec<Column>,
    cells: Vec<Vec<Value>>,
    n_rows: usize,
}

impl MemTable {
    /// Starts building a table with the given schema.
    pub fn builder(columns: Vec<Column>) -> MemTableBuilder {
        let cells = columns.iter().map(|_| Vec::new()).collect();
        MemTableBuilder {
            columns,
            cells,
            n_rows: 0,
        }
    }

    /// Builds a table from row-major data, validating every row.
    pub fn from_rows(columns: Vec<Column>, rows: Vec<Vec<Value>>) -> CoreResult<MemTable> {
        let mut builder = Self::builder(columns);
        for row in rows {
            builder.push_row(row)?;
        }
        Ok(builder.finish())
    }
}

impl Table for MemTable {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn n_rows(&self) -> usize {
        self.n_rows
    }

    fn value(&self, row: usize, col: usize) -> &Value {
        &self.cells[col][row]
    }
}

/// Row-wise builder for [`MemTable`].
#[derive(Debug)]
pub struct MemTableBuilder {
    columns: Vec<Column>,
    cells: Vec<Vec<Value>>,
    n_rows: usize,
}

impl MemTableBuilder {
    /// Appends one row.
    ///
    /// Fails with [`MatchError::Schema`] if the row arity differs from the
    /// schema or a non-null cell's type contradicts its column's declared
    /// type. Nulls are accepted in any column.
    pub fn push_row(&mut self, row: Vec<Value>) -> CoreResult<()> {
        if row.len() != self.columns.len() {
            return Err(MatchError::schema(
                self.n_rows,
                "",
                &format!(
                    "row has {} cells, schema has {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        for (col, cell) in self.columns.iter().zip(&row) {
            if let Some(actual) = cell.column_type() {
                if actual != col.dtype {
                    return Err(MatchError::schema(
                        self.n_rows,
                        &col.name,
                        &format!("expected {:?}, got {:?}", col.dtype, actual),
                    ));
                }
            }
        }
        for (store, cell) in self.cells.iter_mut().zip(row) {
            store.push(cell);
        }
        self.n_rows += 1;
        Ok(())
    }

    /// Finishes the build.
    pub fn finish(self) -> MemTable {
        MemTable {
            columns: self.columns,
            cells: self.cells,
            n_rows: self.n_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<Column> {
        vec![
            Column::new("id", ColumnType::Str),
            Column::new("ra", ColumnType::Float),
        ]
    }

    #[test]
    fn test_from_rows_and_access() {
        let t = MemTable::from_rows(
            schema(),
            vec![
                vec![Value::Str("a".into()), Value::Float(10.0)],
                vec![Value::Str("b".into()), Value::Null],
            ],
        )
        .unwrap();

        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column_index("ra"), Some(1));
        assert_eq!(t.column_index("dec"), None);
        assert_eq!(t.value(0, 1), &Value::Float(10.0));
        assert!(t.is_null(1, 1));
    }

    #[test]
    fn test_push_row_rejects_wrong_arity() {
        let mut b = MemTable::builder(schema());
        let err = b.push_row(vec![Value::Str("a".into())]).unwrap_err();
        assert!(err.to_string().contains("1 cells"));
    }

    #[test]
    fn test_push_row_rejects_type_mismatch() {
        let mut b = MemTable::builder(schema());
        let err = b
            .push_row(vec![Value::Int(1), Value::Float(0.0)])
            .unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_null_allowed_in_any_column() {
        let mut b = MemTable::builder(schema());
        b.push_row(vec![Value::Null, Value::Null]).unwrap();
        let t = b.finish();
        assert!(t.is_null(0, 0));
    }
}
