//! Assembling a combined table from a completed cross-match.
//!
//! The merger takes the two source tables and a [`CrossMatch`] and builds
//! one output table. Which rows appear is governed by [`MergeMode`]; how
//! column-name collisions between the two schemas are handled is governed
//! by [`ConflictPolicy`]. Cells for a missing side are filled with
//! [`Value::Null`], and no cell is ever coerced across types: two
//! same-named columns are a schema conflict whether or not their values
//! agree.
//!
//! Row order is deterministic: query-row order first (matched rows
//! combined, query-only rows null-padded), then any reference-only rows in
//! reference-row order. `Right` mode is the mirror image, keyed on
//! reference rows.
//!
//! Conflict detection runs before the first output row is built, so a
//! strict-policy failure costs nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;
use xmatch_core::{CoreResult, MatchError};
use xmatch_table::{Column, MemTable, Table, Value};

use crate::result::CrossMatch;

/// Which rows of the two catalogs appear in the merged output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeMode {
    /// Matched pairs only.
    Inner,
    /// Every query row; unmatched ones get null reference-side cells.
    Left,
    /// Every reference row; unmatched ones get null query-side cells.
    Right,
    /// Every row from both sides at least once.
    Outer,
}

/// How same-named columns in the two schemas are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    /// Rename both sides by appending a suffix, e.g. `flux` becomes
    /// `flux_a` / `flux_b`.
    Suffix { left: String, right: String },
    /// Keep the query-side column, drop the reference-side one.
    PreferLeft,
    /// Keep the reference-side column, drop the query-side one.
    PreferRight,
    /// Fail with [`MatchError::ColumnConflict`] on any collision.
    Strict,
}

/// One output column's provenance: which source column feeds it.
struct SourceColumn {
    src: usize,
    column: Column,
}

/// Merges `query` and `reference` per a completed match.
///
/// The output is a fresh [`MemTable`] satisfying the same contract as the
/// inputs; sources are untouched.
pub fn merge(
    query: &dyn Table,
    reference: &dyn Table,
    matched: &CrossMatch,
    mode: MergeMode,
    policy: &ConflictPolicy,
) -> CoreResult<MemTable> {
    let (left_cols, right_cols) = resolve_schema(query.columns(), reference.columns(), policy)?;

    let schema: Vec<Column> = left_cols
        .iter()
        .chain(right_cols.iter())
        .map(|sc| sc.column.clone())
        .collect();
    let mut builder = MemTable::builder(schema);

    let n_query = query.n_rows();
    let n_reference = reference.n_rows();

    let mut pairs_by_query: Vec<Vec<usize>> = vec![Vec::new(); n_query];
    let mut pairs_by_reference: Vec<Vec<usize>> = vec![Vec::new(); n_reference];
    for (i, p) in matched.pairs().iter().enumerate() {
        pairs_by_query[p.query].push(i);
        pairs_by_reference[p.reference].push(i);
    }

    let emit = |q: Option<usize>, r: Option<usize>| -> Vec<Value> {
        let mut row = Vec::with_capacity(left_cols.len() + right_cols.len());
        for sc in &left_cols {
            row.push(match q {
                Some(qr) => query.value(qr, sc.src).clone(),
                None => Value::Null,
            });
        }
        for sc in &right_cols {
            row.push(match r {
                Some(rr) => reference.value(rr, sc.src).clone(),
                None => Value::Null,
            });
        }
        row
    };

    match mode {
        MergeMode::Inner => {
            for q in 0..n_query {
                for &i in &pairs_by_query[q] {
                    builder.push_row(emit(Some(q), Some(matched.pairs()[i].reference)))?;
                }
            }
        }
        MergeMode::Left | MergeMode::Outer => {
            for q in 0..n_query {
                if pairs_by_query[q].is_empty() {
                    builder.push_row(emit(Some(q), None))?;
                } else {
                    for &i in &pairs_by_query[q] {
                        builder.push_row(emit(Some(q), Some(matched.pairs()[i].reference)))?;
                    }
                }
            }
            if mode == MergeMode::Outer {
                for r in 0..n_reference {
                    if pairs_by_reference[r].is_empty() {
                        builder.push_row(emit(None, Some(r)))?;
                    }
                }
            }
        }
        MergeMode::Right => {
            for r in 0..n_reference {
                if pairs_by_reference[r].is_empty() {
                    builder.push_row(emit(None, Some(r)))?;
                } else {
                    for &i in &pairs_by_reference[r] {
                        builder.push_row(emit(Some(matched.pairs()[i].query), Some(r)))?;
                    }
                }
            }
        }
    }

    let out = builder.finish();
    debug!(
        rows = out.n_rows(),
        columns = out.columns().len(),
        mode = ?mode,
        "merge complete"
    );
    Ok(out)
}

/// Resolves the output schema for both sides under the conflict policy.
fn resolve_schema(
    left: &[Column],
    right: &[Column],
    policy: &ConflictPolicy,
) -> CoreResult<(Vec<SourceColumn>, Vec<SourceColumn>)> {
    let collides =
        |name: &str, other: &[Column]| -> bool { other.iter().any(|c| c.name == name) };

    let mut left_cols = Vec::with_capacity(left.len());
    for (i, col) in left.iter().enumerate() {
        if !collides(&col.name, right) {
            left_cols.push(SourceColumn {
                src: i,
                column: col.clone(),
            });
            continue;
        }
        match policy {
            ConflictPolicy::Strict => return Err(MatchError::column_conflict(&col.name)),
            ConflictPolicy::PreferRight => {}
            ConflictPolicy::PreferLeft => left_cols.push(SourceColumn {
                src: i,
                column: col.clone(),
            }),
            ConflictPolicy::Suffix { left: suffix, .. } => left_cols.push(SourceColumn {
                src: i,
                column: Column::new(&format!("{}{}", col.name, suffix), col.dtype),
            }),
        }
    }

    let mut right_cols = Vec::with_capacity(right.len());
    for (i, col) in right.iter().enumerate() {
        if !collides(&col.name, left) {
            right_cols.push(SourceColumn {
                src: i,
                column: col.clone(),
            });
            continue;
        }
        match policy {
            ConflictPolicy::Strict => return Err(MatchError::column_conflict(&col.name)),
            ConflictPolicy::PreferLeft => {}
            ConflictPolicy::PreferRight => right_cols.push(SourceColumn {
                src: i,
                column: col.clone(),
            }),
            ConflictPolicy::Suffix { right: suffix, .. } => right_cols.push(SourceColumn {
                src: i,
                column: Column::new(&format!("{}{}", col.name, suffix), col.dtype),
            }),
        }
    }

    Ok((left_cols, right_cols))
}
