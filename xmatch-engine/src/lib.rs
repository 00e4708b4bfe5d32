//! Catalog cross-matching and merging.
//!
//! Given two tabular catalogs of celestial objects, this crate finds
//! correspondences between their rows — by angular proximity on the sky or
//! by identifier equality — and assembles a combined table from the
//! matched row sets.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`extract`] | [`Positions`](extract::Positions)/[`Keys`](extract::Keys) from table columns, missing-row accounting |
//! | [`index`] | [`SkyIndex`](index::SkyIndex) ring grid, [`KeyIndex`](index::KeyIndex) exact lookup |
//! | [`matcher`] | [`match_sky`](matcher::match_sky), [`match_keys`](matcher::match_keys), disambiguation policies |
//! | [`result`] | [`CrossMatch`](result::CrossMatch) pairs/unmatched ledger, summary statistics |
//! | [`merge`] | [`merge`](merge::merge), merge modes, column-conflict policies |
//!
//! # Pipeline
//!
//! tables → extract → normalized keys → index (built once per reference
//! catalog) → matcher → [`CrossMatch`](result::CrossMatch) → merger →
//! merged table. Every stage takes immutable inputs and returns an
//! independently-owned result; a built index can serve matches from
//! several threads at once.
//!
//! # Quick Start
//!
//! ```
//! use xmatch_engine::extract::{extract_positions, CoordColumns};
//! use xmatch_engine::index::SkyIndex;
//! use xmatch_engine::matcher::{match_sky, Disambiguation, SkyMatchConfig};
//! use xmatch_engine::merge::{merge, ConflictPolicy, MergeMode};
//! use xmatch_core::Angle;
//! use xmatch_table::{Column, ColumnType, MemTable, Table, Value};
//!
//! # fn main() -> Result<(), xmatch_core::MatchError> {
//! let reference = MemTable::from_rows(
//!     vec![
//!         Column::new("ra", ColumnType::Float),
//!         Column::new("dec", ColumnType::Float),
//!         Column::new("z", ColumnType::Float),
//!     ],
//!     vec![
//!         vec![Value::Float(83.633), Value::Float(-5.375), Value::Float(0.02)],
//!         vec![Value::Float(120.0), Value::Float(33.0), Value::Float(0.15)],
//!     ],
//! )?;
//! let query = MemTable::from_rows(
//!     vec![
//!         Column::new("ra", ColumnType::Float),
//!         Column::new("dec", ColumnType::Float),
//!         Column::new("mag", ColumnType::Float),
//!     ],
//!     vec![vec![Value::Float(83.6331), Value::Float(-5.3749), Value::Float(14.2)]],
//! )?;
//!
//! let spec = CoordColumns::new("ra", "dec");
//! let ref_positions = extract_positions(&reference, &spec, false)?;
//! let query_positions = extract_positions(&query, &spec, false)?;
//!
//! let index = SkyIndex::build(&ref_positions);
//! let matched = match_sky(
//!     &query_positions,
//!     &index,
//!     &SkyMatchConfig {
//!         tolerance: Angle::from_arcseconds(1.0),
//!         policy: Disambiguation::Nearest,
//!     },
//! )?;
//! assert_eq!(matched.pairs().len(), 1);
//!
//! let combined = merge(
//!     &query,
//!     &reference,
//!     &matched,
//!     MergeMode::Inner,
//!     &ConflictPolicy::Suffix { left: "_q".into(), right: "_r".into() },
//! )?;
//! assert_eq!(combined.n_rows(), 1);
//! # Ok(())
//! # }
//! ```

pub mod extract;
pub mod index;
pub mod matcher;
pub mod merge;
pub mod result;

pub use extract::{extract_keys, extract_positions, CoordColumns, KeyColumns, Keys, Positions};
pub use index::{KeyIndex, SkyIndex};
pub use matcher::{match_keys, match_sky, nearest_separations, Disambiguation, SkyMatchConfig};
pub use merge::{merge, ConflictPolicy, MergeMode};
pub use result::{CrossMatch, MatchSummary, MatchedPair};
