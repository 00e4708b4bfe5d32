//! Extraction of comparable keys from catalog tables.
//!
//! Matching never looks at a [`Table`] directly; it works on the
//! normalized representations built here, once per row, in row order:
//!
//! - [`Positions`] — unit-sphere vectors derived from a longitude/latitude
//!   column pair in degrees, for proximity matching.
//! - [`Keys`] — hashable identifier tuples derived from one or more key
//!   columns, for exact matching.
//!
//! Rows with a null in any requested cell become unmatchable (`None` in
//! the per-row slot) rather than failing the whole catalog; they surface
//! later in the unmatched-row accounting. Out-of-domain coordinates are an
//! error only under strict validation — otherwise the row is excluded the
//! same way.

use tracing::debug;
use xmatch_core::angle::{validate_latitude_deg, validate_longitude_deg};
use xmatch_core::{CoreResult, MatchError, UnitVec3};
use xmatch_table::{ColumnType, KeyValue, Table};

/// Column specification for sky positions: longitude and latitude, degrees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordColumns {
    pub lon: String,
    pub lat: String,
}

impl CoordColumns {
    pub fn new(lon: &str, lat: &str) -> Self {
        CoordColumns {
            lon: lon.to_string(),
            lat: lat.to_string(),
        }
    }
}

/// Column specification for identifier keys.
///
/// A row's key is the tuple of its values in `columns`, in order. With
/// `case_insensitive`, string components compare case-folded. Float
/// columns are rejected at extraction time — bitwise float equality is
/// not a meaningful identifier comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColumns {
    pub columns: Vec<String>,
    pub case_insensitive: bool,
}

impl KeyColumns {
    pub fn new(columns: &[&str]) -> Self {
        KeyColumns {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            case_insensitive: false,
        }
    }

    pub fn case_insensitive(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

/// One identifier key: the tuple of a row's key-column normal forms.
pub type KeyTuple = Vec<KeyValue>;

/// Normalized sky positions for one catalog, in row order.
///
/// `None` marks an unmatchable row (null or, in lenient mode, out-of-domain
/// coordinates). Self-contained: holds no references into the source table.
#[derive(Debug, Clone)]
pub struct Positions {
    vectors: Vec<Option<UnitVec3>>,
    usable: usize,
}

impl Positions {
    /// Total number of rows, matchable or not.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Number of rows with a usable position.
    pub fn usable(&self) -> usize {
        self.usable
    }

    /// The position of one row, if usable.
    pub fn get(&self, row: usize) -> Option<&UnitVec3> {
        self.vectors.get(row).and_then(|v| v.as_ref())
    }

    /// Per-row slots in row order.
    pub fn vectors(&self) -> &[Option<UnitVec3>] {
        &self.vectors
    }
}

/// Normalized identifier keys for one catalog, in row order.
#[derive(Debug, Clone)]
pub struct Keys {
    keys: Vec<Option<KeyTuple>>,
    usable: usize,
}

impl Keys {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Number of rows with a complete (null-free) key.
    pub fn usable(&self) -> usize {
        self.usable
    }

    /// The key of one row, if complete.
    pub fn get(&self, row: usize) -> Option<&KeyTuple> {
        self.keys.get(row).and_then(|k| k.as_ref())
    }

    /// Per-row slots in row order.
    pub fn keys(&self) -> &[Option<KeyTuple>] {
        &self.keys
    }
}

fn coordinate_column(table: &dyn Table, name: &str) -> CoreResult<usize> {
    let idx = table
        .column_index(name)
        .ok_or_else(|| MatchError::invalid_column(name, "not found in table schema"))?;
    if table.columns()[idx].dtype == ColumnType::Str {
        return Err(MatchError::invalid_column(
            name,
            "declared type Str cannot hold coordinates in degrees",
        ));
    }
    Ok(idx)
}

/// Extracts unit-sphere positions from `table` per the column spec.
///
/// Fails fast with [`MatchError::InvalidColumn`] if a requested column is
/// absent or non-numeric. Per-row behavior:
///
/// - null longitude or latitude ⇒ unmatchable row;
/// - longitude wrapped into [0°, 360°);
/// - latitude outside [-90°, +90°] or non-finite values ⇒
///   [`MatchError::InvalidCoordinate`] when `strict`, unmatchable otherwise.
pub fn extract_positions(
    table: &dyn Table,
    spec: &CoordColumns,
    strict: bool,
) -> CoreResult<Positions> {
    let lon_idx = coordinate_column(table, &spec.lon)?;
    let lat_idx = coordinate_column(table, &spec.lat)?;

    let n = table.n_rows();
    let mut vectors = Vec::with_capacity(n);
    let mut usable = 0usize;

    for row in 0..n {
        let lon_cell = table.value(row, lon_idx);
        let lat_cell = table.value(row, lat_idx);

        let (lon_raw, lat_raw) = match (lon_cell.as_f64(), lat_cell.as_f64()) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => {
                vectors.push(None);
                continue;
            }
        };

        let lon = match validate_longitude_deg(lon_raw) {
            Ok(lon) => lon,
            Err(violation) if strict => {
                return Err(MatchError::invalid_coordinate(
                    row,
                    &spec.lon,
                    &lon_cell.to_string(),
                    &violation.to_string(),
                ));
            }
            Err(_) => {
                vectors.push(None);
                continue;
            }
        };
        let lat = match validate_latitude_deg(lat_raw) {
            Ok(lat) => lat,
            Err(violation) if strict => {
                return Err(MatchError::invalid_coordinate(
                    row,
                    &spec.lat,
                    &lat_cell.to_string(),
                    &violation.to_string(),
                ));
            }
            Err(_) => {
                vectors.push(None);
                continue;
            }
        };

        vectors.push(Some(UnitVec3::from_sky(lon, lat)));
        usable += 1;
    }

    debug!(
        rows = n,
        usable,
        excluded = n - usable,
        lon = %spec.lon,
        lat = %spec.lat,
        "extracted positions"
    );

    Ok(Positions { vectors, usable })
}

/// Extracts identifier keys from `table` per the column spec.
///
/// Fails fast with [`MatchError::InvalidColumn`] if a key column is absent
/// or declared `Float`. A row with a null in any key column is unmatchable.
pub fn extract_keys(table: &dyn Table, spec: &KeyColumns) -> CoreResult<Keys> {
    if spec.columns.is_empty() {
        return Err(MatchError::invalid_column(
            "",
            "at least one key column is required",
        ));
    }

    let mut indices = Vec::with_capacity(spec.columns.len());
    for name in &spec.columns {
        let idx = table
            .column_index(name)
            .ok_or_else(|| MatchError::invalid_column(name, "not found in table schema"))?;
        if table.columns()[idx].dtype == ColumnType::Float {
            return Err(MatchError::invalid_column(
                name,
                "float columns cannot be identifier keys",
            ));
        }
        indices.push(idx);
    }

    let n = table.n_rows();
    let mut keys = Vec::with_capacity(n);
    let mut usable = 0usize;

    for row in 0..n {
        let mut tuple = Vec::with_capacity(indices.len());
        let mut complete = true;
        for &idx in &indices {
            match table.value(row, idx).to_key(spec.case_insensitive) {
                Some(k) => tuple.push(k),
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            keys.push(Some(tuple));
            usable += 1;
        } else {
            keys.push(None);
        }
    }

    debug!(rows = n, usable, excluded = n - usable, "extracted keys");

    Ok(Keys { keys, usable })
}
