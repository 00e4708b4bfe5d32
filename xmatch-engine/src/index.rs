//! Spatial and key indexes over a reference catalog.
//!
//! [`SkyIndex`] partitions the sphere into declination rings, each ring
//! split into longitude cells that widen toward the poles, so a proximity
//! query touches only a bounded neighborhood of cells instead of scanning
//! every reference row. The query is conservative: the cell set may
//! include rows outside the radius (removed by the exact separation
//! filter) but never misses one inside it.
//!
//! [`KeyIndex`] is the degenerate form for identifier matching: a hash map
//! from key tuple to the rows sharing it.
//!
//! Both are immutable after construction; if the reference catalog
//! changes, rebuild.

use std::collections::HashMap;

use tracing::debug;
use xmatch_core::constants::{DEG_TO_RAD, RAD_TO_DEG};
use xmatch_core::{Angle, UnitVec3};

use crate::extract::{KeyTuple, Keys, Positions};

/// Default ring height in degrees.
///
/// A knob for performance only — query results are identical at any
/// resolution. One degree keeps cell occupancy reasonable from thousands
/// to millions of rows with arcsecond-scale tolerances.
pub const DEFAULT_CELL_DEG: f64 = 1.0;

struct Ring {
    /// Longitude width of one cell, degrees.
    cell_width_deg: f64,
    /// Row indices per cell.
    cells: Vec<Vec<usize>>,
}

/// Immutable spatial index over one catalog's positions.
pub struct SkyIndex {
    cell_deg: f64,
    rings: Vec<Ring>,
    vectors: Vec<Option<UnitVec3>>,
    usable: usize,
}

impl SkyIndex {
    /// Builds an index at the default resolution.
    pub fn build(positions: &Positions) -> SkyIndex {
        Self::build_with_cell(positions, Angle::from_degrees(DEFAULT_CELL_DEG))
    }

    /// Builds an index with an explicit ring height.
    ///
    /// The height is clamped into [0.001°, 45°]; outside that range the
    /// grid degenerates without changing results.
    pub fn build_with_cell(positions: &Positions, cell: Angle) -> SkyIndex {
        let cell_deg = cell.degrees().clamp(0.001, 45.0);
        let n_rings = libm::ceil(180.0 / cell_deg) as usize;

        let mut rings: Vec<Ring> = (0..n_rings)
            .map(|r| {
                let lat_lo = -90.0 + r as f64 * cell_deg;
                let lat_hi = (lat_lo + cell_deg).min(90.0);
                let lat_mid = 0.5 * (lat_lo + lat_hi);
                let cos_mid = libm::cos(lat_mid * DEG_TO_RAD);
                let n_cells = (libm::floor(360.0 * cos_mid / cell_deg) as usize).max(1);
                Ring {
                    cell_width_deg: 360.0 / n_cells as f64,
                    cells: vec![Vec::new(); n_cells],
                }
            })
            .collect();

        let vectors = positions.vectors().to_vec();
        for (row, slot) in vectors.iter().enumerate() {
            if let Some(v) = slot {
                let (lon, lat) = v.to_sky();
                let r = ring_of(lat, cell_deg, n_rings);
                let ring = &mut rings[r];
                let c = cell_of(lon, ring.cell_width_deg, ring.cells.len());
                ring.cells[c].push(row);
            }
        }

        debug!(
            rows = vectors.len(),
            usable = positions.usable(),
            rings = n_rings,
            cell_deg,
            "built sky index"
        );

        SkyIndex {
            cell_deg,
            rings,
            vectors,
            usable: positions.usable(),
        }
    }

    /// Total number of reference rows, matchable or not.
    pub fn n_rows(&self) -> usize {
        self.vectors.len()
    }

    /// Number of indexed (usable) reference rows.
    pub fn usable(&self) -> usize {
        self.usable
    }

    /// The indexed position of one reference row, if usable.
    pub fn position(&self, row: usize) -> Option<&UnitVec3> {
        self.vectors.get(row).and_then(|v| v.as_ref())
    }

    /// All reference rows within `radius` of `target`, with separations,
    /// sorted by (separation, row index).
    pub fn within(&self, target: &UnitVec3, radius: Angle) -> Vec<(usize, Angle)> {
        let rdeg = radius.degrees();
        let (lon_t, lat_t) = target.to_sky();

        let n_rings = self.rings.len();
        let r_lo = ring_of((lat_t - rdeg).max(-90.0), self.cell_deg, n_rings);
        let r_hi = ring_of((lat_t + rdeg).min(90.0), self.cell_deg, n_rings);

        // Longitude half-extent of the search cap. A cap of radius r
        // centered at latitude lat spans asin(sin r / cos lat) in
        // longitude, which is wider than the naive r / cos lat. If the cap
        // touches a pole every longitude is possible.
        let (sin_r, _) = radius.sin_cos();
        let cos_lat_t = libm::cos(lat_t * DEG_TO_RAD);
        let pole_crossing = lat_t + rdeg >= 89.9 || lat_t - rdeg <= -89.9;
        let half_extent_deg = if pole_crossing || rdeg >= 90.0 || sin_r >= cos_lat_t {
            360.0
        } else {
            libm::asin(sin_r / cos_lat_t) * RAD_TO_DEG
        };

        let mut out = Vec::new();
        for ring in &self.rings[r_lo..=r_hi] {
            self.scan_ring(ring, lon_t, half_extent_deg, target, radius, &mut out);
        }

        out.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        out
    }

    fn scan_ring(
        &self,
        ring: &Ring,
        lon_t: f64,
        half_extent_deg: f64,
        target: &UnitVec3,
        radius: Angle,
        out: &mut Vec<(usize, Angle)>,
    ) {
        let n_cells = ring.cells.len();

        // Pad by one cell width so rows straddling a cell edge are kept.
        let half_width = half_extent_deg + ring.cell_width_deg;
        let c_lo = libm::floor((lon_t - half_width) / ring.cell_width_deg) as i64;
        let c_hi = libm::floor((lon_t + half_width) / ring.cell_width_deg) as i64;

        if n_cells == 1 || (c_hi - c_lo + 1) as usize >= n_cells {
            for cell in &ring.cells {
                self.filter_cell(cell, target, radius, out);
            }
            return;
        }

        for c in c_lo..=c_hi {
            let wrapped = c.rem_euclid(n_cells as i64) as usize;
            self.filter_cell(&ring.cells[wrapped], target, radius, out);
        }
    }

    fn filter_cell(
        &self,
        cell: &[usize],
        target: &UnitVec3,
        radius: Angle,
        out: &mut Vec<(usize, Angle)>,
    ) {
        for &row in cell {
            // Usable by construction: only usable rows were inserted.
            if let Some(v) = self.vectors[row].as_ref() {
                let sep = target.separation(v);
                if sep <= radius {
                    out.push((row, sep));
                }
            }
        }
    }
}

fn ring_of(lat: f64, cell_deg: f64, n_rings: usize) -> usize {
    let r = libm::floor((lat + 90.0) / cell_deg) as i64;
    r.clamp(0, n_rings as i64 - 1) as usize
}

fn cell_of(lon: f64, cell_width_deg: f64, n_cells: usize) -> usize {
    let c = libm::floor(lon / cell_width_deg) as i64;
    c.clamp(0, n_cells as i64 - 1) as usize
}

/// Exact-lookup index for identifier matching.
pub struct KeyIndex {
    map: HashMap<KeyTuple, Vec<usize>>,
    n_rows: usize,
    usable: usize,
}

impl KeyIndex {
    /// Builds the key → rows map. Rows appear in ascending order per key.
    pub fn build(keys: &Keys) -> KeyIndex {
        let mut map: HashMap<KeyTuple, Vec<usize>> = HashMap::new();
        for (row, slot) in keys.keys().iter().enumerate() {
            if let Some(key) = slot {
                map.entry(key.clone()).or_default().push(row);
            }
        }
        debug!(
            rows = keys.len(),
            usable = keys.usable(),
            distinct = map.len(),
            "built key index"
        );
        KeyIndex {
            map,
            n_rows: keys.len(),
            usable: keys.usable(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn usable(&self) -> usize {
        self.usable
    }

    /// Reference rows sharing `key`, ascending. Empty if none.
    pub fn lookup(&self, key: &KeyTuple) -> &[usize] {
        self.map.get(key).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_keys, extract_positions, CoordColumns, KeyColumns};
    use xmatch_core::MatchError;
    use xmatch_table::{Column, ColumnType, MemTable, Value};

    fn positions_of(coords: &[(f64, f64)]) -> Positions {
        let rows = coords
            .iter()
            .map(|&(ra, dec)| vec![Value::Float(ra), Value::Float(dec)])
            .collect();
        let t = MemTable::from_rows(
            vec![
                Column::new("ra", ColumnType::Float),
                Column::new("dec", ColumnType::Float),
            ],
            rows,
        )
        .unwrap();
        extract_positions(&t, &CoordColumns::new("ra", "dec"), false).unwrap()
    }

    #[test]
    fn test_within_finds_close_neighbor() {
        let pos = positions_of(&[(10.0, 0.0), (10.001, 0.0), (50.0, 50.0)]);
        let index = SkyIndex::build(&pos);

        let target = UnitVec3::from_sky(10.0, 0.0005);
        let hits = index.within(&target, Angle::from_arcseconds(5.0));

        assert_eq!(hits.len(), 2);
        // Sorted by separation: row 0 is closer than row 1.
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
        assert!(hits[0].1 < hits[1].1);
    }

    #[test]
    fn test_within_empty_far_away() {
        let pos = positions_of(&[(10.0, 0.0)]);
        let index = SkyIndex::build(&pos);
        let target = UnitVec3::from_sky(200.0, -40.0);
        assert!(index.within(&target, Angle::from_arcseconds(5.0)).is_empty());
    }

    #[test]
    fn test_within_across_wrap_boundary() {
        let pos = positions_of(&[(359.9999, 0.0)]);
        let index = SkyIndex::build(&pos);
        let target = UnitVec3::from_sky(0.0001, 0.0);
        let hits = index.within(&target, Angle::from_arcseconds(5.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 0);
    }

    #[test]
    fn test_within_near_pole() {
        let pos = positions_of(&[(0.0, 89.9995), (180.0, 89.9995), (90.0, 10.0)]);
        let index = SkyIndex::build(&pos);

        // The two polar rows are ~3.6 arcsec apart through the pole even
        // though their longitudes differ by 180 degrees.
        let target = UnitVec3::from_sky(0.0, 89.9995);
        let hits = index.within(&target, Angle::from_arcseconds(10.0));
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_within_matches_brute_force() {
        // Pseudo-random spread; index must agree with a full scan.
        let mut coords = Vec::new();
        let mut x = 7u64;
        for _ in 0..300 {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let ra = (x >> 11) as f64 / (1u64 << 53) as f64 * 360.0;
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let dec = (x >> 11) as f64 / (1u64 << 53) as f64 * 180.0 - 90.0;
            coords.push((ra, dec));
        }
        let pos = positions_of(&coords);
        let index = SkyIndex::build_with_cell(&pos, Angle::from_degrees(5.0));

        let radius = Angle::from_degrees(12.0);
        for &(ra, dec) in &[(0.0, 0.0), (359.0, 2.0), (123.0, -88.0), (45.0, 89.5)] {
            let target = UnitVec3::from_sky(ra, dec);
            let mut expected: Vec<usize> = (0..coords.len())
                .filter(|&i| {
                    target.separation(pos.get(i).unwrap()) <= radius
                })
                .collect();
            expected.sort_unstable();
            let mut got: Vec<usize> = index.within(&target, radius).iter().map(|h| h.0).collect();
            got.sort_unstable();
            assert_eq!(got, expected, "mismatch at ({ra}, {dec})");
        }
    }

    #[test]
    fn test_candidate_search_is_symmetric() {
        // i is a candidate for j within T iff j is a candidate for i:
        // angular separation is symmetric, and the index must not break
        // that with its cell geometry.
        let coords = [
            (10.0, 0.0),
            (10.3, 0.2),
            (9.8, -0.1),
            (359.9, 0.05),
            (0.2, -0.05),
            (10.0, 89.2),
            (190.0, 89.3),
        ];
        let pos = positions_of(&coords);
        let index = SkyIndex::build(&pos);
        let radius = Angle::from_degrees(1.5);

        for i in 0..coords.len() {
            let hits_i: Vec<usize> = index
                .within(pos.get(i).unwrap(), radius)
                .iter()
                .map(|h| h.0)
                .collect();
            for j in 0..coords.len() {
                let hits_j: Vec<usize> = index
                    .within(pos.get(j).unwrap(), radius)
                    .iter()
                    .map(|h| h.0)
                    .collect();
                assert_eq!(
                    hits_i.contains(&j),
                    hits_j.contains(&i),
                    "asymmetry between rows {i} and {j}"
                );
            }
        }
    }

    #[test]
    fn test_within_skips_unusable_rows() {
        let t = MemTable::from_rows(
            vec![
                Column::new("ra", ColumnType::Float),
                Column::new("dec", ColumnType::Float),
            ],
            vec![
                vec![Value::Float(10.0), Value::Float(0.0)],
                vec![Value::Null, Value::Float(0.0)],
            ],
        )
        .unwrap();
        let pos = extract_positions(&t, &CoordColumns::new("ra", "dec"), false).unwrap();
        let index = SkyIndex::build(&pos);

        assert_eq!(index.n_rows(), 2);
        assert_eq!(index.usable(), 1);
        let target = UnitVec3::from_sky(10.0, 0.0);
        let hits = index.within(&target, Angle::from_degrees(90.0));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, 0);
    }

    #[test]
    fn test_key_index_lookup() -> Result<(), MatchError> {
        let t = MemTable::from_rows(
            vec![Column::new("id", ColumnType::Str)],
            vec![
                vec![Value::Str("A".into())],
                vec![Value::Str("B".into())],
                vec![Value::Str("A".into())],
                vec![Value::Null],
            ],
        )?;
        let keys = extract_keys(&t, &KeyColumns::new(&["id"]))?;
        let index = KeyIndex::build(&keys);

        assert_eq!(index.n_rows(), 4);
        assert_eq!(index.usable(), 3);
        assert_eq!(index.lookup(&key_str("A")), &[0, 2]);
        assert_eq!(index.lookup(&key_str("C")), &[] as &[usize]);
        Ok(())
    }

    fn key_str(s: &str) -> KeyTuple {
        vec![xmatch_table::KeyValue::Str(s.to_string())]
    }
}
