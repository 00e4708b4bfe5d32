//! Candidate search and disambiguation.
//!
//! For each query row the matcher asks the index for every reference row
//! within tolerance, then applies the configured policy:
//!
//! - [`Nearest`](Disambiguation::Nearest) — keep the closest candidate,
//!   ties broken by lowest reference row index;
//! - [`All`](Disambiguation::All) — keep every candidate (one-to-many
//!   result, no one-to-one discipline);
//! - [`Strict`](Disambiguation::Strict) — a query row with several
//!   candidates is ambiguous: demoted to unmatched and counted for
//!   diagnostics, never a hard failure.
//!
//! Under `Nearest` and `Strict` a reference row may still end up claimed
//! by several query rows, because candidate search runs independently per
//! row. A second, **global** pass resolves each contested reference row in
//! favor of the claimant with the smallest separation (tie: lowest query
//! row index) and demotes the rest to unmatched. The pass runs over the
//! complete claim set with fixed tie-break rules, so its outcome does not
//! depend on row order or on how the candidate phase was scheduled — which
//! is also what makes the rayon-parallel candidate search safe.
//!
//! A demoted query row does not fall back to its second-nearest candidate;
//! it becomes unmatched, matching nearest-neighbor-then-threshold
//! semantics.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;
use xmatch_core::{Angle, CoreResult, MatchError};

use crate::extract::{Keys, Positions};
use crate::index::{KeyIndex, SkyIndex};
use crate::result::{CrossMatch, MatchedPair};

/// Policy for query rows with more than one candidate within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disambiguation {
    /// Closest candidate wins; equal distances go to the lowest reference
    /// row index.
    Nearest,
    /// Keep every candidate as a one-to-many association.
    All,
    /// Treat multiple candidates as ambiguous: the query row is unmatched
    /// and the ambiguity is counted.
    Strict,
}

/// Configuration for a proximity match. No defaults — both fields are
/// explicit so a match is reproducible from its call site alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyMatchConfig {
    /// Angular search radius. The conventional choice for optical catalog
    /// work is `Angle::from_arcseconds(1.0)`.
    pub tolerance: Angle,
    pub policy: Disambiguation,
}

/// Matches query positions against an indexed reference catalog.
///
/// Fails fast on a negative or non-finite tolerance
/// ([`MatchError::InvalidTolerance`]) and on a side with zero usable rows
/// ([`MatchError::EmptyCatalog`]). Does not mutate its inputs; the same
/// index can serve concurrent matches.
pub fn match_sky(
    query: &Positions,
    index: &SkyIndex,
    cfg: &SkyMatchConfig,
) -> CoreResult<CrossMatch> {
    let tol_arcsec = cfg.tolerance.arcseconds();
    if !tol_arcsec.is_finite() || tol_arcsec < 0.0 {
        return Err(MatchError::invalid_tolerance(tol_arcsec));
    }
    if query.usable() == 0 {
        return Err(MatchError::empty_catalog(
            "query",
            "no rows with usable coordinates",
        ));
    }
    if index.usable() == 0 {
        return Err(MatchError::empty_catalog(
            "reference",
            "no rows with usable coordinates",
        ));
    }

    // Independent per query row; order is preserved by the indexed collect.
    let candidates: Vec<Option<Vec<(usize, Option<Angle>)>>> = query
        .vectors()
        .par_iter()
        .map(|slot| {
            slot.as_ref().map(|v| {
                index
                    .within(v, cfg.tolerance)
                    .into_iter()
                    .map(|(r, sep)| (r, Some(sep)))
                    .collect()
            })
        })
        .collect();

    let result = assemble(&candidates, index.n_rows(), cfg.policy);
    let s = result.summary();
    debug!(
        matched = s.matched,
        unmatched_query = s.unmatched_query,
        unmatched_reference = s.unmatched_reference,
        ambiguous = s.ambiguous,
        tolerance_arcsec = tol_arcsec,
        "sky match complete"
    );
    Ok(result)
}

/// Matches query identifier keys against a reference key index.
///
/// Equality is the only criterion, so matched pairs carry no separation.
/// Under `Nearest`, several reference rows sharing the query's key are a
/// distance tie, resolved to the lowest reference row index.
pub fn match_keys(query: &Keys, index: &KeyIndex, policy: Disambiguation) -> CoreResult<CrossMatch> {
    if query.usable() == 0 {
        return Err(MatchError::empty_catalog(
            "query",
            "no rows with complete keys",
        ));
    }
    if index.usable() == 0 {
        return Err(MatchError::empty_catalog(
            "reference",
            "no rows with complete keys",
        ));
    }

    let candidates: Vec<Option<Vec<(usize, Option<Angle>)>>> = query
        .keys()
        .iter()
        .map(|slot| {
            slot.as_ref()
                .map(|key| index.lookup(key).iter().map(|&r| (r, None)).collect())
        })
        .collect();

    let result = assemble(&candidates, index.n_rows(), policy);
    let s = result.summary();
    debug!(
        matched = s.matched,
        unmatched_query = s.unmatched_query,
        unmatched_reference = s.unmatched_reference,
        ambiguous = s.ambiguous,
        "key match complete"
    );
    Ok(result)
}

/// Distance to the nearest reference row for each query row, regardless of
/// any tolerance. Diagnostic for choosing a matching radius; scans the
/// full reference catalog per query row.
pub fn nearest_separations(query: &Positions, index: &SkyIndex) -> Vec<Option<Angle>> {
    query
        .vectors()
        .par_iter()
        .map(|slot| {
            slot.as_ref().and_then(|v| {
                let mut best: Option<Angle> = None;
                for r in 0..index.n_rows() {
                    if let Some(p) = index.position(r) {
                        let sep = v.separation(p);
                        if best.map_or(true, |b| sep < b) {
                            best = Some(sep);
                        }
                    }
                }
                best
            })
        })
        .collect()
}

/// Turns per-row candidate lists into a [`CrossMatch`] under `policy`.
///
/// Candidate lists must be sorted by (separation, reference index); the
/// index query and the key lookup both guarantee that.
fn assemble(
    candidates: &[Option<Vec<(usize, Option<Angle>)>>],
    n_reference: usize,
    policy: Disambiguation,
) -> CrossMatch {
    if policy == Disambiguation::All {
        return assemble_one_to_many(candidates, n_reference);
    }

    let mut ambiguous = 0usize;
    let mut claims: Vec<Option<(usize, Option<Angle>)>> = vec![None; candidates.len()];
    for (q, slot) in candidates.iter().enumerate() {
        if let Some(list) = slot {
            match list.len() {
                0 => {}
                1 => claims[q] = Some(list[0]),
                _ => {
                    if policy == Disambiguation::Nearest {
                        claims[q] = Some(list[0]);
                    } else {
                        ambiguous += 1;
                    }
                }
            }
        }
    }

    let retained = resolve_one_to_one(&claims);

    let mut pairs = Vec::new();
    let mut matched_ref = vec![false; n_reference];
    let mut unmatched_query = Vec::new();
    for (q, (claim, keep)) in claims.iter().zip(&retained).enumerate() {
        match claim {
            Some((r, sep)) if *keep => {
                pairs.push(MatchedPair {
                    query: q,
                    reference: *r,
                    separation: *sep,
                });
                matched_ref[*r] = true;
            }
            _ => unmatched_query.push(q),
        }
    }
    let unmatched_reference = (0..n_reference).filter(|&r| !matched_ref[r]).collect();

    CrossMatch::new(pairs, unmatched_query, unmatched_reference, ambiguous, true)
}

fn assemble_one_to_many(
    candidates: &[Option<Vec<(usize, Option<Angle>)>>],
    n_reference: usize,
) -> CrossMatch {
    let mut pairs = Vec::new();
    let mut matched_ref = vec![false; n_reference];
    let mut unmatched_query = Vec::new();
    for (q, slot) in candidates.iter().enumerate() {
        match slot {
            Some(list) if !list.is_empty() => {
                for &(r, sep) in list {
                    pairs.push(MatchedPair {
                        query: q,
                        reference: r,
                        separation: sep,
                    });
                    matched_ref[r] = true;
                }
            }
            _ => unmatched_query.push(q),
        }
    }
    let unmatched_reference = (0..n_reference).filter(|&r| !matched_ref[r]).collect();
    CrossMatch::new(pairs, unmatched_query, unmatched_reference, 0, false)
}

/// Global contention resolution for one-to-one matching.
///
/// For each reference row claimed by more than one query row, the claimant
/// with the smallest separation is kept; an exact distance tie goes to the
/// lowest query row index. Evaluated over the complete claim set, so the
/// result is independent of processing order.
fn resolve_one_to_one(claims: &[Option<(usize, Option<Angle>)>]) -> Vec<bool> {
    let mut best: HashMap<usize, (f64, usize)> = HashMap::new();
    for (q, claim) in claims.iter().enumerate() {
        if let Some((r, sep)) = claim {
            let d = sep.map(|s| s.radians()).unwrap_or(0.0);
            let replace = match best.get(r) {
                None => true,
                Some(&(best_d, best_q)) => d < best_d || (d == best_d && q < best_q),
            };
            if replace {
                best.insert(*r, (d, q));
            }
        }
    }

    claims
        .iter()
        .enumerate()
        .map(|(q, claim)| match claim {
            Some((r, _)) => best.get(r).is_some_and(|&(_, best_q)| best_q == q),
            None => false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{extract_keys, extract_positions, CoordColumns, KeyColumns};
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

    fn keys_of(ids: &[Option<&str>]) -> Keys {
        let rows = ids
            .iter()
            .map(|id| {
                vec![match id {
                    Some(s) => Value::Str(s.to_string()),
                    None => Value::Null,
                }]
            })
            .collect();
        let t = MemTable::from_rows(vec![Column::new("id", ColumnType::Str)], rows).unwrap();
        extract_keys(&t, &KeyColumns::new(&["id"])).unwrap()
    }

    fn nearest(arcsec: f64) -> SkyMatchConfig {
        SkyMatchConfig {
            tolerance: Angle::from_arcseconds(arcsec),
            policy: Disambiguation::Nearest,
        }
    }

    #[test]
    fn test_nearest_picks_closer_of_two_candidates() {
        let reference = positions_of(&[(10.0, 0.0), (10.001, 0.0), (50.0, 50.0)]);
        let query = positions_of(&[(10.0, 0.0005)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();

        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.pairs()[0].query, 0);
        assert_eq!(m.pairs()[0].reference, 0);
        assert!(m.unmatched_query().is_empty());
        assert_eq!(m.unmatched_reference(), &[1, 2]);
        assert!(m.pairs()[0].separation.unwrap().arcseconds() < 2.0);
    }

    #[test]
    fn test_one_to_one_contention_keeps_smaller_separation() {
        // Both query rows fall within tolerance of the single reference
        // row, at 1 and 2 arcsec.
        let reference = positions_of(&[(10.0, 0.0)]);
        let query = positions_of(&[(10.0, 1.0 / 3600.0), (10.0, 2.0 / 3600.0)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();

        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.pairs()[0].query, 0);
        assert_eq!(m.pairs()[0].reference, 0);
        assert_eq!(m.unmatched_query(), &[1]);
        assert!(m.unmatched_reference().is_empty());
    }

    #[test]
    fn test_contention_is_global_not_greedy() {
        // Query row 1 is closer to the contested reference row than query
        // row 0, which arrives first. A greedy first-claim strategy would
        // keep row 0; the global pass must keep row 1.
        let reference = positions_of(&[(10.0, 0.0)]);
        let query = positions_of(&[(10.0, 2.0 / 3600.0), (10.0, 1.0 / 3600.0)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();

        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.pairs()[0].query, 1);
        assert_eq!(m.unmatched_query(), &[0]);
    }

    #[test]
    fn test_nearest_tie_breaks_to_lowest_reference_index() {
        // Two reference rows at the identical position: exact distance tie.
        let reference = positions_of(&[(10.0, 0.0), (10.0, 0.0)]);
        let query = positions_of(&[(10.0, 0.0005)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();
        assert_eq!(m.pairs()[0].reference, 0);
        assert_eq!(m.unmatched_reference(), &[1]);
    }

    #[test]
    fn test_contention_tie_breaks_to_lowest_query_index() {
        let reference = positions_of(&[(10.0, 0.0)]);
        let query = positions_of(&[(10.0, 0.0005), (10.0, 0.0005)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();
        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.pairs()[0].query, 0);
        assert_eq!(m.unmatched_query(), &[1]);
    }

    #[test]
    fn test_strict_policy_counts_ambiguity() {
        let reference = positions_of(&[(10.0, 0.0), (10.0005, 0.0)]);
        let query = positions_of(&[(10.0002, 0.0)]);
        let index = SkyIndex::build(&reference);

        let cfg = SkyMatchConfig {
            tolerance: Angle::from_arcseconds(5.0),
            policy: Disambiguation::Strict,
        };
        let m = match_sky(&query, &index, &cfg).unwrap();

        assert!(m.pairs().is_empty());
        assert_eq!(m.ambiguous(), 1);
        assert_eq!(m.unmatched_query(), &[0]);
        assert_eq!(m.unmatched_reference(), &[0, 1]);
    }

    #[test]
    fn test_all_policy_keeps_every_candidate() {
        let reference = positions_of(&[(10.0, 0.0), (10.0005, 0.0), (80.0, 10.0)]);
        let query = positions_of(&[(10.0002, 0.0)]);
        let index = SkyIndex::build(&reference);

        let cfg = SkyMatchConfig {
            tolerance: Angle::from_arcseconds(5.0),
            policy: Disambiguation::All,
        };
        let m = match_sky(&query, &index, &cfg).unwrap();

        assert!(!m.is_one_to_one());
        assert_eq!(m.pairs().len(), 2);
        assert_eq!(m.pairs()[0].query, 0);
        assert_eq!(m.pairs()[1].query, 0);
        assert_eq!(m.unmatched_reference(), &[2]);
    }

    #[test]
    fn test_unusable_query_rows_become_unmatched() {
        let t = MemTable::from_rows(
            vec![
                Column::new("ra", ColumnType::Float),
                Column::new("dec", ColumnType::Float),
            ],
            vec![
                vec![Value::Float(10.0), Value::Float(0.0)],
                vec![Value::Null, Value::Null],
            ],
        )
        .unwrap();
        let query = extract_positions(&t, &CoordColumns::new("ra", "dec"), false).unwrap();
        let reference = positions_of(&[(10.0, 0.0)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();
        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.unmatched_query(), &[1]);
    }

    #[test]
    fn test_negative_tolerance_fails_fast() {
        let reference = positions_of(&[(10.0, 0.0)]);
        let query = positions_of(&[(10.0, 0.0)]);
        let index = SkyIndex::build(&reference);

        let err = match_sky(&query, &index, &nearest(-1.0)).unwrap_err();
        assert!(matches!(err, MatchError::InvalidTolerance { .. }));
    }

    #[test]
    fn test_empty_catalog_fails() {
        let reference = positions_of(&[(10.0, 0.0)]);
        let index = SkyIndex::build(&reference);

        let t = MemTable::from_rows(
            vec![
                Column::new("ra", ColumnType::Float),
                Column::new("dec", ColumnType::Float),
            ],
            vec![vec![Value::Null, Value::Null]],
        )
        .unwrap();
        let query = extract_positions(&t, &CoordColumns::new("ra", "dec"), false).unwrap();

        let err = match_sky(&query, &index, &nearest(1.0)).unwrap_err();
        match err {
            MatchError::EmptyCatalog { side, .. } => assert_eq!(side, "query"),
            other => panic!("expected EmptyCatalog, got {other}"),
        }
    }

    #[test]
    fn test_key_match_scenario() {
        // reference ["A", "B", "C"], query ["B", "D"]
        let reference = keys_of(&[Some("A"), Some("B"), Some("C")]);
        let query = keys_of(&[Some("B"), Some("D")]);
        let index = KeyIndex::build(&reference);

        let m = match_keys(&query, &index, Disambiguation::Nearest).unwrap();

        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.pairs()[0].query, 0);
        assert_eq!(m.pairs()[0].reference, 1);
        assert_eq!(m.pairs()[0].separation, None);
        assert_eq!(m.unmatched_query(), &[1]);
        assert_eq!(m.unmatched_reference(), &[0, 2]);
    }

    #[test]
    fn test_key_match_duplicate_reference_keys_tie_to_lowest() {
        let reference = keys_of(&[Some("B"), Some("B")]);
        let query = keys_of(&[Some("B")]);
        let index = KeyIndex::build(&reference);

        let m = match_keys(&query, &index, Disambiguation::Nearest).unwrap();
        assert_eq!(m.pairs()[0].reference, 0);
        assert_eq!(m.unmatched_reference(), &[1]);
    }

    #[test]
    fn test_key_match_null_rows_unmatched() {
        let reference = keys_of(&[Some("A")]);
        let query = keys_of(&[Some("A"), None]);
        let index = KeyIndex::build(&reference);

        let m = match_keys(&query, &index, Disambiguation::Nearest).unwrap();
        assert_eq!(m.pairs().len(), 1);
        assert_eq!(m.unmatched_query(), &[1]);
    }

    #[test]
    fn test_partition_completeness_and_injectivity() {
        let reference = positions_of(&[(10.0, 0.0), (10.001, 0.0), (20.0, 5.0), (300.0, -40.0)]);
        let query = positions_of(&[(10.0, 0.0005), (10.001, 0.0005), (20.0, 5.0), (100.0, 60.0)]);
        let index = SkyIndex::build(&reference);

        let m = match_sky(&query, &index, &nearest(5.0)).unwrap();

        let mut q_seen = vec![false; query.len()];
        let mut r_seen = vec![false; reference.len()];
        for p in m.pairs() {
            assert!(!q_seen[p.query], "query row matched twice");
            assert!(!r_seen[p.reference], "reference row matched twice");
            q_seen[p.query] = true;
            r_seen[p.reference] = true;
        }
        for &q in m.unmatched_query() {
            assert!(!q_seen[q], "query row both matched and unmatched");
            q_seen[q] = true;
        }
        for &r in m.unmatched_reference() {
            assert!(!r_seen[r], "reference row both matched and unmatched");
            r_seen[r] = true;
        }
        assert!(q_seen.iter().all(|&s| s), "query partition incomplete");
        assert!(r_seen.iter().all(|&s| s), "reference partition incomplete");
    }

    #[test]
    fn test_determinism() {
        let reference = positions_of(&[(10.0, 0.0), (10.0, 0.0), (10.001, 0.0), (50.0, 50.0)]);
        let query = positions_of(&[(10.0, 0.0005), (10.0, 0.0005), (10.001, 0.0005)]);
        let index = SkyIndex::build(&reference);

        let a = match_sky(&query, &index, &nearest(5.0)).unwrap();
        let b = match_sky(&query, &index, &nearest(5.0)).unwrap();

        assert_eq!(a.pairs(), b.pairs());
        assert_eq!(a.unmatched_query(), b.unmatched_query());
        assert_eq!(a.unmatched_reference(), b.unmatched_reference());
    }

    #[test]
    fn test_nearest_separations_diagnostic() {
        let reference = positions_of(&[(10.0, 0.0), (50.0, 50.0)]);
        let query = positions_of(&[(10.0, 0.0005), (49.0, 50.0)]);
        let index = SkyIndex::build(&reference);

        let seps = nearest_separations(&query, &index);
        assert_eq!(seps.len(), 2);
        assert!((seps[0].unwrap().arcseconds() - 1.8).abs() < 0.01);
        assert!(seps[1].unwrap().degrees() < 1.0);
    }
}
