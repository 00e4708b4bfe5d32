//! The immutable record of a completed cross-match.
//!
//! A [`CrossMatch`] owns three collections: the matched pairs (query row →
//! reference row with the measured separation), the unmatched query rows,
//! and the unmatched reference rows. Together they partition both
//! catalogs: every row index appears on exactly one side of the ledger.
//! Created by the matcher, consumed by the merger, never mutated.
//!
//! Summary statistics are recomputed from the pair list on demand — there
//! is no cached state to keep correct.

use xmatch_core::Angle;

/// One correspondence: query row, reference row, measured separation.
///
/// `separation` is `None` for identifier matches, where equality has no
/// distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    pub query: usize,
    pub reference: usize,
    pub separation: Option<Angle>,
}

/// Immutable result of matching a query catalog against a reference.
#[derive(Debug, Clone)]
pub struct CrossMatch {
    pairs: Vec<MatchedPair>,
    unmatched_query: Vec<usize>,
    unmatched_reference: Vec<usize>,
    ambiguous: usize,
    one_to_one: bool,
}

impl CrossMatch {
    pub(crate) fn new(
        pairs: Vec<MatchedPair>,
        unmatched_query: Vec<usize>,
        unmatched_reference: Vec<usize>,
        ambiguous: usize,
        one_to_one: bool,
    ) -> Self {
        CrossMatch {
            pairs,
            unmatched_query,
            unmatched_reference,
            ambiguous,
            one_to_one,
        }
    }

    /// Matched pairs, ordered by query row (and by separation within a
    /// query row under the `all` policy).
    pub fn pairs(&self) -> &[MatchedPair] {
        &self.pairs
    }

    /// Query rows with no retained match, ascending. Includes rows that
    /// were unmatchable at extraction time.
    pub fn unmatched_query(&self) -> &[usize] {
        &self.unmatched_query
    }

    /// Reference rows claimed by no retained pair, ascending.
    pub fn unmatched_reference(&self) -> &[usize] {
        &self.unmatched_reference
    }

    /// Number of query rows demoted as ambiguous under the `strict`
    /// policy. Diagnostic only; those rows are counted unmatched.
    pub fn ambiguous(&self) -> usize {
        self.ambiguous
    }

    /// Whether the one-to-one discipline was applied (false under `all`).
    pub fn is_one_to_one(&self) -> bool {
        self.one_to_one
    }

    /// Summary statistics, recomputed from the pair list.
    pub fn summary(&self) -> MatchSummary {
        let mut seps: Vec<f64> = self
            .pairs
            .iter()
            .filter_map(|p| p.separation.map(|s| s.arcseconds()))
            .collect();
        seps.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let (min, median, max) = if seps.is_empty() {
            (None, None, None)
        } else {
            let n = seps.len();
            let median = if n % 2 == 1 {
                seps[n / 2]
            } else {
                0.5 * (seps[n / 2 - 1] + seps[n / 2])
            };
            (Some(seps[0]), Some(median), Some(seps[n - 1]))
        };

        MatchSummary {
            matched: self.pairs.len(),
            unmatched_query: self.unmatched_query.len(),
            unmatched_reference: self.unmatched_reference.len(),
            ambiguous: self.ambiguous,
            min_arcsec: min,
            median_arcsec: median,
            max_arcsec: max,
        }
    }
}

/// Counts and separation statistics for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSummary {
    pub matched: usize,
    pub unmatched_query: usize,
    pub unmatched_reference: usize,
    pub ambiguous: usize,
    /// Smallest matched separation in arcseconds; `None` for identifier
    /// matches or when nothing matched.
    pub min_arcsec: Option<f64>,
    pub median_arcsec: Option<f64>,
    pub max_arcsec: Option<f64>,
}
