//! Claim-ranking NDCG with a greedy ideal-ranking construction.
//!
//! The gain of a ranked claim is its novelty against everything ranked
//! above it: the minimum over already-seen claims of `1 - fieldOverlap`,
//! weighted per field. A claim whose required fields were assessed
//! incorrect, or whose relation tag is incompatible with the query's
//! requested relation, gains nothing no matter how novel it is.
//!
//! IDCG is not the true optimum. It is built greedily: repeatedly append
//! whichever remaining claim maximizes the marginal discounted gain. The
//! greedy list is an approximation, so a submitted ranking can in rare
//! orderings out-score it; the ratio is reported as-is, not clamped.

use crate::metrics::MacroAverage;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One assessed claim in a ranked response list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Claim identifier.
    pub id: String,
    /// Claim-relation tag (e.g. supports / refutes).
    pub relation: String,
    /// Assessed claim fields, by field name.
    pub fields: BTreeMap<String, BTreeSet<String>>,
    /// Whether the required fields were assessed correct.
    pub required_correct: bool,
}

/// The query a ranked claim list answers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimQuery {
    /// Query identifier.
    pub id: String,
    /// Requested relation; `None` accepts any claim relation.
    pub relation: Option<String>,
    /// Per-field overlap weights; unlisted fields weigh 1.
    pub field_weights: BTreeMap<String, f64>,
}

impl ClaimQuery {
    /// Query accepting any relation, with unit field weights.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    fn accepts(&self, claim: &Claim) -> bool {
        match self.relation.as_deref() {
            Some(wanted) => claim.relation == wanted,
            None => true,
        }
    }

    fn weight(&self, field: &str) -> f64 {
        self.field_weights.get(field).copied().unwrap_or(1.0)
    }
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Weighted field overlap of two claims, in `[0, 1]`.
fn field_overlap(a: &Claim, b: &Claim, query: &ClaimQuery) -> f64 {
    let names: BTreeSet<&String> = a.fields.keys().chain(b.fields.keys()).collect();
    let mut weighted = 0.0;
    let mut total = 0.0;
    let empty = BTreeSet::new();
    for name in names {
        let w = query.weight(name);
        let left = a.fields.get(name.as_str()).unwrap_or(&empty);
        let right = b.fields.get(name.as_str()).unwrap_or(&empty);
        weighted += w * jaccard(left, right);
        total += w;
    }
    if total == 0.0 {
        0.0
    } else {
        weighted / total
    }
}

/// Novelty of `claim` against one already-ranked claim.
#[must_use]
pub fn novelty(claim: &Claim, seen: &Claim, query: &ClaimQuery) -> f64 {
    1.0 - field_overlap(claim, seen, query)
}

/// Gain of `claim` at its rank, given everything ranked above it.
///
/// Gated to 0 for incorrect required fields or an incompatible relation;
/// a claim with nothing above it gains its full novelty of 1.
#[must_use]
pub fn gain(claim: &Claim, seen: &[&Claim], query: &ClaimQuery) -> f64 {
    if !claim.required_correct || !query.accepts(claim) {
        return 0.0;
    }
    seen.iter()
        .map(|s| novelty(claim, s, query))
        .fold(1.0, f64::min)
}

fn discount(position: usize) -> f64 {
    ((position + 2) as f64).log2()
}

/// Discounted cumulative gain of a ranked claim list.
#[must_use]
pub fn dcg(ranking: &[Claim], query: &ClaimQuery) -> f64 {
    let mut seen: Vec<&Claim> = Vec::with_capacity(ranking.len());
    let mut total = 0.0;
    for (position, claim) in ranking.iter().enumerate() {
        total += gain(claim, &seen, query) / discount(position);
        seen.push(claim);
    }
    total
}

/// Greedy ideal DCG over the same claim set.
///
/// At every position, append whichever remaining claim maximizes the
/// marginal discounted gain (ties broken by claim id). An upper-bound
/// heuristic, not a guaranteed optimum.
#[must_use]
pub fn ideal_dcg(claims: &[Claim], query: &ClaimQuery) -> f64 {
    let mut remaining: Vec<&Claim> = claims.iter().collect();
    let mut chosen: Vec<&Claim> = Vec::with_capacity(claims.len());
    let mut total = 0.0;
    let mut position = 0_usize;
    while !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_gain = f64::NEG_INFINITY;
        for (i, candidate) in remaining.iter().enumerate() {
            let g = gain(candidate, &chosen, query);
            let better = g > best_gain
                || (g == best_gain && candidate.id < remaining[best_index].id);
            if better {
                best_gain = g;
                best_index = i;
            }
        }
        let picked = remaining.swap_remove(best_index);
        total += best_gain / discount(position);
        chosen.push(picked);
        position += 1;
    }
    total
}

/// NDCG of a submitted ranking: DCG over greedy IDCG, 0 when the ideal is
/// itself 0.
#[must_use]
pub fn ndcg(ranking: &[Claim], query: &ClaimQuery) -> f64 {
    let ideal = ideal_dcg(ranking, query);
    if ideal <= 0.0 {
        log::warn!(
            "query '{}' has zero ideal DCG; NDCG defaults to 0",
            query.id
        );
        return 0.0;
    }
    dcg(ranking, query) / ideal
}

/// Per-query NDCG row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdcgScore {
    /// Query id.
    pub query_id: String,
    /// NDCG of the submitted ranking.
    pub ndcg: f64,
    /// Ranked list length.
    pub claims: usize,
}

/// Score one submitted ranking for its query.
#[must_use]
pub fn score_ranking(ranking: &[Claim], query: &ClaimQuery) -> NdcgScore {
    NdcgScore {
        query_id: query.id.clone(),
        ndcg: ndcg(ranking, query),
        claims: ranking.len(),
    }
}

/// Macro-average NDCG over queries.
#[must_use]
pub fn macro_ndcg(rows: &[NdcgScore]) -> MacroAverage {
    let values: Vec<f64> = rows.iter().map(|r| r.ndcg).collect();
    MacroAverage::of(&values)
}
