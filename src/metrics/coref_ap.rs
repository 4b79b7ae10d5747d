//! Coreference and argument Average Precision over pooled, assessed
//! responses.
//!
//! Each (gold equivalence class, system cluster) pair owns a pool of
//! responses carrying an external rank, an assessment, and an optional
//! confidence. AP walks the pool in rank order (unranked responses sort
//! last), optionally truncating at a document-count cutoff, and divides the
//! precision-at-hit sum by the relevant ground-truth count (itself capped
//! by the cutoff when truncation is active).
//!
//! Two variants:
//!
//! | variant | ranked unit |
//! |---------|-------------|
//! | V1      | every pooled response |
//! | V2      | best-ranked response per document |
//!
//! The many-to-one question of which system cluster answers which gold
//! class is settled globally: a matrix of per-pair AP values goes through
//! the same optimal assignment used for cluster alignment, at query rather
//! than document granularity.

use crate::align::{align, Alignment, IndexMapping, SimilarityTable};
use crate::config::{ConfidenceWeighting, ScoringConfig};
use crate::error::Result;
use crate::metrics::MacroAverage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// One pooled, assessed response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PooledResponse {
    /// Response identifier.
    pub response_id: String,
    /// Document the response was drawn from.
    pub document_id: String,
    /// External rank; unranked responses sort after every ranked one.
    pub rank: Option<u32>,
    /// Optional system confidence.
    pub confidence: Option<f64>,
    /// Assessor judgment.
    pub correct: bool,
}

/// Which responses enter the ranked walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApVariant {
    /// Every pooled response is a ranked item.
    #[default]
    PerResponse,
    /// Only the best-ranked response per document is a ranked item.
    BestPerDocument,
}

/// Per-pair AP row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApScore {
    /// Gold equivalence class id.
    pub gold_class: String,
    /// System cluster id.
    pub system_cluster: String,
    /// Average precision in `[0, 1]`.
    pub average_precision: f64,
    /// Relevant ground-truth count used as the divisor.
    pub relevant: usize,
    /// Responses actually walked after variant filtering and truncation.
    pub walked: usize,
}

fn rank_order(a: &PooledResponse, b: &PooledResponse) -> Ordering {
    match (a.rank, b.rank) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn response_weight(
    response: &PooledResponse,
    weighting: ConfidenceWeighting,
    max_confidence: f64,
) -> f64 {
    match weighting {
        ConfidenceWeighting::Unit => 1.0,
        ConfidenceWeighting::Raw => response.confidence.unwrap_or_else(|| {
            log::warn!(
                "response '{}' has no confidence; weighting it 1.0",
                response.response_id
            );
            1.0
        }),
        ConfidenceWeighting::Normalized => {
            let raw = response.confidence.unwrap_or_else(|| {
                log::warn!(
                    "response '{}' has no confidence; weighting it 1.0",
                    response.response_id
                );
                1.0
            });
            if max_confidence > 0.0 {
                raw / max_confidence
            } else {
                1.0
            }
        }
    }
}

/// Average precision of a response pool against `ground_truth` relevant
/// items.
///
/// Returns 0 when the relevant count is zero (missing-data default).
#[must_use]
pub fn average_precision(
    responses: &[PooledResponse],
    ground_truth: usize,
    config: &ScoringConfig,
    variant: ApVariant,
) -> f64 {
    score_pool(responses, ground_truth, config, variant).0
}

fn score_pool(
    responses: &[PooledResponse],
    ground_truth: usize,
    config: &ScoringConfig,
    variant: ApVariant,
) -> (f64, usize, usize) {
    let mut ranked: Vec<&PooledResponse> = responses.iter().collect();
    ranked.sort_by(|a, b| rank_order(a, b));

    if variant == ApVariant::BestPerDocument {
        let mut seen = BTreeSet::new();
        ranked.retain(|r| seen.insert(r.document_id.clone()));
    }

    let relevant = match config.cutoff {
        Some(cutoff) => ground_truth.min(cutoff),
        None => ground_truth,
    };
    if relevant == 0 {
        log::warn!("no relevant ground-truth items; average precision defaults to 0");
        return (0.0, 0, 0);
    }

    let max_confidence = ranked
        .iter()
        .filter_map(|r| r.confidence)
        .fold(0.0_f64, f64::max);

    let mut documents = BTreeSet::new();
    let mut weighted_correct = 0.0;
    let mut precision_sum = 0.0;
    let mut walked = 0_usize;
    for response in &ranked {
        if let Some(cutoff) = config.cutoff {
            if !documents.contains(&response.document_id) && documents.len() >= cutoff {
                break;
            }
        }
        documents.insert(response.document_id.clone());
        walked += 1;
        if response.correct {
            weighted_correct +=
                response_weight(response, config.confidence_weighting, max_confidence);
            precision_sum += weighted_correct / walked as f64;
        }
    }

    (precision_sum / relevant as f64, relevant, walked)
}

/// Response pools keyed by gold class, then system cluster.
pub type ResponsePools = BTreeMap<String, BTreeMap<String, Vec<PooledResponse>>>;

/// Score every pool and settle the class/cluster question with a global
/// optimal assignment over the AP matrix. Returned rows cover aligned
/// pairs only; pairs discarded at zero AP never appear.
pub fn score_average_precision(
    pools: &ResponsePools,
    ground_truth: &BTreeMap<String, usize>,
    config: &ScoringConfig,
    variant: ApVariant,
) -> Result<Vec<ApScore>> {
    let mut table = SimilarityTable::new();
    let mut system_ids = BTreeSet::new();
    let mut details: BTreeMap<(String, String), (f64, usize, usize)> = BTreeMap::new();
    for (gold_class, row) in pools {
        let truth = ground_truth.get(gold_class).copied().unwrap_or_else(|| {
            log::warn!("gold class '{gold_class}' has no ground-truth count; using 0");
            0
        });
        for (system_cluster, responses) in row {
            let (ap, relevant, walked) = score_pool(responses, truth, config, variant);
            table.set(gold_class.as_str(), system_cluster.as_str(), ap);
            details.insert(
                (gold_class.clone(), system_cluster.clone()),
                (ap, relevant, walked),
            );
            system_ids.insert(system_cluster.clone());
        }
    }

    let gold_mapping = IndexMapping::from_ids(pools.keys().cloned());
    let system_mapping = IndexMapping::from_ids(system_ids);
    let alignment = align(&table, &gold_mapping, &system_mapping)?;

    let mut rows = Vec::new();
    for (gold_class, entry) in alignment.gold_entries() {
        let key = (gold_class.to_string(), entry.aligned_to.clone());
        if let Some(&(ap, relevant, walked)) = details.get(&key) {
            rows.push(ApScore {
                gold_class: key.0,
                system_cluster: key.1,
                average_precision: ap,
                relevant,
                walked,
            });
        }
    }
    rows.sort_by(|a, b| a.gold_class.cmp(&b.gold_class));
    Ok(rows)
}

/// Macro-average AP over scored rows, padded with a zero for every gold
/// class that received no aligned cluster.
#[must_use]
pub fn macro_average_precision(rows: &[ApScore], gold_classes: usize) -> MacroAverage {
    let mut values: Vec<f64> = rows.iter().map(|r| r.average_precision).collect();
    values.resize(values.len().max(gold_classes), 0.0);
    MacroAverage::of(&values)
}
