//! Mention-level bipartite matching inside one gold/system cluster pair.
//!
//! For two clusters of equal metatype (Entity or Event), build the
//! gold-mention × system-mention matrix of gated overlap scores, solve it
//! with the assignment engine, and roll the matched pairs up into a scalar
//! cluster-pair similarity: the count of positive pairs (unweighted) or the
//! sum of their overlaps (weighted).
//!
//! Type gate: the two clusters must share at least one top-level type
//! (1 level for entities, 2 for events) or the similarity is 0 without
//! running assignment. The gate is both a short-circuit and a correctness
//! requirement: type-incompatible clusters must never align.

use crate::align::munkres::assign_max;
use crate::cluster::{Cluster, Mention, Metatype};
use crate::config::{ScoringConfig, Weighting};
use crate::error::{Error, Result};
use crate::span::gated_overlap;

/// Gated overlap between two mentions: the maximum gated IoU over their
/// same-modality span pairs. Cross-modality span pairs are skipped rather
/// than compared.
pub fn mention_overlap(
    gold: &Mention,
    system: &Mention,
    config: &ScoringConfig,
) -> Result<f64> {
    let mut best = 0.0_f64;
    for g in &gold.spans {
        for s in &system.spans {
            if g.modality() != s.modality() {
                continue;
            }
            let iou = gated_overlap(g, s, &config.thresholds, config.language())?;
            best = best.max(iou);
        }
    }
    Ok(best)
}

/// Cluster-pair similarity from a maximum-weight one-to-one mention pairing.
///
/// Returns an integrity error for mismatched metatypes and rejects Relation
/// clusters, which are compared through frames instead.
pub fn cluster_similarity(
    gold: &Cluster,
    system: &Cluster,
    config: &ScoringConfig,
) -> Result<f64> {
    if gold.metatype() != system.metatype() {
        return Err(Error::integrity(format!(
            "cannot compare gold cluster '{}' ({}) with system cluster '{}' ({})",
            gold.id(),
            gold.metatype(),
            system.id(),
            system.metatype()
        )));
    }
    if gold.metatype() == Metatype::Relation {
        return Err(Error::invalid_input(format!(
            "relation clusters '{}'/'{}' are compared as frames, not by mention overlap",
            gold.id(),
            system.id()
        )));
    }

    if gold.top_level_types().is_disjoint(&system.top_level_types()) {
        return Ok(0.0);
    }

    let matrix: Vec<Vec<f64>> = gold
        .mentions()
        .iter()
        .map(|g| {
            system
                .mentions()
                .iter()
                .map(|s| mention_overlap(g, s, config))
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let pairs = assign_max(&matrix);
    let similarity = match config.weighting {
        Weighting::Unweighted => pairs
            .iter()
            .filter(|&&(g, s)| matrix[g][s] > 0.0)
            .count() as f64,
        Weighting::Weighted => pairs.iter().map(|&(g, s)| matrix[g][s]).sum(),
    };
    Ok(similarity)
}
