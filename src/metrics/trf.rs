//! Type-role-filler (TRF) tuple alignment and scoring.
//!
//! One alignment problem per document: gold TRF tuples against system TRF
//! tuples, pair similarity
//!
//! ```text
//! typeSimilarity x rolesPrecision x clusterSimilarity
//! ```
//!
//! where type similarity is an F1 over the tuples' truncated type sets,
//! roles precision is the share of system roles also asserted by gold, and
//! cluster similarity is an F1 over a nested mention-level optimal
//! assignment restricted to the two tuples' filler mentions. Pairs at zero
//! similarity are discarded by the assignment; tuples left unaligned on
//! either side score zero in the final mean.

use crate::align::munkres::assign_max;
use crate::align::{align, mention_overlap, Alignment, IndexMapping, SimilarityTable};
use crate::cluster::{top_level_types, Mention, Metatype};
use crate::config::ScoringConfig;
use crate::error::Result;
use crate::metrics::types::type_f1;
use crate::metrics::{MacroAverage, Scores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One type-role-filler tuple.
#[derive(Debug, Clone)]
pub struct TrfTuple {
    /// Tuple identifier, unique within its side.
    pub id: String,
    /// Event or Relation.
    pub metatype: Metatype,
    /// Asserted type paths.
    pub types: BTreeSet<String>,
    /// Asserted role labels.
    pub roles: BTreeSet<String>,
    /// Mentions of the filler cluster.
    pub fillers: Vec<Mention>,
}

/// Per-item TRF row. Unaligned tuples appear with one side empty and a
/// zero similarity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrfScore {
    /// Document this row was scored in.
    pub document_id: String,
    /// Gold tuple id, when present.
    pub gold_tuple: Option<String>,
    /// System tuple id, when present.
    pub system_tuple: Option<String>,
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
}

fn roles_precision(gold: &BTreeSet<String>, system: &BTreeSet<String>) -> f64 {
    if system.is_empty() {
        return 0.0;
    }
    gold.intersection(system).count() as f64 / system.len() as f64
}

/// F1 over the optimal mention-level assignment between two filler sets.
fn filler_similarity(
    gold: &[Mention],
    system: &[Mention],
    config: &ScoringConfig,
) -> Result<f64> {
    if gold.is_empty() || system.is_empty() {
        return Ok(0.0);
    }
    let mut matrix = vec![vec![0.0; system.len()]; gold.len()];
    for (g, gold_mention) in gold.iter().enumerate() {
        for (s, system_mention) in system.iter().enumerate() {
            matrix[g][s] = mention_overlap(gold_mention, system_mention, config)?;
        }
    }
    let matched = assign_max(&matrix)
        .into_iter()
        .filter(|&(g, s)| matrix[g][s] > 0.0)
        .count();
    Ok(Scores::from_counts(matched, system.len(), gold.len()).f1)
}

/// Similarity of a gold/system TRF tuple pair.
pub fn tuple_similarity(
    gold: &TrfTuple,
    system: &TrfTuple,
    config: &ScoringConfig,
) -> Result<f64> {
    let gold_types = top_level_types(&gold.types, gold.metatype);
    let system_types = top_level_types(&system.types, system.metatype);
    let type_similarity = type_f1(&gold_types, &system_types).f1;
    if type_similarity == 0.0 {
        return Ok(0.0);
    }
    let precision = roles_precision(&gold.roles, &system.roles);
    if precision == 0.0 {
        return Ok(0.0);
    }
    Ok(type_similarity * precision * filler_similarity(&gold.fillers, &system.fillers, config)?)
}

/// Align and score TRF tuples for one document.
///
/// Produces one row per aligned pair plus a zero row for every unaligned
/// tuple on either side.
pub fn score_trf(
    document_id: &str,
    gold: &[TrfTuple],
    system: &[TrfTuple],
    config: &ScoringConfig,
) -> Result<Vec<TrfScore>> {
    let mut table = SimilarityTable::new();
    for g in gold {
        for s in system {
            table.set(g.id.as_str(), s.id.as_str(), tuple_similarity(g, s, config)?);
        }
    }
    let gold_ids = IndexMapping::from_ids(gold.iter().map(|t| t.id.clone()));
    let system_ids = IndexMapping::from_ids(system.iter().map(|t| t.id.clone()));
    let alignment = align(&table, &gold_ids, &system_ids)?;

    let mut rows = Vec::new();
    for g in gold {
        match alignment.system_for(&g.id) {
            Some(entry) => rows.push(TrfScore {
                document_id: document_id.to_string(),
                gold_tuple: Some(g.id.clone()),
                system_tuple: Some(entry.aligned_to.clone()),
                similarity: entry.aligned_similarity,
            }),
            None => rows.push(TrfScore {
                document_id: document_id.to_string(),
                gold_tuple: Some(g.id.clone()),
                system_tuple: None,
                similarity: 0.0,
            }),
        }
    }
    for s in system {
        if alignment.gold_for(&s.id).is_none() {
            rows.push(TrfScore {
                document_id: document_id.to_string(),
                gold_tuple: None,
                system_tuple: Some(s.id.clone()),
                similarity: 0.0,
            });
        }
    }
    Ok(rows)
}

/// Mean TRF similarity over rows, zeros included.
#[must_use]
pub fn macro_trf(rows: &[TrfScore]) -> MacroAverage {
    let sims: Vec<f64> = rows.iter().map(|r| r.similarity).collect();
    MacroAverage::of(&sims)
}

/// The TRF alignment alone, without row expansion.
pub fn align_trf(
    gold: &[TrfTuple],
    system: &[TrfTuple],
    config: &ScoringConfig,
) -> Result<Alignment> {
    let mut table = SimilarityTable::new();
    for g in gold {
        for s in system {
            table.set(g.id.as_str(), s.id.as_str(), tuple_similarity(g, s, config)?);
        }
    }
    let gold_ids = IndexMapping::from_ids(gold.iter().map(|t| t.id.clone()));
    let system_ids = IndexMapping::from_ids(system.iter().map(|t| t.id.clone()));
    align(&table, &gold_ids, &system_ids)
}
