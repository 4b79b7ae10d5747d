//! Global gold↔system alignment via optimal assignment.
//!
//! The alignment pipeline runs in two strictly ordered phases per document:
//!
//! 1. [`align_clusters`] aligns all non-Relation clusters (entities and
//!    events together, one assignment problem);
//! 2. [`align_frames`] aligns relation frames, whose similarity is defined
//!    in terms of the phase-1 result.
//!
//! Both phases follow the same "optimize, then filter" shape: build a
//! [`SimilarityTable`], solve the padded assignment problem exactly with
//! [`munkres::assign_max`], then record only pairs whose original
//! similarity is positive. Zero-similarity pairs the solver emits to
//! complete the matching are discarded, never recorded.
//!
//! # Example
//!
//! ```rust
//! use kbeval::align::align_clusters;
//! use kbeval::cluster::{Cluster, Mention, Metatype};
//! use kbeval::config::ScoringConfig;
//! use kbeval::span::{Span, ThresholdTable};
//!
//! let mut gold = Cluster::new("G1", Metatype::Entity);
//! gold.push_mention(
//!     Mention::new("GM1", Metatype::Entity, "G1", Span::text("D1", "D1E1", 0, 4))
//!         .with_type("PER"),
//! )?;
//! let mut system = Cluster::new("S1", Metatype::Entity);
//! system.push_mention(
//!     Mention::new("SM1", Metatype::Entity, "S1", Span::text("D1", "D1E1", 0, 4))
//!         .with_type("PER"),
//! )?;
//!
//! let mut thresholds = ThresholdTable::empty();
//! thresholds.set_language("eng", 0.3);
//! let config = ScoringConfig::default().with_thresholds(thresholds);
//!
//! let alignment = align_clusters(&[gold], &[system], &config)?;
//! assert_eq!(alignment.system_for("G1").unwrap().aligned_to, "S1");
//! # Ok::<(), kbeval::Error>(())
//! ```

pub mod frame;
pub mod mention;
pub mod munkres;

pub use frame::{frame_self_similarity, frame_similarity};
pub use mention::{cluster_similarity, mention_overlap};

use crate::cluster::{Cluster, Frame, Metatype};
use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse gold-id → system-id → similarity map.
///
/// Entries absent or ≤ 0 mean "not alignable".
#[derive(Debug, Clone, Default)]
pub struct SimilarityTable {
    scores: HashMap<String, HashMap<String, f64>>,
}

impl SimilarityTable {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a similarity. Non-positive scores are dropped on read.
    pub fn set(&mut self, gold_id: impl Into<String>, system_id: impl Into<String>, score: f64) {
        self.scores
            .entry(gold_id.into())
            .or_default()
            .insert(system_id.into(), score);
    }

    /// Similarity for a pair; 0 when absent or non-positive.
    #[must_use]
    pub fn get(&self, gold_id: &str, system_id: &str) -> f64 {
        self.scores
            .get(gold_id)
            .and_then(|row| row.get(system_id))
            .copied()
            .filter(|&s| s > 0.0)
            .unwrap_or(0.0)
    }
}

/// Bijection between string ids and dense indices for the solver.
///
/// Rebuilt per alignment call and discarded afterwards. Insertion order is
/// preserved so matrices are deterministic for a given input order.
#[derive(Debug, Clone, Default)]
pub struct IndexMapping {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl IndexMapping {
    /// Build a mapping from an ordered sequence of ids.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut mapping = Self::default();
        for id in ids {
            let id = id.into();
            if !mapping.index.contains_key(&id) {
                mapping.index.insert(id.clone(), mapping.ids.len());
                mapping.ids.push(id);
            }
        }
        mapping
    }

    /// Id at a dense index.
    #[must_use]
    pub fn id(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(String::as_str)
    }

    /// Dense index of an id.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// All ids in dense-index order.
    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the mapping is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One side of an alignment: the counterpart id and the similarity that
/// produced the pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentEntry {
    /// Id of the aligned counterpart.
    pub aligned_to: String,
    /// Similarity of the aligned pair; always positive.
    pub aligned_similarity: f64,
}

/// One-to-one gold↔system correspondence with similarity scores.
///
/// Invariants (checked by [`verify`](Self::verify), enforced by
/// [`record`](Self::record)):
/// - the gold→system and system→gold maps are exact inverses;
/// - no recorded entry has similarity ≤ 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Alignment {
    gold_to_system: HashMap<String, AlignmentEntry>,
    system_to_gold: HashMap<String, AlignmentEntry>,
}

impl Alignment {
    /// Empty alignment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an aligned pair.
    ///
    /// Rejects non-positive similarities (explicit exclusion, not merely
    /// absence) and ids already aligned to something else.
    pub fn record(
        &mut self,
        gold_id: impl Into<String>,
        system_id: impl Into<String>,
        similarity: f64,
    ) -> Result<()> {
        let gold_id = gold_id.into();
        let system_id = system_id.into();
        if similarity <= 0.0 {
            return Err(Error::integrity(format!(
                "refusing to record zero-similarity alignment '{gold_id}' -> '{system_id}'"
            )));
        }
        if self.gold_to_system.contains_key(&gold_id) {
            return Err(Error::integrity(format!(
                "gold cluster '{gold_id}' is already aligned"
            )));
        }
        if self.system_to_gold.contains_key(&system_id) {
            return Err(Error::integrity(format!(
                "system cluster '{system_id}' is already aligned"
            )));
        }
        self.gold_to_system.insert(
            gold_id.clone(),
            AlignmentEntry {
                aligned_to: system_id.clone(),
                aligned_similarity: similarity,
            },
        );
        self.system_to_gold.insert(
            system_id,
            AlignmentEntry {
                aligned_to: gold_id,
                aligned_similarity: similarity,
            },
        );
        Ok(())
    }

    /// Entry for a gold id: which system cluster it aligned to.
    #[must_use]
    pub fn system_for(&self, gold_id: &str) -> Option<&AlignmentEntry> {
        self.gold_to_system.get(gold_id)
    }

    /// Entry for a system id: which gold cluster it aligned to.
    #[must_use]
    pub fn gold_for(&self, system_id: &str) -> Option<&AlignmentEntry> {
        self.system_to_gold.get(system_id)
    }

    /// Iterate `(gold id, entry)` pairs.
    pub fn gold_entries(&self) -> impl Iterator<Item = (&str, &AlignmentEntry)> {
        self.gold_to_system.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate `(system id, entry)` pairs.
    pub fn system_entries(&self) -> impl Iterator<Item = (&str, &AlignmentEntry)> {
        self.system_to_gold.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of aligned pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.gold_to_system.len()
    }

    /// Whether no pairs are aligned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gold_to_system.is_empty()
    }

    /// Check the inverse-map and positive-similarity invariants.
    pub fn verify(&self) -> Result<()> {
        if self.gold_to_system.len() != self.system_to_gold.len() {
            return Err(Error::integrity(format!(
                "alignment maps disagree in size: {} gold entries vs {} system entries",
                self.gold_to_system.len(),
                self.system_to_gold.len()
            )));
        }
        for (gold_id, entry) in &self.gold_to_system {
            if entry.aligned_similarity <= 0.0 {
                return Err(Error::integrity(format!(
                    "alignment entry '{gold_id}' -> '{}' has non-positive similarity",
                    entry.aligned_to
                )));
            }
            match self.system_to_gold.get(&entry.aligned_to) {
                Some(back) if back.aligned_to == *gold_id => {}
                _ => {
                    return Err(Error::integrity(format!(
                        "alignment maps are not mutual inverses at '{gold_id}' -> '{}'",
                        entry.aligned_to
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Solve a [`SimilarityTable`] into an [`Alignment`].
///
/// Builds the dense matrix over the two index mappings, runs the assignment
/// engine, and records only pairs with positive original similarity.
pub fn align(
    table: &SimilarityTable,
    gold_ids: &IndexMapping,
    system_ids: &IndexMapping,
) -> Result<Alignment> {
    let mut alignment = Alignment::new();
    if gold_ids.is_empty() || system_ids.is_empty() {
        return Ok(alignment);
    }

    let matrix: Vec<Vec<f64>> = gold_ids
        .ids()
        .iter()
        .map(|gold| {
            system_ids
                .ids()
                .iter()
                .map(|system| table.get(gold, system))
                .collect()
        })
        .collect();

    let pairs = munkres::assign_max(&matrix);
    let mut discarded = 0_usize;
    for (g, s) in pairs {
        let similarity = matrix[g][s];
        if similarity <= 0.0 {
            discarded += 1;
            continue;
        }
        alignment.record(gold_ids.ids()[g].as_str(), system_ids.ids()[s].as_str(), similarity)?;
    }
    log::debug!(
        "aligned {} of {} gold x {} system; discarded {} zero-similarity pairs",
        alignment.len(),
        gold_ids.len(),
        system_ids.len(),
        discarded
    );
    Ok(alignment)
}

/// Phase 1: globally align entity and event clusters for one document.
///
/// Relation clusters on either side are excluded; they are aligned in phase
/// 2 through their frames. Similarity is only computed for same-metatype
/// pairs, so type-incompatible clusters can never align.
pub fn align_clusters(
    gold: &[Cluster],
    system: &[Cluster],
    config: &ScoringConfig,
) -> Result<Alignment> {
    let gold: Vec<&Cluster> = gold
        .iter()
        .filter(|c| c.metatype() != Metatype::Relation)
        .collect();
    let system: Vec<&Cluster> = system
        .iter()
        .filter(|c| c.metatype() != Metatype::Relation)
        .collect();

    let mut table = SimilarityTable::new();
    for g in &gold {
        for s in &system {
            if g.metatype() != s.metatype() {
                continue;
            }
            let similarity = mention::cluster_similarity(g, s, config)?;
            if similarity > 0.0 {
                table.set(g.id(), s.id(), similarity);
            }
        }
    }

    let gold_ids = IndexMapping::from_ids(gold.iter().map(|c| c.id()));
    let system_ids = IndexMapping::from_ids(system.iter().map(|c| c.id()));
    align(&table, &gold_ids, &system_ids)
}

/// Phase 2: globally align relation frames for one document.
///
/// Requires the finalized entity/event alignment from
/// [`align_clusters`]; frame similarity maps system fillers through it.
pub fn align_frames(
    gold: &[Frame],
    system: &[Frame],
    entity_event_alignment: &Alignment,
) -> Result<Alignment> {
    let mut table = SimilarityTable::new();
    for g in gold {
        for s in system {
            if g.metatype != s.metatype {
                continue;
            }
            let similarity = frame::frame_similarity(g, s, entity_event_alignment)?;
            if similarity > 0.0 {
                table.set(&g.cluster_id, &s.cluster_id, similarity);
            }
        }
    }

    let gold_ids = IndexMapping::from_ids(gold.iter().map(|f| f.cluster_id.clone()));
    let system_ids = IndexMapping::from_ids(system.iter().map(|f| f.cluster_id.clone()));
    align(&table, &gold_ids, &system_ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_rejects_zero_similarity() {
        let mut alignment = Alignment::new();
        assert!(matches!(
            alignment.record("G1", "S1", 0.0),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn record_rejects_double_alignment() {
        let mut alignment = Alignment::new();
        alignment.record("G1", "S1", 0.5).unwrap();
        assert!(alignment.record("G1", "S2", 0.5).is_err());
        assert!(alignment.record("G2", "S1", 0.5).is_err());
    }

    #[test]
    fn maps_are_mutual_inverses() {
        let mut alignment = Alignment::new();
        alignment.record("G1", "S1", 0.8).unwrap();
        alignment.record("G2", "S2", 0.9).unwrap();
        alignment.verify().unwrap();
        assert_eq!(alignment.system_for("G1").unwrap().aligned_to, "S1");
        assert_eq!(alignment.gold_for("S1").unwrap().aligned_to, "G1");
    }

    #[test]
    fn align_filters_zero_pairs() {
        let mut table = SimilarityTable::new();
        table.set("G1", "S1", 0.8);
        // G2 has no positive similarity to anything.
        let gold = IndexMapping::from_ids(["G1", "G2"]);
        let system = IndexMapping::from_ids(["S1", "S2"]);
        let alignment = align(&table, &gold, &system).unwrap();
        assert_eq!(alignment.len(), 1);
        assert!(alignment.system_for("G2").is_none());
        alignment.verify().unwrap();
    }

    #[test]
    fn similarity_table_ignores_non_positive() {
        let mut table = SimilarityTable::new();
        table.set("G1", "S1", -0.5);
        table.set("G1", "S2", 0.0);
        assert_eq!(table.get("G1", "S1"), 0.0);
        assert_eq!(table.get("G1", "S2"), 0.0);
        assert_eq!(table.get("G1", "S3"), 0.0);
    }

    #[test]
    fn index_mapping_roundtrip() {
        let mapping = IndexMapping::from_ids(["A", "B", "A", "C"]);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.index_of("B"), Some(1));
        assert_eq!(mapping.id(2), Some("C"));
        assert_eq!(mapping.index_of("Z"), None);
    }
}
