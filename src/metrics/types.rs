//! Type correctness metrics: precision/recall/F1 and Average Precision.
//!
//! Both metrics compare (possibly scope-augmented) type sets of aligned
//! gold/system cluster pairs. Augmentation restricts and expands asserted
//! types through the region-level annotation scope for the document: a type
//! related to a scope entry (one is a dot-prefix of the other) expands to
//! that entry; types unrelated to every scope entry are dropped before
//! scoring.

use crate::align::Alignment;
use crate::cluster::Cluster;
use crate::metrics::{MacroAverage, Scores};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Whether `prefix` is a dot-path prefix of `path` (or equal to it).
fn is_dot_prefix(prefix: &str, path: &str) -> bool {
    path == prefix
        || (path.len() > prefix.len()
            && path.starts_with(prefix)
            && path.as_bytes()[prefix.len()] == b'.')
}

/// Region-level annotation scope: the types annotated for a document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeScope {
    types: BTreeSet<String>,
}

impl TypeScope {
    /// Build a scope from its member type paths.
    pub fn from_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Scope entries implied by an asserted type path.
    #[must_use]
    pub fn implied(&self, type_path: &str) -> BTreeSet<String> {
        self.types
            .iter()
            .filter(|scope| is_dot_prefix(scope, type_path) || is_dot_prefix(type_path, scope))
            .cloned()
            .collect()
    }

    /// Augment a type set: expand every asserted type to the scope entries
    /// it implies, dropping types outside the annotated scope.
    #[must_use]
    pub fn augment(&self, types: &BTreeSet<String>) -> BTreeSet<String> {
        types.iter().flat_map(|t| self.implied(t)).collect()
    }
}

/// Per-pair (or per-unaligned-cluster) type score row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeScore {
    /// Document this row was scored in.
    pub document_id: String,
    /// Gold cluster id; `None` for an unaligned system cluster row.
    pub gold_cluster: Option<String>,
    /// System cluster id; `None` for an unaligned gold cluster row.
    pub system_cluster: Option<String>,
    /// Precision/recall/F1 over the augmented type sets.
    pub scores: Scores,
}

/// Type P/R/F1 over two augmented type sets.
#[must_use]
pub fn type_f1(gold_types: &BTreeSet<String>, system_types: &BTreeSet<String>) -> Scores {
    let correct = gold_types.intersection(system_types).count();
    Scores::from_counts(correct, system_types.len(), gold_types.len())
}

/// Score type correctness for one document.
///
/// Emits one row per aligned pair plus a zero-score row for every unaligned
/// system cluster (a false positive).
#[must_use]
pub fn score_types(
    document_id: &str,
    gold: &[Cluster],
    system: &[Cluster],
    alignment: &Alignment,
    scope: &TypeScope,
) -> Vec<TypeScore> {
    let mut rows = Vec::new();

    for g in gold {
        let Some(entry) = alignment.system_for(g.id()) else {
            continue;
        };
        let Some(s) = system.iter().find(|s| s.id() == entry.aligned_to) else {
            log::warn!(
                "alignment references system cluster '{}' absent from document '{document_id}'",
                entry.aligned_to
            );
            continue;
        };
        let gold_types = scope.augment(g.types());
        let system_types = scope.augment(s.types());
        rows.push(TypeScore {
            document_id: document_id.to_string(),
            gold_cluster: Some(g.id().to_string()),
            system_cluster: Some(s.id().to_string()),
            scores: type_f1(&gold_types, &system_types),
        });
    }

    // Unaligned system clusters are false positives: zero-score rows.
    for s in system {
        if alignment.gold_for(s.id()).is_none() {
            rows.push(TypeScore {
                document_id: document_id.to_string(),
                gold_cluster: None,
                system_cluster: Some(s.id().to_string()),
                scores: Scores::default(),
            });
        }
    }

    rows
}

/// Macro-average F1 over type score rows.
#[must_use]
pub fn macro_type_f1(rows: &[TypeScore]) -> MacroAverage {
    let f1s: Vec<f64> = rows.iter().map(|r| r.scores.f1).collect();
    MacroAverage::of(&f1s)
}

/// Average Precision over a system cluster's ranked candidate types.
///
/// Candidates are the cluster's asserted types ranked by the number of
/// distinct mentions backing each type (descending), ties broken
/// alphabetically. Walking the ranked list, precision is accumulated at
/// every rank whose type is in the gold-augmented set:
/// `AP = (Σ precision-at-hit) / |gold types|`, 0 when the gold set is empty.
#[must_use]
pub fn type_average_precision(system: &Cluster, gold_types: &BTreeSet<String>) -> f64 {
    if gold_types.is_empty() {
        log::warn!(
            "empty gold type set for system cluster '{}'; type AP defaults to 0",
            system.id()
        );
        return 0.0;
    }

    let mut ranked: Vec<(String, usize)> = system
        .types()
        .iter()
        .map(|candidate| {
            let backing = system
                .mentions()
                .iter()
                .filter(|m| {
                    m.type_label
                        .as_deref()
                        .is_some_and(|t| is_dot_prefix(candidate, t))
                })
                .count();
            (candidate.clone(), backing)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut hits = 0_usize;
    let mut precision_sum = 0.0;
    for (rank, (candidate, _)) in ranked.iter().enumerate() {
        if gold_types.contains(candidate) {
            hits += 1;
            precision_sum += hits as f64 / (rank + 1) as f64;
        }
    }
    precision_sum / gold_types.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Mention, Metatype};
    use crate::span::Span;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn cluster_with_types(id: &str, typed_mentions: &[&str]) -> Cluster {
        let mut cluster = Cluster::new(id, Metatype::Entity);
        for (i, t) in typed_mentions.iter().enumerate() {
            cluster
                .push_mention(
                    Mention::new(
                        format!("{id}-m{i}"),
                        Metatype::Entity,
                        id,
                        Span::text("D1", "D1E1", i * 10, i * 10 + 4),
                    )
                    .with_type(*t),
                )
                .unwrap();
        }
        cluster
    }

    #[test]
    fn dot_prefix_semantics() {
        assert!(is_dot_prefix("PER", "PER.Politician"));
        assert!(is_dot_prefix("PER", "PER"));
        assert!(!is_dot_prefix("PER", "PERX"));
        assert!(!is_dot_prefix("PER.Politician", "PER"));
    }

    #[test]
    fn scope_augmentation_expands_and_drops() {
        let scope = TypeScope::from_types(["PER", "ORG.Government"]);
        // PER.Politician implies PER; GPE is out of scope and dropped.
        let augmented = scope.augment(&set(&["PER.Politician", "GPE"]));
        assert_eq!(augmented, set(&["PER"]));
        // An asserted prefix of a scope entry implies that entry.
        let augmented = scope.augment(&set(&["ORG"]));
        assert_eq!(augmented, set(&["ORG.Government"]));
    }

    #[test]
    fn type_f1_identical_sets() {
        let scores = type_f1(&set(&["PER"]), &set(&["PER"]));
        assert_eq!(scores.f1, 1.0);
    }

    #[test]
    fn type_f1_partial_overlap() {
        let scores = type_f1(&set(&["PER", "ORG"]), &set(&["PER", "GPE"]));
        assert!((scores.precision - 0.5).abs() < 1e-9);
        assert!((scores.recall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn unaligned_system_cluster_is_zero_row() {
        let gold = vec![cluster_with_types("G1", &["PER"])];
        let system = vec![
            cluster_with_types("S1", &["PER"]),
            cluster_with_types("S2", &["ORG"]),
        ];
        let mut alignment = Alignment::new();
        alignment.record("G1", "S1", 1.0).unwrap();
        let scope = TypeScope::from_types(["PER", "ORG"]);

        let rows = score_types("D1", &gold, &system, &alignment, &scope);
        assert_eq!(rows.len(), 2);
        let aligned = rows.iter().find(|r| r.gold_cluster.is_some()).unwrap();
        assert_eq!(aligned.scores.f1, 1.0);
        let spurious = rows.iter().find(|r| r.gold_cluster.is_none()).unwrap();
        assert_eq!(spurious.scores.f1, 0.0);
        assert_eq!(spurious.system_cluster.as_deref(), Some("S2"));
    }

    #[test]
    fn type_ap_ranks_by_backing_mentions() {
        // ORG backed by two mentions, PER by one: ORG ranks first.
        let system = cluster_with_types("S1", &["ORG", "ORG.Government", "PER"]);
        // Gold contains only PER: hit at rank 2 (ORG first by weight).
        let ap = type_average_precision(&system, &set(&["PER"]));
        // Ranking: ORG (2 backing), ORG.Government (1), PER (1) — ties PER vs
        // ORG.Government broken alphabetically, ORG.Government first.
        // PER hits at rank 3: AP = (1/3) / 1.
        assert!((ap - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn type_ap_empty_gold_defaults_zero() {
        let system = cluster_with_types("S1", &["PER"]);
        assert_eq!(type_average_precision(&system, &BTreeSet::new()), 0.0);
    }

    #[test]
    fn type_ap_perfect_ranking() {
        let system = cluster_with_types("S1", &["PER", "PER"]);
        let ap = type_average_precision(&system, &set(&["PER"]));
        assert!((ap - 1.0).abs() < 1e-9);
    }
}
