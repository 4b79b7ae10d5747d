//! Metric engine: scorers that consume a finalized [`Alignment`].
//!
//! Every metric here is a pure function of (gold data, system data,
//! alignment, configuration) for one document or query. None of them
//! mutate the alignment, and none carry state across units, so batch
//! scoring over many documents is embarrassingly parallel — see
//! [`score_documents`].
//!
//! | Module | Metric |
//! |--------|--------|
//! | [`types`] | Type precision/recall/F1 and type Average Precision |
//! | [`temporal`] | 4-field date-range similarity |
//! | [`coref_ap`] | Coreference/argument Average Precision (V1/V2) |
//! | [`trf`] | Type-role-filler alignment and score |
//! | [`ndcg`] | Claim-ranking NDCG with greedy ideal ranking |
//!
//! [`Alignment`]: crate::align::Alignment

pub mod coref_ap;
pub mod ndcg;
pub mod temporal;
pub mod trf;
pub mod types;

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Precision/recall/F1 triple.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// F1 score (harmonic mean of precision and recall).
    pub f1: f64,
}

impl Scores {
    /// Build from precision and recall; F1 is derived.
    #[must_use]
    pub fn new(precision: f64, recall: f64) -> Self {
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
        }
    }

    /// Scores from raw counts: `correct / predicted` and `correct / expected`.
    ///
    /// Empty denominators resolve to 0 (missing-data default).
    #[must_use]
    pub fn from_counts(correct: usize, predicted: usize, expected: usize) -> Self {
        let precision = if predicted > 0 {
            correct as f64 / predicted as f64
        } else {
            0.0
        };
        let recall = if expected > 0 {
            correct as f64 / expected as f64
        } else {
            0.0
        };
        Self::new(precision, recall)
    }
}

impl std::fmt::Display for Scores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "P={:.1}% R={:.1}% F1={:.1}%",
            self.precision * 100.0,
            self.recall * 100.0,
            self.f1 * 100.0
        )
    }
}

/// Mean of a slice; 0 for the empty slice (missing-data default).
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Macro-average record over per-unit scores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MacroAverage {
    /// Mean score across units.
    pub score: f64,
    /// Number of contributing units.
    pub units: usize,
}

impl MacroAverage {
    /// Macro-average a slice of per-unit scores.
    #[must_use]
    pub fn of(scores: &[f64]) -> Self {
        Self {
            score: mean(scores),
            units: scores.len(),
        }
    }
}

impl std::fmt::Display for MacroAverage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "macro={:.4} over {} unit{}",
            self.score,
            self.units,
            if self.units == 1 { "" } else { "s" }
        )
    }
}

/// Score many documents/queries with a pure per-unit function.
///
/// Sequential by default; parallel under the `parallel` feature. The first
/// error aborts the batch, matching the per-unit propagation policy.
#[cfg(not(feature = "parallel"))]
pub fn score_documents<D, S, F>(documents: &[D], score: F) -> Result<Vec<S>>
where
    F: Fn(&D) -> Result<S>,
{
    documents.iter().map(score).collect()
}

/// Score many documents/queries with a pure per-unit function.
///
/// Parallel over documents via rayon; per-unit scoring stays synchronous
/// and share-nothing, so this is safe by construction.
#[cfg(feature = "parallel")]
pub fn score_documents<D, S, F>(documents: &[D], score: F) -> Result<Vec<S>>
where
    D: Sync,
    S: Send,
    F: Fn(&D) -> Result<S> + Sync + Send,
{
    use rayon::prelude::*;
    documents.par_iter().map(score).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_harmonic_mean() {
        let scores = Scores::new(0.5, 1.0);
        assert!((scores.f1 - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn scores_zero_denominators_default_to_zero() {
        let scores = Scores::from_counts(0, 0, 0);
        assert_eq!(scores.precision, 0.0);
        assert_eq!(scores.recall, 0.0);
        assert_eq!(scores.f1, 0.0);
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[0.5, 1.0]), 0.75);
    }

    #[test]
    fn macro_average_counts_units() {
        let avg = MacroAverage::of(&[1.0, 0.0, 0.5]);
        assert!((avg.score - 0.5).abs() < 1e-9);
        assert_eq!(avg.units, 3);
    }

    #[test]
    fn score_documents_propagates_errors() {
        use crate::error::Error;
        let docs = vec![1, 2, 3];
        let result = score_documents(&docs, |&d| {
            if d == 2 {
                Err(Error::invalid_input("boom"))
            } else {
                Ok(d * 10)
            }
        });
        assert!(result.is_err());

        let ok = score_documents(&docs, |&d| Ok(d * 10)).unwrap();
        assert_eq!(ok, vec![10, 20, 30]);
    }
}
