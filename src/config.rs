//! Scoring configuration.
//!
//! One [`ScoringConfig`] value is threaded through alignment and every
//! metric. All fields have working defaults; use the `with_*` builders to
//! adjust individual knobs.
//!
//! ```rust
//! use kbeval::config::{ConfidenceWeighting, ScoringConfig, Weighting};
//!
//! let config = ScoringConfig::default()
//!     .with_weighting(Weighting::Weighted)
//!     .with_confidence_weighting(ConfidenceWeighting::Normalized)
//!     .with_cutoff(Some(20));
//! assert_eq!(config.cutoff, Some(20));
//! ```

use crate::span::ThresholdTable;
use serde::{Deserialize, Serialize};

/// How mention-pair matches roll up into a cluster-pair similarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Weighting {
    /// Count of matched mention pairs with positive gated overlap.
    #[default]
    Unweighted,
    /// Sum of the gated overlap scores of matched mention pairs.
    Weighted,
}

/// Weight applied to a correct response in Average Precision walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfidenceWeighting {
    /// Every correct response weighs 1.
    #[default]
    Unit,
    /// A correct response weighs its raw confidence (1 when absent).
    Raw,
    /// Confidence divided by the maximum confidence in the pooled list.
    Normalized,
}

/// Configuration shared by alignment and the metric scorers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Cluster-pair similarity rollup mode.
    pub weighting: Weighting,
    /// Response weighting for AP metrics.
    pub confidence_weighting: ConfidenceWeighting,
    /// Document-count cutoff for AP truncation; `None` disables truncation.
    pub cutoff: Option<usize>,
    /// Language code used for text threshold lookups.
    pub language: Option<String>,
    /// IoU acceptance thresholds.
    pub thresholds: ThresholdTable,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weighting: Weighting::default(),
            confidence_weighting: ConfidenceWeighting::default(),
            cutoff: None,
            language: Some("eng".to_string()),
            thresholds: ThresholdTable::default(),
        }
    }
}

impl ScoringConfig {
    /// Set the cluster-pair similarity rollup mode.
    #[must_use]
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Set the AP confidence weighting mode.
    #[must_use]
    pub fn with_confidence_weighting(mut self, mode: ConfidenceWeighting) -> Self {
        self.confidence_weighting = mode;
        self
    }

    /// Set or clear the AP truncation cutoff (in distinct documents).
    #[must_use]
    pub fn with_cutoff(mut self, cutoff: Option<usize>) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Set the language code used for text threshold lookups.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Replace the threshold table.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: ThresholdTable) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Language as an `Option<&str>` for threshold lookups.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = ScoringConfig::default()
            .with_weighting(Weighting::Weighted)
            .with_confidence_weighting(ConfidenceWeighting::Raw)
            .with_cutoff(Some(5))
            .with_language("spa");
        assert_eq!(config.weighting, Weighting::Weighted);
        assert_eq!(config.confidence_weighting, ConfidenceWeighting::Raw);
        assert_eq!(config.cutoff, Some(5));
        assert_eq!(config.language(), Some("spa"));
    }

    #[test]
    fn serde_roundtrip() {
        let config = ScoringConfig::default().with_cutoff(Some(10));
        let json = serde_json::to_string(&config).unwrap();
        let back: ScoringConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cutoff, Some(10));
        assert_eq!(back.weighting, config.weighting);
    }
}
