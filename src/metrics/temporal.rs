//! Temporal correctness: 4-field date-range similarity.
//!
//! Each side of an aligned pair is reduced to four dates: start-after,
//! start-before, end-after, end-before. Open gold ends resolve to the
//! calendar extrema (`0001-01-01` for after-fields, `9999-12-31` for
//! before-fields). Per-field similarity is `c / (c + d)` where `d` is the
//! gold/system day distance scaled to years and `c` is a small constant
//! picked by whether the system range over-constrains gold (strictly
//! tighter on both the after- and before- side of that endpoint
//! simultaneously) or is merely vague.
//!
//! The two constants are currently identical (both 1/12); the branches are
//! kept separate so they can diverge. Overall similarity averages over the
//! gold-defined fields: fields the system leaves unspecified contribute to
//! the count but not the sum, so missing data always lowers the average.

use crate::align::Alignment;
use crate::metrics::MacroAverage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Constant for a system range that over-constrains the gold range.
pub const C_OVER_CONSTRAINING: f64 = 1.0 / 12.0;

/// Constant for a system range that is merely vague.
pub const C_VAGUE: f64 = 1.0 / 12.0;

const DAYS_PER_YEAR: f64 = 365.25;

fn calendar_min() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn calendar_max() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(NaiveDate::MAX)
}

/// A possibly open-ended date range: the event started in
/// `[start_after, start_before]` and ended in `[end_after, end_before]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    /// The start is no earlier than this date.
    pub start_after: Option<NaiveDate>,
    /// The start is no later than this date.
    pub start_before: Option<NaiveDate>,
    /// The end is no earlier than this date.
    pub end_after: Option<NaiveDate>,
    /// The end is no later than this date.
    pub end_before: Option<NaiveDate>,
}

impl DateRange {
    /// Fully open range (asserts nothing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the start-after bound.
    #[must_use]
    pub fn with_start_after(mut self, date: NaiveDate) -> Self {
        self.start_after = Some(date);
        self
    }

    /// Set the start-before bound.
    #[must_use]
    pub fn with_start_before(mut self, date: NaiveDate) -> Self {
        self.start_before = Some(date);
        self
    }

    /// Set the end-after bound.
    #[must_use]
    pub fn with_end_after(mut self, date: NaiveDate) -> Self {
        self.end_after = Some(date);
        self
    }

    /// Set the end-before bound.
    #[must_use]
    pub fn with_end_before(mut self, date: NaiveDate) -> Self {
        self.end_before = Some(date);
        self
    }

    /// Whether no field is asserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start_after.is_none()
            && self.start_before.is_none()
            && self.end_after.is_none()
            && self.end_before.is_none()
    }

    /// The four fields with open ends resolved to calendar extrema.
    ///
    /// After-fields fill with `0001-01-01`, before-fields with `9999-12-31`.
    #[must_use]
    pub fn resolved(&self) -> [NaiveDate; 4] {
        [
            self.start_after.unwrap_or_else(calendar_min),
            self.start_before.unwrap_or_else(calendar_max),
            self.end_after.unwrap_or_else(calendar_min),
            self.end_before.unwrap_or_else(calendar_max),
        ]
    }

    fn fields(&self) -> [Option<NaiveDate>; 4] {
        [
            self.start_after,
            self.start_before,
            self.end_after,
            self.end_before,
        ]
    }
}

/// Per-field similarity `c / (c + d)`, with `d` in years.
fn field_similarity(gold: NaiveDate, system: NaiveDate, c: f64) -> f64 {
    let d = (system - gold).num_days().abs() as f64 / DAYS_PER_YEAR;
    c / (c + d)
}

/// Temporal similarity of a system range against a gold range, in `[0, 1]`.
///
/// Returns 0 when gold asserts nothing (missing-data default).
#[must_use]
pub fn temporal_similarity(gold: &DateRange, system: &DateRange) -> f64 {
    if gold.is_empty() {
        log::debug!("gold date range is empty; temporal similarity defaults to 0");
        return 0.0;
    }

    let gold_resolved = gold.resolved();
    let system_resolved = system.resolved();

    // Over-constraining is judged per endpoint: the system bracket for that
    // endpoint is strictly inside the gold bracket on both sides at once.
    let start_over = system_resolved[0] > gold_resolved[0] && system_resolved[1] < gold_resolved[1];
    let end_over = system_resolved[2] > gold_resolved[2] && system_resolved[3] < gold_resolved[3];
    let constants = [
        if start_over { C_OVER_CONSTRAINING } else { C_VAGUE },
        if start_over { C_OVER_CONSTRAINING } else { C_VAGUE },
        if end_over { C_OVER_CONSTRAINING } else { C_VAGUE },
        if end_over { C_OVER_CONSTRAINING } else { C_VAGUE },
    ];

    // Every gold field counts after extrema resolution; fields the system
    // leaves unspecified add nothing to the sum.
    let system_fields = system.fields();
    let mut sum = 0.0;
    let mut count = 0_usize;
    for i in 0..4 {
        count += 1;
        if let Some(sys) = system_fields[i] {
            sum += field_similarity(gold_resolved[i], sys, constants[i]);
        }
    }
    sum / count as f64
}

/// Per-pair temporal score row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemporalScore {
    /// Document this row was scored in.
    pub document_id: String,
    /// Gold cluster id.
    pub gold_cluster: String,
    /// Aligned system cluster id.
    pub system_cluster: String,
    /// Similarity in `[0, 1]`.
    pub similarity: f64,
}

/// Score temporal similarity for every aligned pair whose gold cluster
/// asserts a date range. A system side with no range scores against the
/// fully open range (all fields missing).
#[must_use]
pub fn score_temporal(
    document_id: &str,
    gold_ranges: &BTreeMap<String, DateRange>,
    system_ranges: &BTreeMap<String, DateRange>,
    alignment: &Alignment,
) -> Vec<TemporalScore> {
    let mut rows = Vec::new();
    for (gold_cluster, gold_range) in gold_ranges {
        let Some(entry) = alignment.system_for(gold_cluster) else {
            continue;
        };
        let empty = DateRange::new();
        let system_range = system_ranges.get(&entry.aligned_to).unwrap_or(&empty);
        if system_ranges.get(&entry.aligned_to).is_none() {
            log::warn!(
                "system cluster '{}' aligned to '{gold_cluster}' asserts no date range \
                 in document '{document_id}'",
                entry.aligned_to
            );
        }
        rows.push(TemporalScore {
            document_id: document_id.to_string(),
            gold_cluster: gold_cluster.clone(),
            system_cluster: entry.aligned_to.clone(),
            similarity: temporal_similarity(gold_range, system_range),
        });
    }
    rows
}

/// Macro-average similarity over temporal rows.
#[must_use]
pub fn macro_temporal(rows: &[TemporalScore]) -> MacroAverage {
    let sims: Vec<f64> = rows.iter().map(|r| r.similarity).collect();
    MacroAverage::of(&sims)
}
