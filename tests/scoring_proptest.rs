//! Property tests for span geometry, assignment, and metric bounds.

use kbeval::align::munkres::assign_max;
use kbeval::config::ScoringConfig;
use kbeval::metrics::coref_ap::{average_precision, ApVariant, PooledResponse};
use kbeval::metrics::temporal::{temporal_similarity, DateRange};
use kbeval::metrics::Scores;
use kbeval::span::{Span, ThresholdTable};
use chrono::NaiveDate;
use proptest::prelude::*;

fn brute_force(matrix: &[Vec<f64>]) -> f64 {
    fn recurse(matrix: &[Vec<f64>], row: usize, used: &mut Vec<bool>) -> f64 {
        if row == matrix.len() {
            return 0.0;
        }
        let mut best = recurse(matrix, row + 1, used);
        for col in 0..matrix[row].len() {
            if !used[col] {
                used[col] = true;
                let total = matrix[row][col] + recurse(matrix, row + 1, used);
                used[col] = false;
                best = best.max(total);
            }
        }
        best
    }
    let cols = matrix.first().map_or(0, Vec::len);
    recurse(matrix, 0, &mut vec![false; cols])
}

proptest! {
    #[test]
    fn text_overlap_is_symmetric(
        a_start in 0usize..100,
        a_len in 1usize..50,
        b_start in 0usize..100,
        b_len in 1usize..50,
    ) {
        let a = Span::text("D1", "D1E1", a_start, a_start + a_len);
        let b = Span::text("D1", "D1E1", b_start, b_start + b_len);
        let ab = a.overlap(&b).unwrap();
        let ba = b.overlap(&a).unwrap();
        prop_assert!((ab - ba).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn gated_overlap_is_zero_or_above_threshold(
        a_start in 0usize..100,
        a_len in 1usize..50,
        b_start in 0usize..100,
        b_len in 1usize..50,
        threshold in 0.1f64..1.0,
    ) {
        let mut thresholds = ThresholdTable::empty();
        thresholds.set_language("eng", threshold);
        let a = Span::text("D1", "D1E1", a_start, a_start + a_len);
        let b = Span::text("D1", "D1E1", b_start, b_start + b_len);
        let gated = kbeval::span::gated_overlap(&a, &b, &thresholds, Some("eng")).unwrap();
        // The gate is hard: no partial credit below the threshold.
        prop_assert!(gated == 0.0 || gated >= threshold);
    }

    #[test]
    fn assignment_total_matches_brute_force(
        matrix in prop::collection::vec(
            prop::collection::vec(0.0f64..1.0, 1..5),
            1..5,
        ),
    ) {
        let cols = matrix.iter().map(Vec::len).min().unwrap_or(0);
        let square: Vec<Vec<f64>> =
            matrix.iter().map(|row| row[..cols].to_vec()).collect();
        let pairs = assign_max(&square);
        let total: f64 = pairs.iter().map(|&(g, s)| square[g][s]).sum();
        let best = brute_force(&square);
        prop_assert!((total - best).abs() < 1e-9);
    }

    #[test]
    fn unit_weighted_ap_is_bounded(
        assessments in prop::collection::vec(any::<bool>(), 1..20),
        ground_truth in 1usize..20,
    ) {
        let pool: Vec<PooledResponse> = assessments
            .iter()
            .enumerate()
            .map(|(i, &correct)| PooledResponse {
                response_id: format!("r{i}"),
                document_id: format!("d{i}"),
                rank: Some(i as u32),
                confidence: None,
                correct,
            })
            .collect();
        let correct = assessments.iter().filter(|&&c| c).count();
        let config = ScoringConfig::default();
        let ap = average_precision(&pool, ground_truth, &config, ApVariant::PerResponse);
        prop_assert!(ap >= 0.0);
        // AP cannot exceed the recall ceiling.
        prop_assert!(ap <= correct as f64 / ground_truth as f64 + 1e-9);
    }

    #[test]
    fn scores_are_bounded(
        correct in 0usize..100,
        extra_predicted in 0usize..100,
        extra_expected in 0usize..100,
    ) {
        let scores = Scores::from_counts(
            correct,
            correct + extra_predicted,
            correct + extra_expected,
        );
        prop_assert!((0.0..=1.0).contains(&scores.precision));
        prop_assert!((0.0..=1.0).contains(&scores.recall));
        prop_assert!((0.0..=1.0).contains(&scores.f1));
        prop_assert!(scores.f1 <= scores.precision.max(scores.recall) + 1e-12);
    }

    #[test]
    fn temporal_similarity_is_bounded(
        gold_days in 0i64..80000,
        system_days in 0i64..80000,
    ) {
        let epoch = NaiveDate::from_ymd_opt(1800, 1, 1).unwrap();
        let gold = DateRange::new()
            .with_start_after(epoch + chrono::Days::new(gold_days as u64));
        let system = DateRange::new()
            .with_start_after(epoch + chrono::Days::new(system_days as u64));
        let sim = temporal_similarity(&gold, &system);
        prop_assert!((0.0..=1.0).contains(&sim));
        if gold_days == system_days {
            // Identical single-field ranges agree on that field; the three
            // unset system fields still dilute the average.
            prop_assert!((sim - 0.25).abs() < 1e-9);
        }
    }
}
