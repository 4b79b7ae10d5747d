//! Relation/frame similarity: boolean role-filler comparison.
//!
//! Frame similarity is 0 or 1, never continuous. Two frames are similar iff
//! their top-level type sets intersect and exactly two of their
//! `(role, filler)` pairs can be shown "found" in the other frame. More
//! than two found pairs indicates corrupt role structure and is a
//! data-integrity error, not a higher score.
//!
//! For a cross comparison (gold vs system), the system filler id is first
//! mapped through the already-finalized Entity/Event alignment to its
//! aligned gold cluster id. This is why relation alignment must run after
//! entity/event alignment: relation similarity is *defined* in terms of
//! that alignment.

use crate::align::Alignment;
use crate::cluster::Frame;
use crate::error::{Error, Result};

/// Number of role-filler pairs that must be found for two frames to match.
const REQUIRED_FOUND_PAIRS: usize = 2;

fn score_found(found: usize, left_id: &str, right_id: &str) -> Result<f64> {
    if found > REQUIRED_FOUND_PAIRS {
        log::error!(
            "frames '{left_id}' and '{right_id}' share {found} role-filler pairs; \
             at most {REQUIRED_FOUND_PAIRS} are possible for well-formed frames"
        );
        return Err(Error::integrity(format!(
            "{found} role-filler matches between frames '{left_id}' and '{right_id}' \
             (expected at most {REQUIRED_FOUND_PAIRS})"
        )));
    }
    Ok(if found == REQUIRED_FOUND_PAIRS { 1.0 } else { 0.0 })
}

/// Self similarity: both frames come from the same side (gold/gold or
/// system/system), so `(role, filler)` pairs are compared verbatim.
pub fn frame_self_similarity(a: &Frame, b: &Frame) -> Result<f64> {
    if a.top_level_types().is_disjoint(&b.top_level_types()) {
        return Ok(0.0);
    }
    let found = a
        .role_filler_pairs()
        .iter()
        .filter(|(role, filler)| b.has_pair(role, filler))
        .count();
    score_found(found, &a.cluster_id, &b.cluster_id)
}

/// Cross similarity: system fillers are mapped through the entity/event
/// alignment before the `(role, filler)` pair is looked up in the gold
/// frame. System fillers with no aligned gold cluster are never found.
pub fn frame_similarity(
    gold: &Frame,
    system: &Frame,
    entity_event_alignment: &Alignment,
) -> Result<f64> {
    if gold.top_level_types().is_disjoint(&system.top_level_types()) {
        return Ok(0.0);
    }
    let found = system
        .role_filler_pairs()
        .iter()
        .filter(|(role, system_filler)| {
            entity_event_alignment
                .gold_for(system_filler)
                .is_some_and(|entry| gold.has_pair(role, &entry.aligned_to))
        })
        .count();
    score_found(found, &gold.cluster_id, &system.cluster_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Mention, Metatype};
    use crate::span::Span;

    fn justification(id: &str, cluster: &str) -> Mention {
        Mention::new(id, Metatype::Relation, cluster, Span::text("D1", "D1E1", 0, 4))
    }

    fn frame(cluster_id: &str, type_path: &str, fillers: &[(&str, &str)]) -> Frame {
        let mut frame = Frame::new(cluster_id, Metatype::Relation).unwrap();
        frame.assert_type(type_path);
        for (i, &(role, filler)) in fillers.iter().enumerate() {
            frame.add_filler(role, filler, justification(&format!("{cluster_id}-j{i}"), cluster_id));
        }
        frame
    }

    fn alignment(pairs: &[(&str, &str)]) -> Alignment {
        let mut alignment = Alignment::new();
        for &(gold, system) in pairs {
            alignment.record(gold, system, 1.0).unwrap();
        }
        alignment
    }

    #[test]
    fn self_similarity_requires_two_found_pairs() {
        let a = frame("R1", "Physical.Resident", &[("arg1", "E1"), ("arg2", "E2")]);
        let b = frame("R2", "Physical.Resident", &[("arg1", "E1"), ("arg2", "E2")]);
        assert_eq!(frame_self_similarity(&a, &b).unwrap(), 1.0);

        let c = frame("R3", "Physical.Resident", &[("arg1", "E1"), ("arg2", "E9")]);
        assert_eq!(frame_self_similarity(&a, &c).unwrap(), 0.0);
    }

    #[test]
    fn type_disjoint_frames_score_zero() {
        let a = frame("R1", "Physical.Resident", &[("arg1", "E1"), ("arg2", "E2")]);
        let b = frame("R2", "Part.Subsidiary", &[("arg1", "E1"), ("arg2", "E2")]);
        assert_eq!(frame_self_similarity(&a, &b).unwrap(), 0.0);
    }

    #[test]
    fn cross_similarity_maps_fillers_through_alignment() {
        let gold = frame("GR1", "Physical.Resident", &[("arg1", "GE1"), ("arg2", "GE2")]);
        let system = frame("SR1", "Physical.Resident", &[("arg1", "SE1"), ("arg2", "SE2")]);
        let ee = alignment(&[("GE1", "SE1"), ("GE2", "SE2")]);
        assert_eq!(frame_similarity(&gold, &system, &ee).unwrap(), 1.0);

        // Without the filler alignment, nothing is found.
        let empty = Alignment::new();
        assert_eq!(frame_similarity(&gold, &system, &empty).unwrap(), 0.0);
    }

    #[test]
    fn one_found_pair_is_not_enough() {
        let gold = frame("GR1", "Physical.Resident", &[("arg1", "GE1"), ("arg2", "GE2")]);
        let system = frame("SR1", "Physical.Resident", &[("arg1", "SE1"), ("arg2", "SE9")]);
        let ee = alignment(&[("GE1", "SE1")]);
        assert_eq!(frame_similarity(&gold, &system, &ee).unwrap(), 0.0);
    }

    #[test]
    fn more_than_two_matches_is_integrity_error() {
        let a = frame(
            "R1",
            "Physical.Resident",
            &[("arg1", "E1"), ("arg2", "E2"), ("arg3", "E3")],
        );
        let b = a.clone();
        assert!(matches!(
            frame_self_similarity(&a, &b),
            Err(Error::Integrity(_))
        ));
    }
}
