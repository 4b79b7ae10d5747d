//! Span geometry: overlap computation and acceptance thresholds.
//!
//! A [`Span`] locates a mention inside a document element: a character range
//! for text, a bounding box for images and keyframes, a time range for video
//! and audio. [`Span::overlap`] computes intersection-over-union between two
//! spans of the same modality, and [`ThresholdTable::gate`] turns that IoU
//! into a gated similarity: anything below the modality's acceptance
//! threshold is exactly 0, not merely small.
//!
//! # Contract
//!
//! - Spans from different documents or document elements overlap 0.
//! - Comparing spans of different modalities is an error, never a 0.
//! - The gate is a hard cut: `gate` returns the IoU unchanged when it meets
//!   the threshold and exactly `0.0` otherwise.
//!
//! # Example
//!
//! ```rust
//! use kbeval::span::{Span, ThresholdTable};
//!
//! let a = Span::text("D1", "D1E1", 10, 20);
//! let b = Span::text("D1", "D1E1", 12, 20);
//! let iou = a.overlap(&b).unwrap();
//! assert!(iou > 0.7);
//!
//! let table = ThresholdTable::default();
//! let gated = table.gate(iou, a.modality(), Some("eng")).unwrap();
//! assert!(gated == 0.0 || gated == iou);
//! ```

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Modality of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    /// Character offsets in a text document.
    Text,
    /// Bounding box in a still image.
    Image,
    /// Time range in a video stream.
    Video,
    /// Bounding box in a single video keyframe.
    Keyframe,
    /// Time range in an audio stream.
    Audio,
}

impl Modality {
    /// Label used in logs and threshold lookups.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Video => "video",
            Modality::Keyframe => "keyframe",
            Modality::Audio => "audio",
        }
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Geometric extent of a span: 1-D for text and time, 2-D for boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Extent {
    /// 1-D range `[start, end)`: character offsets or seconds.
    Range {
        /// Inclusive start.
        start: f64,
        /// Exclusive end.
        end: f64,
    },
    /// 2-D axis-aligned bounding box.
    Box {
        /// Left edge.
        left: f64,
        /// Top edge.
        top: f64,
        /// Right edge.
        right: f64,
        /// Bottom edge.
        bottom: f64,
    },
}

impl Extent {
    fn measure(&self) -> f64 {
        match *self {
            Extent::Range { start, end } => (end - start).max(0.0),
            Extent::Box {
                left,
                top,
                right,
                bottom,
            } => (right - left).max(0.0) * (bottom - top).max(0.0),
        }
    }

    fn intersection(&self, other: &Extent) -> f64 {
        match (*self, *other) {
            (
                Extent::Range { start: s1, end: e1 },
                Extent::Range { start: s2, end: e2 },
            ) => (e1.min(e2) - s1.max(s2)).max(0.0),
            (
                Extent::Box {
                    left: l1,
                    top: t1,
                    right: r1,
                    bottom: b1,
                },
                Extent::Box {
                    left: l2,
                    top: t2,
                    right: r2,
                    bottom: b2,
                },
            ) => {
                let w = (r1.min(r2) - l1.max(l2)).max(0.0);
                let h = (b1.min(b2) - t1.max(t2)).max(0.0);
                w * h
            }
            // Mixed 1-D/2-D extents never intersect. Reachable only when two
            // spans of the same modality were built with different extent
            // kinds, which the constructors below prevent.
            _ => 0.0,
        }
    }
}

/// A single justification span. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    modality: Modality,
    document_id: String,
    element_id: String,
    extent: Extent,
}

impl Span {
    /// Text span over character offsets `[start, end)`.
    #[must_use]
    pub fn text(document_id: impl Into<String>, element_id: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            modality: Modality::Text,
            document_id: document_id.into(),
            element_id: element_id.into(),
            extent: Extent::Range {
                start: start as f64,
                end: end as f64,
            },
        }
    }

    /// Image bounding box.
    #[must_use]
    pub fn image(
        document_id: impl Into<String>,
        element_id: impl Into<String>,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    ) -> Self {
        Self {
            modality: Modality::Image,
            document_id: document_id.into(),
            element_id: element_id.into(),
            extent: Extent::Box {
                left,
                top,
                right,
                bottom,
            },
        }
    }

    /// Keyframe bounding box.
    #[must_use]
    pub fn keyframe(
        document_id: impl Into<String>,
        element_id: impl Into<String>,
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
    ) -> Self {
        Self {
            modality: Modality::Keyframe,
            document_id: document_id.into(),
            element_id: element_id.into(),
            extent: Extent::Box {
                left,
                top,
                right,
                bottom,
            },
        }
    }

    /// Video time range in seconds.
    #[must_use]
    pub fn video(document_id: impl Into<String>, element_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            modality: Modality::Video,
            document_id: document_id.into(),
            element_id: element_id.into(),
            extent: Extent::Range { start, end },
        }
    }

    /// Audio time range in seconds.
    #[must_use]
    pub fn audio(document_id: impl Into<String>, element_id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            modality: Modality::Audio,
            document_id: document_id.into(),
            element_id: element_id.into(),
            extent: Extent::Range { start, end },
        }
    }

    /// Modality of this span.
    #[must_use]
    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Owning document id.
    #[must_use]
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Document element id (e.g. a specific text segment or media file).
    #[must_use]
    pub fn element_id(&self) -> &str {
        &self.element_id
    }

    /// Intersection-over-union with another span of the same modality.
    ///
    /// Returns 0 when the spans live in different documents or document
    /// elements. Comparing different modalities is an error.
    pub fn overlap(&self, other: &Span) -> Result<f64> {
        if self.modality != other.modality {
            return Err(Error::ModalityMismatch {
                left: self.modality,
                right: other.modality,
            });
        }
        if self.document_id != other.document_id || self.element_id != other.element_id {
            return Ok(0.0);
        }
        let intersection = self.extent.intersection(&other.extent);
        let union = self.extent.measure() + other.extent.measure() - intersection;
        if union <= 0.0 {
            return Ok(0.0);
        }
        Ok(intersection / union)
    }
}

/// Seeded text languages for the default table.
static DEFAULT_TEXT_THRESHOLDS: Lazy<HashMap<String, f64>> = Lazy::new(|| {
    ["eng", "spa", "rus"]
        .iter()
        .map(|lang| ((*lang).to_string(), 0.9))
        .collect()
});

/// Modality- and language-specific IoU acceptance thresholds.
///
/// Non-text modalities look up a single threshold per modality. Text falls
/// back to a per-language threshold. Unknown modality/language lookups are
/// configuration errors, never silent defaults.
///
/// The built-in [`Default`] table is a development convenience; production
/// runs load thresholds from the ontology/region-annotation side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdTable {
    modality: HashMap<Modality, f64>,
    text_by_language: HashMap<String, f64>,
}

impl Default for ThresholdTable {
    fn default() -> Self {
        let modality = [
            (Modality::Image, 0.5),
            (Modality::Video, 0.5),
            (Modality::Keyframe, 0.5),
            (Modality::Audio, 0.5),
        ]
        .into_iter()
        .collect();
        Self {
            modality,
            text_by_language: DEFAULT_TEXT_THRESHOLDS.clone(),
        }
    }
}

impl ThresholdTable {
    /// Empty table; populate with [`set_modality`](Self::set_modality) and
    /// [`set_language`](Self::set_language).
    #[must_use]
    pub fn empty() -> Self {
        Self {
            modality: HashMap::new(),
            text_by_language: HashMap::new(),
        }
    }

    /// Set the threshold for a non-text modality.
    pub fn set_modality(&mut self, modality: Modality, threshold: f64) -> &mut Self {
        self.modality.insert(modality, threshold);
        self
    }

    /// Set the text threshold for a language code.
    pub fn set_language(&mut self, language: impl Into<String>, threshold: f64) -> &mut Self {
        self.text_by_language.insert(language.into(), threshold);
        self
    }

    /// Look up the threshold for a modality (language resolves text).
    pub fn threshold(&self, modality: Modality, language: Option<&str>) -> Result<f64> {
        if modality == Modality::Text {
            let lang = language
                .ok_or_else(|| Error::config("text threshold lookup requires a language"))?;
            return self.text_by_language.get(lang).copied().ok_or_else(|| {
                Error::config(format!("no text threshold for language '{lang}'"))
            });
        }
        self.modality.get(&modality).copied().ok_or_else(|| {
            Error::config(format!("no threshold for modality '{modality}'"))
        })
    }

    /// Whether an IoU meets the acceptance threshold.
    pub fn accept(&self, iou: f64, modality: Modality, language: Option<&str>) -> Result<bool> {
        Ok(iou >= self.threshold(modality, language)?)
    }

    /// Gate an IoU: the value itself when accepted, exactly 0 otherwise.
    pub fn gate(&self, iou: f64, modality: Modality, language: Option<&str>) -> Result<f64> {
        if self.accept(iou, modality, language)? {
            Ok(iou)
        } else {
            Ok(0.0)
        }
    }
}

/// Gated overlap between two spans: IoU if it meets the threshold, else 0.
pub fn gated_overlap(
    a: &Span,
    b: &Span,
    thresholds: &ThresholdTable,
    language: Option<&str>,
) -> Result<f64> {
    let iou = a.overlap(b)?;
    thresholds.gate(iou, a.modality(), language)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_overlap_is_iou() {
        let a = Span::text("D1", "D1E1", 0, 10);
        let b = Span::text("D1", "D1E1", 5, 15);
        // intersection 5, union 15
        let iou = a.overlap(&b).unwrap();
        assert!((iou - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = Span::text("D1", "D1E1", 0, 10);
        let b = Span::text("D1", "D1E1", 3, 8);
        assert_eq!(a.overlap(&b).unwrap(), b.overlap(&a).unwrap());
    }

    #[test]
    fn different_documents_overlap_zero() {
        let a = Span::text("D1", "D1E1", 0, 10);
        let b = Span::text("D2", "D2E1", 0, 10);
        assert_eq!(a.overlap(&b).unwrap(), 0.0);
    }

    #[test]
    fn different_elements_overlap_zero() {
        let a = Span::text("D1", "D1E1", 0, 10);
        let b = Span::text("D1", "D1E2", 0, 10);
        assert_eq!(a.overlap(&b).unwrap(), 0.0);
    }

    #[test]
    fn mismatched_modality_is_error() {
        let a = Span::text("D1", "D1E1", 0, 10);
        let b = Span::audio("D1", "D1E1", 0.0, 10.0);
        assert!(matches!(
            a.overlap(&b),
            Err(Error::ModalityMismatch { .. })
        ));
    }

    #[test]
    fn box_overlap() {
        let a = Span::image("D1", "D1E1", 0.0, 0.0, 10.0, 10.0);
        let b = Span::image("D1", "D1E1", 5.0, 5.0, 15.0, 15.0);
        // intersection 25, union 175
        let iou = a.overlap(&b).unwrap();
        assert!((iou - 25.0 / 175.0).abs() < 1e-9);
    }

    #[test]
    fn identical_spans_overlap_one() {
        let a = Span::image("D1", "D1E1", 1.0, 2.0, 3.0, 4.0);
        assert!((a.overlap(&a).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gate_is_hard_cut() {
        let table = ThresholdTable::default();
        // Below the 0.9 text threshold -> exactly 0.
        assert_eq!(table.gate(0.85, Modality::Text, Some("eng")).unwrap(), 0.0);
        // At or above -> unchanged.
        assert_eq!(table.gate(0.95, Modality::Text, Some("eng")).unwrap(), 0.95);
    }

    #[test]
    fn unknown_language_is_config_error() {
        let table = ThresholdTable::default();
        assert!(matches!(
            table.accept(0.5, Modality::Text, Some("deu")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            table.accept(0.5, Modality::Text, None),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn custom_table_overrides() {
        let mut table = ThresholdTable::empty();
        table.set_modality(Modality::Image, 0.1);
        table.set_language("fra", 0.2);
        assert!(table.accept(0.15, Modality::Image, None).unwrap());
        assert!(table.accept(0.25, Modality::Text, Some("fra")).unwrap());
        assert!(matches!(
            table.accept(0.5, Modality::Video, None),
            Err(Error::Config(_))
        ));
    }
}
