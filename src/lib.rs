//! Scoring core for knowledge-base population evaluation.
//!
//! Gold and system knowledge elements (entity/relation/event clusters,
//! relation frames, type-role-filler tuples, ranked claim lists) are
//! compared in two stages:
//!
//! 1. **Alignment** ([`align`]): cluster- and frame-level similarity feeds
//!    an exact optimal-assignment solver, producing a one-to-one
//!    [`align::Alignment`] per document. Entities and events align first;
//!    relation frames align second, in terms of that result.
//! 2. **Metrics** ([`metrics`]): independent scorers consume the finalized
//!    alignment — type F1 and type Average Precision, temporal date-range
//!    similarity, coreference/argument AP, TRF tuple scoring, and
//!    claim-ranking NDCG.
//!
//! Mention geometry lives in [`span`] (1-D text/time ranges and 2-D boxes,
//! IoU with hard acceptance thresholds), data structures in [`cluster`],
//! and knobs in [`config`].
//!
//! Missing data never aborts a run: scorers log a warning and contribute a
//! zero. Malformed data does abort, with [`Error::Integrity`].
//!
//! ```rust
//! use kbeval::prelude::*;
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
//! let config = ScoringConfig::default();
//! let alignment = align_clusters(&[gold], &[system], &config)?;
//! assert_eq!(alignment.len(), 1);
//! # Ok::<(), kbeval::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod align;
pub mod cluster;
pub mod config;
pub mod error;
pub mod metrics;
pub mod span;

pub use error::{Error, Result};

/// Common imports for scoring pipelines.
pub mod prelude {
    pub use crate::align::{align_clusters, align_frames, Alignment};
    pub use crate::cluster::{Cluster, Frame, Mention, Metatype};
    pub use crate::config::{ConfidenceWeighting, ScoringConfig, Weighting};
    pub use crate::error::{Error, Result};
    pub use crate::metrics::{MacroAverage, Scores};
    pub use crate::span::{Modality, Span, ThresholdTable};
}
