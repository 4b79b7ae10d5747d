//! Data model: mentions, coreference clusters, and role-filler frames.
//!
//! These types are built once per document by the response/annotation
//! loaders (external to this crate) and are read-only to the alignment and
//! metric code. Invariants are enforced at construction so downstream code
//! can rely on them without re-checking:
//!
//! - every mention of a [`Cluster`] shares the cluster's [`Metatype`];
//! - a [`Frame`] is the role-filler projection of a Relation or Event
//!   cluster, keyed by `role name -> filler cluster id -> justifications`.
//!
//! Type labels are dot-separated ontology paths (`PER.Politician.Governor`).
//! Comparisons happen on truncated paths: 1 level for entities, 2 levels
//! for events and relations ([`Metatype::type_depth`]).

use crate::error::{Error, Result};
use crate::span::Span;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Category of thing a cluster, frame, or mention represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metatype {
    /// A real-world entity (person, organization, ...).
    Entity,
    /// A relation between two entities.
    Relation,
    /// An event with typed argument roles.
    Event,
}

impl Metatype {
    /// Label used in logs and error messages.
    #[must_use]
    pub fn as_label(&self) -> &'static str {
        match self {
            Metatype::Entity => "Entity",
            Metatype::Relation => "Relation",
            Metatype::Event => "Event",
        }
    }

    /// Number of dot-path levels kept when comparing top-level types.
    #[must_use]
    pub fn type_depth(&self) -> usize {
        match self {
            Metatype::Entity => 1,
            Metatype::Relation | Metatype::Event => 2,
        }
    }
}

impl std::fmt::Display for Metatype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Truncate a dot-separated type path to at most `depth` levels.
///
/// ```rust
/// use kbeval::cluster::truncate_type;
///
/// assert_eq!(truncate_type("PER.Politician.Governor", 1), "PER");
/// assert_eq!(truncate_type("Conflict.Attack.Bombing", 2), "Conflict.Attack");
/// assert_eq!(truncate_type("PER", 2), "PER");
/// ```
#[must_use]
pub fn truncate_type(type_path: &str, depth: usize) -> String {
    type_path
        .split('.')
        .take(depth)
        .collect::<Vec<_>>()
        .join(".")
}

/// Truncate a set of type paths to the metatype's comparison depth.
#[must_use]
pub fn top_level_types(types: &BTreeSet<String>, metatype: Metatype) -> BTreeSet<String> {
    types
        .iter()
        .map(|t| truncate_type(t, metatype.type_depth()))
        .collect()
}

/// A single occurrence of an entity, relation, or event in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    /// Mention id.
    pub id: String,
    /// Metatype; must match the owning cluster's.
    pub metatype: Metatype,
    /// Id of the owning cluster.
    pub cluster_id: String,
    /// Justification spans. At least one; possibly multiple modalities.
    pub spans: Vec<Span>,
    /// Asserted type path, when the response asserts one.
    pub type_label: Option<String>,
    /// Response confidence in `[0, 1]`, when supplied.
    pub confidence: Option<f64>,
}

impl Mention {
    /// Create a mention with a single span.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        metatype: Metatype,
        cluster_id: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            id: id.into(),
            metatype,
            cluster_id: cluster_id.into(),
            spans: vec![span],
            type_label: None,
            confidence: None,
        }
    }

    /// Attach an additional justification span.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    /// Set the asserted type path.
    #[must_use]
    pub fn with_type(mut self, type_label: impl Into<String>) -> Self {
        self.type_label = Some(type_label.into());
        self
    }

    /// Set the response confidence.
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// A same-as coreference group of mentions denoting one real-world thing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    id: String,
    metatype: Metatype,
    mentions: Vec<Mention>,
    types: BTreeSet<String>,
    prototype: Option<usize>,
}

impl Cluster {
    /// Create an empty cluster.
    #[must_use]
    pub fn new(id: impl Into<String>, metatype: Metatype) -> Self {
        Self {
            id: id.into(),
            metatype,
            mentions: Vec::new(),
            types: BTreeSet::new(),
            prototype: None,
        }
    }

    /// Add a mention, enforcing the shared-metatype invariant.
    pub fn push_mention(&mut self, mention: Mention) -> Result<()> {
        if mention.metatype != self.metatype {
            return Err(Error::integrity(format!(
                "mention '{}' has metatype {} but cluster '{}' is {}",
                mention.id, mention.metatype, self.id, self.metatype
            )));
        }
        // The first mention with an asserted type becomes the prototype.
        if self.prototype.is_none() && mention.type_label.is_some() {
            self.prototype = Some(self.mentions.len());
        }
        if let Some(t) = &mention.type_label {
            self.types.insert(t.clone());
        }
        self.mentions.push(mention);
        Ok(())
    }

    /// Builder-style [`push_mention`](Self::push_mention) for test setup.
    pub fn with_mention(mut self, mention: Mention) -> Result<Self> {
        self.push_mention(mention)?;
        Ok(self)
    }

    /// Add an asserted type that is not backed by a specific mention.
    pub fn assert_type(&mut self, type_path: impl Into<String>) {
        self.types.insert(type_path.into());
    }

    /// Designate the prototype mention by index.
    pub fn set_prototype(&mut self, index: usize) -> Result<()> {
        if index >= self.mentions.len() {
            return Err(Error::invalid_input(format!(
                "prototype index {index} out of range for cluster '{}' with {} mentions",
                self.id,
                self.mentions.len()
            )));
        }
        self.prototype = Some(index);
        Ok(())
    }

    /// Cluster id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Metatype shared by all mentions.
    #[must_use]
    pub fn metatype(&self) -> Metatype {
        self.metatype
    }

    /// Member mentions.
    #[must_use]
    pub fn mentions(&self) -> &[Mention] {
        &self.mentions
    }

    /// Asserted type paths.
    #[must_use]
    pub fn types(&self) -> &BTreeSet<String> {
        &self.types
    }

    /// Asserted types truncated to the metatype's comparison depth.
    #[must_use]
    pub fn top_level_types(&self) -> BTreeSet<String> {
        top_level_types(&self.types, self.metatype)
    }

    /// The designated prototype mention, if any.
    #[must_use]
    pub fn prototype(&self) -> Option<&Mention> {
        self.prototype.and_then(|i| self.mentions.get(i))
    }

    /// Number of mentions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    /// Whether the cluster has no mentions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }
}

/// Role-filler projection of a Relation or Event cluster.
///
/// `roles` maps role name -> filler cluster id -> justification mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Id of the subject cluster this frame projects.
    pub cluster_id: String,
    /// Relation or Event.
    pub metatype: Metatype,
    /// Top-level type paths asserted for the frame.
    pub types: BTreeSet<String>,
    /// Role structure.
    pub roles: BTreeMap<String, BTreeMap<String, Vec<Mention>>>,
}

impl Frame {
    /// Create an empty frame for a subject cluster.
    pub fn new(cluster_id: impl Into<String>, metatype: Metatype) -> Result<Self> {
        if metatype == Metatype::Entity {
            return Err(Error::invalid_input(
                "frames project Relation or Event clusters, not Entity",
            ));
        }
        Ok(Self {
            cluster_id: cluster_id.into(),
            metatype,
            types: BTreeSet::new(),
            roles: BTreeMap::new(),
        })
    }

    /// Assert a type path for the frame.
    pub fn assert_type(&mut self, type_path: impl Into<String>) {
        self.types.insert(type_path.into());
    }

    /// Record a role filler with a justification mention.
    pub fn add_filler(
        &mut self,
        role: impl Into<String>,
        filler_cluster_id: impl Into<String>,
        justification: Mention,
    ) {
        self.roles
            .entry(role.into())
            .or_default()
            .entry(filler_cluster_id.into())
            .or_default()
            .push(justification);
    }

    /// All `(role name, filler cluster id)` pairs, in deterministic order.
    #[must_use]
    pub fn role_filler_pairs(&self) -> Vec<(&str, &str)> {
        self.roles
            .iter()
            .flat_map(|(role, fillers)| {
                fillers.keys().map(move |filler| (role.as_str(), filler.as_str()))
            })
            .collect()
    }

    /// Whether the frame asserts a `(role, filler)` pair.
    #[must_use]
    pub fn has_pair(&self, role: &str, filler_cluster_id: &str) -> bool {
        self.roles
            .get(role)
            .is_some_and(|fillers| fillers.contains_key(filler_cluster_id))
    }

    /// Types truncated to the metatype's comparison depth.
    #[must_use]
    pub fn top_level_types(&self) -> BTreeSet<String> {
        top_level_types(&self.types, self.metatype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn mention(id: &str, metatype: Metatype, cluster: &str) -> Mention {
        Mention::new(id, metatype, cluster, Span::text("D1", "D1E1", 0, 4))
    }

    #[test]
    fn truncation_depths() {
        assert_eq!(truncate_type("PER.Politician.Governor", 1), "PER");
        assert_eq!(truncate_type("Conflict.Attack.Bombing", 2), "Conflict.Attack");
        assert_eq!(truncate_type("ORG", 3), "ORG");
        assert_eq!(Metatype::Entity.type_depth(), 1);
        assert_eq!(Metatype::Event.type_depth(), 2);
    }

    #[test]
    fn cluster_rejects_metatype_mismatch() {
        let mut cluster = Cluster::new("G1", Metatype::Entity);
        let bad = mention("M1", Metatype::Event, "G1");
        assert!(matches!(
            cluster.push_mention(bad),
            Err(Error::Integrity(_))
        ));
    }

    #[test]
    fn cluster_collects_types_and_prototype() {
        let mut cluster = Cluster::new("G1", Metatype::Entity);
        cluster
            .push_mention(mention("M1", Metatype::Entity, "G1"))
            .unwrap();
        cluster
            .push_mention(mention("M2", Metatype::Entity, "G1").with_type("PER.Politician"))
            .unwrap();
        assert_eq!(cluster.len(), 2);
        assert!(cluster.types().contains("PER.Politician"));
        assert_eq!(cluster.top_level_types(), ["PER".to_string()].into());
        assert_eq!(cluster.prototype().map(|m| m.id.as_str()), Some("M2"));
    }

    #[test]
    fn frame_rejects_entity_metatype() {
        assert!(Frame::new("G1", Metatype::Entity).is_err());
    }

    #[test]
    fn frame_role_filler_pairs() {
        let mut frame = Frame::new("R1", Metatype::Relation).unwrap();
        frame.assert_type("Physical.LocatedNear");
        frame.add_filler("arg1", "E1", mention("M1", Metatype::Relation, "R1"));
        frame.add_filler("arg2", "E2", mention("M2", Metatype::Relation, "R1"));
        let pairs = frame.role_filler_pairs();
        assert_eq!(pairs, vec![("arg1", "E1"), ("arg2", "E2")]);
        assert!(frame.has_pair("arg1", "E1"));
        assert!(!frame.has_pair("arg1", "E2"));
    }
}
