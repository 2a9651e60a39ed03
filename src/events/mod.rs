//! Incremental units and the update messages that carry them through the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::value_objects::{ConceptMap, UpdateType};

/// A generic incremental unit received from upstream modules.
///
/// Units are compared by identity (`id`), never by content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncrementalUnit {
    /// Unique identifier
    pub id: Uuid,
    /// Name of the module that produced the unit
    pub creator: String,
    /// When the unit was created
    pub created_at: DateTime<Utc>,
    /// Unit this one follows in its producer's output
    pub previous_iu: Option<Uuid>,
    /// Unit this one was derived from
    pub grounded_in: Option<Uuid>,
    /// Payload; only key/value objects are understood by the dialogue manager
    pub payload: serde_json::Value,
}

impl IncrementalUnit {
    /// Create a new unit with the given payload
    pub fn new(creator: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator: creator.into(),
            created_at: Utc::now(),
            previous_iu: None,
            grounded_in: None,
            payload,
        }
    }

    /// Link this unit to the unit it was derived from
    pub fn grounded_in(mut self, source: Uuid) -> Self {
        self.grounded_in = Some(source);
        self
    }

    /// Link this unit to its predecessor
    pub fn following(mut self, previous: Uuid) -> Self {
        self.previous_iu = Some(previous);
        self
    }

    /// The payload as a key/value map, if it has that shape
    pub fn state_payload(&self) -> Option<&serde_json::Map<String, serde_json::Value>> {
        self.payload.as_object()
    }
}

/// A dialogue decision together with its concepts.
///
/// Created empty, filled in once through [`DecisionUnit::set_decision`] and
/// then frozen behind an `Arc` when it is emitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionUnit {
    pub id: Uuid,
    pub creator: String,
    pub created_at: DateTime<Utc>,
    pub previous_iu: Option<Uuid>,
    pub grounded_in: Option<Uuid>,
    /// The chosen action, absent until set
    pub decision: Option<String>,
    /// Concepts and their values
    pub concepts: ConceptMap,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Combined `{decision, concepts}` view for downstream consumers
    pub payload: Option<serde_json::Value>,
}

impl DecisionUnit {
    /// Unit kind reported to the pipeline
    pub const TYPE: &'static str = "Dialogue Decision Incremental Unit";

    /// Create an empty decision unit
    pub fn new(creator: impl Into<String>, grounded_in: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            creator: creator.into(),
            created_at: Utc::now(),
            previous_iu: None,
            grounded_in,
            decision: None,
            concepts: ConceptMap::new(),
            confidence: 0.0,
            payload: None,
        }
    }

    /// Set decision, concepts and confidence in one step.
    ///
    /// Prior values are overwritten; missing concepts mean an empty map.
    pub fn set_decision(
        &mut self,
        decision: Option<String>,
        concepts: Option<ConceptMap>,
        confidence: f64,
    ) {
        self.concepts = concepts.unwrap_or_default();
        self.payload = Some(serde_json::json!({
            "decision": decision,
            "concepts": self.concepts,
        }));
        self.decision = decision;
        self.confidence = confidence;
    }

    /// Set a decision with no concepts and full confidence
    pub fn set_act(&mut self, decision: impl Into<String>) {
        self.set_decision(Some(decision.into()), None, 1.0);
    }
}

/// An ordered batch of (unit, change kind) pairs delivered in one pipeline tick
#[derive(Debug, Clone)]
pub struct UpdateMessage<T = IncrementalUnit> {
    entries: Vec<(Arc<T>, UpdateType)>,
}

impl<T> UpdateMessage<T> {
    /// Create an empty message
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Create a message carrying a single unit
    pub fn from_iu(iu: Arc<T>, update_type: UpdateType) -> Self {
        Self {
            entries: vec![(iu, update_type)],
        }
    }

    /// Append a unit as an addition
    pub fn add(mut self, iu: Arc<T>) -> Self {
        self.entries.push((iu, UpdateType::Add));
        self
    }

    /// Append a unit as a revocation
    pub fn revoke(mut self, iu: Arc<T>) -> Self {
        self.entries.push((iu, UpdateType::Revoke));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the pairs in delivery order
    pub fn iter(&self) -> impl Iterator<Item = (&Arc<T>, UpdateType)> {
        self.entries.iter().map(|(iu, update_type)| (iu, *update_type))
    }

    /// Units tagged as additions
    pub fn added(&self) -> impl Iterator<Item = &Arc<T>> {
        self.iter()
            .filter(|(_, update_type)| *update_type == UpdateType::Add)
            .map(|(iu, _)| iu)
    }
}

impl<T> Default for UpdateMessage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> IntoIterator for UpdateMessage<T> {
    type Item = (Arc<T>, UpdateType);
    type IntoIter = std::vec::IntoIter<(Arc<T>, UpdateType)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
