//! Schema: the static registry of layers.
//!
//! A schema is pure data describing the tier hierarchy of a transcript
//! graph. Four roles (participant, turn, utterance, word) are singled out
//! for convenience because most algorithms need them, but the layers behind
//! them are structurally ordinary.

mod layer;

pub use layer::{Alignment, Layer, LayerId, ValueKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The layer registry of a graph.
///
/// Layers form a tree rooted at the graph itself (`parent_id == None`).
/// A schema attached to a graph is immutable except for accumulating
/// additional layers over the graph's lifetime.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    layers: BTreeMap<LayerId, Layer>,
    /// Layer ids in registration order, so child listings are deterministic.
    order: Vec<LayerId>,
    pub participant_layer_id: Option<LayerId>,
    pub turn_layer_id: Option<LayerId>,
    pub utterance_layer_id: Option<LayerId>,
    pub word_layer_id: Option<LayerId>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a layer. The parent, if any, must already be registered.
    ///
    /// Returns false (and leaves the schema unchanged) when the id is taken
    /// or the parent is unknown.
    pub fn add_layer(&mut self, layer: Layer) -> bool {
        if self.layers.contains_key(&layer.id) {
            return false;
        }
        if let Some(parent_id) = &layer.parent_id {
            if !self.layers.contains_key(parent_id) {
                return false;
            }
        }
        self.order.push(layer.id.clone());
        self.layers.insert(layer.id.clone(), layer);
        true
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn has_layer(&self, id: &str) -> bool {
        self.layers.contains_key(id)
    }

    /// All layers in registration order.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }

    /// The parent layer of the given layer, or `None` for top-level layers.
    pub fn parent_of(&self, id: &str) -> Option<&Layer> {
        self.layers
            .get(id)
            .and_then(|layer| layer.parent_id.as_ref())
            .and_then(|parent_id| self.layers.get(parent_id))
    }

    /// Child layers of `parent_id` in registration order; `None` lists the
    /// top-level layers under the graph root.
    pub fn children_of(&self, parent_id: Option<&str>) -> Vec<&Layer> {
        self.order
            .iter()
            .filter_map(|id| self.layers.get(id))
            .filter(|layer| layer.parent_id.as_deref() == parent_id)
            .collect()
    }

    pub fn word_layer(&self) -> Option<&Layer> {
        self.word_layer_id.as_deref().and_then(|id| self.layer(id))
    }

    pub fn turn_layer(&self) -> Option<&Layer> {
        self.turn_layer_id.as_deref().and_then(|id| self.layer(id))
    }

    pub fn utterance_layer(&self) -> Option<&Layer> {
        self.utterance_layer_id
            .as_deref()
            .and_then(|id| self.layer(id))
    }

    pub fn participant_layer(&self) -> Option<&Layer> {
        self.participant_layer_id
            .as_deref()
            .and_then(|id| self.layer(id))
    }

    /// A conventional transcript hierarchy:
    /// participant and turn at the top, saturated utterances partitioning
    /// each turn, words within turns, with the four roles assigned.
    ///
    /// Most callers start here and accumulate extra layers as needed.
    pub fn transcript() -> Self {
        let mut schema = Schema::new();
        schema.add_layer(Layer::tag("participant", "Participants").peers(true));
        schema.add_layer(Layer::interval("turn", "Turns").with_parent("participant"));
        schema.add_layer(
            Layer::interval("utterance", "Utterances")
                .with_parent("turn")
                .saturated(true),
        );
        schema.add_layer(Layer::interval("word", "Words").with_parent("turn"));
        schema.participant_layer_id = Some("participant".to_string());
        schema.turn_layer_id = Some("turn".to_string());
        schema.utterance_layer_id = Some("utterance".to_string());
        schema.word_layer_id = Some("word".to_string());
        schema
    }
}
