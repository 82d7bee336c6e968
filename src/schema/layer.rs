//! Layer definitions.
//!
//! A layer is one named tier of the annotation hierarchy: turns contain
//! utterances, utterances contain words, words carry part-of-speech tags.
//! The layer describes how its annotations relate to the parent tier; it
//! holds no annotations itself.

use serde::{Deserialize, Serialize};

/// Identifier of a layer within a schema, e.g. `"word"`.
pub type LayerId = String;

/// How annotations on a layer are anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    /// Zero-width tag sharing the parent's anchors, e.g. a lemma on a word.
    None,
    /// A point in the offset space, e.g. a click or pitch target.
    Instant,
    /// A span with its own start and end anchors, e.g. a word or turn.
    Interval,
}

/// What kind of value the layer's labels hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Arbitrary text.
    #[default]
    FreeText,
    /// One of a closed set of labels, e.g. part-of-speech codes.
    Enumerated,
    /// Phonemic transcription in IPA.
    Ipa,
    /// A number rendered as text, e.g. a pitch value.
    Numeric,
}

/// One tier of the schema hierarchy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Unique id within the schema.
    pub id: LayerId,
    /// Human-readable name for display.
    pub label: String,
    pub alignment: Alignment,
    /// Whether a parent may have multiple children on this layer.
    pub peers: bool,
    /// Whether sibling annotations may overlap in offset.
    pub peers_overlap: bool,
    /// Whether children must collectively cover the parent's span with no gaps.
    pub saturated: bool,
    /// Parent layer id; `None` means children of the graph root.
    pub parent_id: Option<LayerId>,
    /// Whether the parent's span must contain the children's spans.
    pub parent_includes: bool,
    pub value_kind: ValueKind,
}

impl Layer {
    /// A spanning layer with its own anchors, one of possibly many peers.
    pub fn interval(id: impl Into<LayerId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            alignment: Alignment::Interval,
            peers: true,
            peers_overlap: false,
            saturated: false,
            parent_id: None,
            parent_includes: true,
            value_kind: ValueKind::FreeText,
        }
    }

    /// A point layer.
    pub fn instant(id: impl Into<LayerId>, label: impl Into<String>) -> Self {
        Self {
            alignment: Alignment::Instant,
            ..Self::interval(id, label)
        }
    }

    /// A zero-width tag layer sharing its parent's anchors.
    pub fn tag(id: impl Into<LayerId>, label: impl Into<String>) -> Self {
        Self {
            alignment: Alignment::None,
            peers: false,
            ..Self::interval(id, label)
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<LayerId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn saturated(mut self, saturated: bool) -> Self {
        self.saturated = saturated;
        self
    }

    pub fn peers(mut self, peers: bool) -> Self {
        self.peers = peers;
        self
    }

    pub fn peers_overlap(mut self, peers_overlap: bool) -> Self {
        self.peers_overlap = peers_overlap;
        self
    }

    pub fn parent_includes(mut self, parent_includes: bool) -> Self {
        self.parent_includes = parent_includes;
        self
    }

    pub fn value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    /// Whether annotations on this layer are zero-width tags.
    pub fn is_tag(&self) -> bool {
        self.alignment == Alignment::None
    }
}
