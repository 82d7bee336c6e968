//! Annotations: the labeled edges of the graph.

use serde::{Deserialize, Serialize};

use crate::schema::LayerId;
use crate::track::{ChangeOp, Confidence, Tracked};

use super::anchor::AnchorId;

/// Stable handle of an annotation within its graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnnotationId(pub u32);

/// The change-tracked fields of an annotation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFields {
    pub label: String,
    pub start: AnchorId,
    pub end: AnchorId,
    /// Parent annotation; `None` means the graph root.
    pub parent: Option<AnnotationId>,
    /// 1-based position among same-layer siblings under the same parent.
    pub ordinal: u32,
    pub confidence: Confidence,
}

/// A labeled span or point on one layer, bounded by two anchors.
///
/// The layer id is fixed at creation; everything else is change-tracked.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Annotation {
    id: AnnotationId,
    layer_id: LayerId,
    state: Tracked<AnnotationFields>,
}

impl Annotation {
    pub(crate) fn new(id: AnnotationId, layer_id: LayerId, fields: AnnotationFields) -> Self {
        Self {
            id,
            layer_id,
            state: Tracked::new(fields),
        }
    }

    pub fn id(&self) -> AnnotationId {
        self.id
    }

    pub fn layer_id(&self) -> &str {
        &self.layer_id
    }

    pub fn label(&self) -> &str {
        &self.state.current().label
    }

    pub fn start(&self) -> AnchorId {
        self.state.current().start
    }

    pub fn end(&self) -> AnchorId {
        self.state.current().end
    }

    pub fn parent(&self) -> Option<AnnotationId> {
        self.state.current().parent
    }

    pub fn ordinal(&self) -> u32 {
        self.state.current().ordinal
    }

    pub fn confidence(&self) -> Confidence {
        self.state.current().confidence
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.state.update(|fields| fields.label = label.into());
    }

    /// The label as of the last commit, or the current label for an
    /// annotation created since then.
    pub fn original_label(&self) -> &str {
        match self.state.original() {
            Some(fields) => &fields.label,
            None => self.label(),
        }
    }

    /// Whether this annotation shares both anchors with `other`.
    pub fn tags(&self, other: &Annotation) -> bool {
        self.start() == other.start() && self.end() == other.end()
    }

    pub fn operation(&self) -> ChangeOp {
        self.state.operation()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }

    pub(crate) fn state(&self) -> &Tracked<AnnotationFields> {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut Tracked<AnnotationFields> {
        &mut self.state
    }
}
