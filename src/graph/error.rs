use thiserror::Error;

use super::{AnchorId, AnnotationId};

/// A mutation that would violate a schema relationship.
///
/// These are the hard failures of the mutation API; everything recoverable
/// is reported as validation data instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("layer `{0}` is not declared in the schema")]
    UnknownLayer(String),

    #[error("anchor {0:?} does not exist in this graph")]
    UnknownAnchor(AnchorId),

    #[error("annotation {0:?} does not exist in this graph")]
    UnknownAnnotation(AnnotationId),

    #[error("layer `{layer}` declares parent layer {expected:?}, but the given parent is on {actual:?}")]
    ParentLayerMismatch {
        layer: String,
        expected: Option<String>,
        actual: Option<String>,
    },

    #[error("tag layer `{0}` annotations must share their parent's anchors")]
    TagAnchorMismatch(String),

    #[error("layer `{0}` is not a tag layer")]
    NotATagLayer(String),
}
