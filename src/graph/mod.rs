//! The annotation graph: anchors, annotations, and the owning aggregate.

mod anchor;
mod annotation;
mod error;
mod model;
mod queries;

pub use anchor::{Anchor, AnchorFields, AnchorId};
pub use annotation::{Annotation, AnnotationFields, AnnotationId};
pub use error::StructureError;
pub use model::{Graph, OffsetUnit};
