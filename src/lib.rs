//! tiergraph - versioned multi-tier annotation graphs for transcripts
//!
//! Labeled spans and points anchored in a shared offset space (time or
//! character position), organized into a hierarchy of named layers, with
//! per-field change tracking so incremental edits can be synchronized back
//! to a persistent store. A small scheduler orders layer-producing
//! processing stages so each runs only after the layers it needs exist.

pub mod consistency;
pub mod convert;
pub mod graph;
pub mod schedule;
pub mod schema;
pub mod store;
pub mod track;

pub use consistency::{GraphValidator, OffsetInterpolator};
pub use graph::{Anchor, AnchorId, Annotation, AnnotationId, Graph, OffsetUnit, StructureError};
pub use schema::{Alignment, Layer, Schema};
pub use track::{ChangeOp, ChangeRecord, Confidence};
