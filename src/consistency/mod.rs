//! Derived-consistency algorithms.
//!
//! Converters leave graphs in a partially known state: offsets missing,
//! ordinals gappy after deletions, structure built by best effort. The
//! algorithms here make such graphs usable without disturbing anything a
//! human or an aligner already established.

mod interpolate;
mod validate;

pub use interpolate::{InterpolationReport, OffsetInterpolator, Weighting};
pub use validate::{GraphValidator, IssueSeverity, ValidationIssue};

use crate::graph::{AnnotationId, Graph};

/// Renumbers ordinals into a dense 1..N sequence per (parent, layer) group,
/// preserving the current ordinal order. Returns how many annotations were
/// renumbered.
pub fn renumber_ordinals(graph: &mut Graph) -> usize {
    let layer_ids: Vec<String> = graph
        .schema()
        .layers()
        .map(|layer| layer.id.clone())
        .collect();
    let mut renumbered = 0;
    for layer_id in layer_ids {
        // all() is ordinal-ordered within each parent already
        let ordered: Vec<(Option<AnnotationId>, AnnotationId, u32)> = graph
            .all(&layer_id)
            .iter()
            .map(|ann| (ann.parent(), ann.id(), ann.ordinal()))
            .collect();
        let mut position: Option<(Option<AnnotationId>, u32)> = None;
        for (parent, id, ordinal) in ordered {
            let next = match position {
                Some((group, n)) if group == parent => n + 1,
                _ => 1,
            };
            position = Some((parent, next));
            if ordinal != next {
                if let Some(ann) = graph.annotation_mut(id) {
                    ann.state_mut().update(|fields| fields.ordinal = next);
                    renumbered += 1;
                }
            }
        }
    }
    renumbered
}
