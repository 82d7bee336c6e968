//! Graph query operations.
//!
//! All queries transparently exclude Destroyed objects, even before commit.
//! Anchor comparisons throughout are handle identity, never offset equality:
//! two co-located intervals are not tags of each other unless they literally
//! share anchors.

use super::anchor::AnchorId;
use super::annotation::{Annotation, AnnotationId};
use super::model::Graph;

impl Graph {
    /// Live annotations on a layer, in ordinal order within each parent,
    /// parents in creation order.
    pub fn all(&self, layer_id: &str) -> Vec<&Annotation> {
        let mut result: Vec<&Annotation> = self
            .annotations()
            .filter(|ann| ann.layer_id() == layer_id)
            .collect();
        result.sort_by_key(|ann| (ann.parent(), ann.ordinal(), ann.id()));
        result
    }

    /// The first annotation on a layer in `all()` order.
    pub fn first(&self, layer_id: &str) -> Option<&Annotation> {
        self.all(layer_id).into_iter().next()
    }

    /// The labels of a layer's annotations in `all()` order.
    pub fn labels(&self, layer_id: &str) -> Vec<String> {
        self.all(layer_id)
            .into_iter()
            .map(|ann| ann.label().to_string())
            .collect()
    }

    /// Live descendants of `root` on the given layer, in `all()` order.
    pub fn all_under(&self, root: AnnotationId, layer_id: &str) -> Vec<&Annotation> {
        self.all(layer_id)
            .into_iter()
            .filter(|ann| self.is_descendant_of(ann.id(), root))
            .collect()
    }

    /// The first live descendant of `root` on the given layer.
    pub fn first_under(&self, root: AnnotationId, layer_id: &str) -> Option<&Annotation> {
        self.all_under(root, layer_id).into_iter().next()
    }

    /// Annotations on a layer sharing both anchors with `id`: true
    /// zero-width tags, not merely co-located intervals.
    pub fn tags_on(&self, id: AnnotationId, layer_id: &str) -> Vec<&Annotation> {
        let Some(subject) = self.live(id) else {
            return Vec::new();
        };
        let (start, end) = (subject.start(), subject.end());
        self.all(layer_id)
            .into_iter()
            .filter(|other| other.id() != id && other.start() == start && other.end() == end)
            .collect()
    }

    /// Whether two annotations share both anchors by handle.
    pub fn tags(&self, a: AnnotationId, b: AnnotationId) -> bool {
        match (self.live(a), self.live(b)) {
            (Some(first), Some(second)) => first.tags(second),
            _ => false,
        }
    }

    /// Live annotations on a layer starting at the given anchor.
    pub fn starting_at(&self, anchor: AnchorId, layer_id: &str) -> Vec<&Annotation> {
        self.all(layer_id)
            .into_iter()
            .filter(|ann| ann.start() == anchor)
            .collect()
    }

    /// Live annotations on a layer ending at the given anchor.
    pub fn ending_at(&self, anchor: AnchorId, layer_id: &str) -> Vec<&Annotation> {
        self.all(layer_id)
            .into_iter()
            .filter(|ann| ann.end() == anchor)
            .collect()
    }

    /// Other annotations on a layer whose start anchor is the same handle as
    /// this annotation's start anchor.
    pub fn start_of(&self, id: AnnotationId, layer_id: &str) -> Vec<&Annotation> {
        match self.live(id) {
            Some(subject) => {
                let start = subject.start();
                self.starting_at(start, layer_id)
                    .into_iter()
                    .filter(|other| other.id() != id)
                    .collect()
            }
            None => Vec::new(),
        }
    }

    /// Other annotations on a layer whose end anchor is the same handle as
    /// this annotation's end anchor.
    pub fn end_of(&self, id: AnnotationId, layer_id: &str) -> Vec<&Annotation> {
        match self.live(id) {
            Some(subject) => {
                let end = subject.end();
                self.ending_at(end, layer_id)
                    .into_iter()
                    .filter(|other| other.id() != id)
                    .collect()
            }
            None => Vec::new(),
        }
    }

    /// Annotations on a layer whose span lies within this annotation's span,
    /// inclusive on both ends.
    ///
    /// When any of the four offsets is unknown the comparison falls back to
    /// structural containment via the parent chain, logged rather than
    /// failed.
    pub fn included_annotations_on(&self, id: AnnotationId, layer_id: &str) -> Vec<&Annotation> {
        let Some(subject) = self.live(id) else {
            return Vec::new();
        };
        let bounds = (self.start_offset(subject), self.end_offset(subject));
        self.all(layer_id)
            .into_iter()
            .filter(|other| other.id() != id && self.spans_include(id, bounds, other))
            .collect()
    }

    /// Annotations on a layer whose span includes this annotation's span,
    /// the inverse of `included_annotations_on`.
    pub fn including_annotations_on(&self, id: AnnotationId, layer_id: &str) -> Vec<&Annotation> {
        let Some(subject) = self.live(id) else {
            return Vec::new();
        };
        self.all(layer_id)
            .into_iter()
            .filter(|other| {
                other.id() != id && {
                    let bounds = (self.start_offset(other), self.end_offset(other));
                    self.spans_include(other.id(), bounds, subject)
                }
            })
            .collect()
    }

    /// Whether `id`'s parent chain passes through `ancestor`.
    pub fn is_descendant_of(&self, id: AnnotationId, ancestor: AnnotationId) -> bool {
        let mut current = self.annotation(id).and_then(Annotation::parent);
        // parent chains are at most as deep as the annotation count
        let mut remaining = self.annotations().count();
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            if remaining == 0 {
                log::warn!("parent chain of {:?} does not terminate", id);
                return false;
            }
            remaining -= 1;
            current = self.annotation(parent).and_then(Annotation::parent);
        }
        false
    }

    fn live(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotation(id).filter(|ann| !ann.is_destroyed())
    }

    /// Offset inclusion when all four offsets are known; structural descent
    /// otherwise.
    fn spans_include(
        &self,
        container: AnnotationId,
        container_bounds: (Option<f64>, Option<f64>),
        other: &Annotation,
    ) -> bool {
        match (
            container_bounds.0,
            container_bounds.1,
            self.start_offset(other),
            self.end_offset(other),
        ) {
            (Some(start), Some(end), Some(other_start), Some(other_end)) => {
                other_start >= start && other_end <= end
            }
            _ => {
                log::debug!(
                    "offsets unknown comparing {:?} and {:?}; using structural containment",
                    container,
                    other.id()
                );
                self.is_descendant_of(other.id(), container)
            }
        }
    }
}
