//! The annotation graph aggregate.
//!
//! A `Graph` owns every anchor and annotation it contains, in arena maps
//! keyed by stable handles. Sharing an anchor between annotations is simply
//! two annotations holding the same `AnchorId`; nothing in the graph is
//! reached by owning reference. The graph also acts as an annotation-like
//! root: it has a label and an implicit top-level span (the bound anchors),
//! so schema-level tags attach to it the same way word tags attach to words.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{Layer, Schema};
use crate::track::{ChangeOp, ChangeRecord, ChangeTarget, Confidence};

use super::anchor::{Anchor, AnchorId};
use super::annotation::{Annotation, AnnotationFields, AnnotationId};
use super::error::StructureError;

/// The unit of the graph's one-dimensional offset space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetUnit {
    /// Time-aligned transcripts.
    #[default]
    Seconds,
    /// Text-anchored transcripts.
    Characters,
}

/// A versioned, multi-tier annotation graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Graph {
    id: Uuid,
    label: String,
    schema: Schema,
    unit: OffsetUnit,
    anchors: BTreeMap<AnchorId, Anchor>,
    annotations: BTreeMap<AnnotationId, Annotation>,
    next_anchor: u32,
    next_annotation: u32,
    /// The graph's own span: tags on the graph root share these anchors.
    bounds: (AnchorId, AnchorId),
    added_anchors: Vec<AnchorId>,
    added_annotations: Vec<AnnotationId>,
}

impl Graph {
    /// Creates an empty graph over the given schema.
    ///
    /// The graph's bound anchors are created immediately, with no offset and
    /// `Confidence::None`, so converters may attach graph-level tags before
    /// any timing is known.
    pub fn new(label: impl Into<String>, schema: Schema, unit: OffsetUnit) -> Self {
        let mut graph = Self {
            id: Uuid::new_v4(),
            label: label.into(),
            schema,
            unit,
            anchors: BTreeMap::new(),
            annotations: BTreeMap::new(),
            next_anchor: 0,
            next_annotation: 0,
            bounds: (AnchorId(0), AnchorId(0)),
            added_anchors: Vec::new(),
            added_annotations: Vec::new(),
        };
        let start = graph.add_anchor(None, Confidence::None);
        let end = graph.add_anchor(None, Confidence::None);
        graph.bounds = (start, end);
        graph
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn unit(&self) -> OffsetUnit {
        self.unit
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The anchors of the graph's implicit top-level span.
    pub fn bounds(&self) -> (AnchorId, AnchorId) {
        self.bounds
    }

    /// Registers an additional layer; the schema is otherwise immutable once
    /// attached. Returns false when the id is taken or the parent unknown.
    pub fn add_layer(&mut self, layer: Layer) -> bool {
        self.schema.add_layer(layer)
    }

    // Mutation

    /// Adds a new anchor and returns its handle.
    pub fn add_anchor(&mut self, offset: Option<f64>, confidence: Confidence) -> AnchorId {
        let id = AnchorId(self.next_anchor);
        self.next_anchor += 1;
        self.anchors.insert(id, Anchor::new(id, offset, confidence));
        self.added_anchors.push(id);
        id
    }

    /// Returns an existing live anchor at exactly this offset whose
    /// confidence is at least `confidence`, or creates one.
    pub fn get_or_create_anchor_at(&mut self, offset: f64, confidence: Confidence) -> AnchorId {
        let found = self
            .anchors
            .values()
            .find(|anchor| {
                !anchor.is_destroyed()
                    && anchor.offset() == Some(offset)
                    && anchor.confidence() >= confidence
            })
            .map(Anchor::id);
        match found {
            Some(id) => id,
            None => self.add_anchor(Some(offset), confidence),
        }
    }

    /// Adds an annotation, assigning its ordinal among live same-layer
    /// siblings under the same parent.
    ///
    /// Fails when the layer is unknown, the anchors do not exist, the
    /// declared parent's layer contradicts the schema, or a tag-layer
    /// annotation does not share its parent's anchors.
    pub fn add_annotation(
        &mut self,
        layer_id: &str,
        label: impl Into<String>,
        start: AnchorId,
        end: AnchorId,
        parent: Option<AnnotationId>,
        confidence: Confidence,
    ) -> Result<AnnotationId, StructureError> {
        let layer = self
            .schema
            .layer(layer_id)
            .ok_or_else(|| StructureError::UnknownLayer(layer_id.to_string()))?
            .clone();

        self.require_anchor(start)?;
        self.require_anchor(end)?;

        let actual_parent_layer = match parent {
            Some(parent_id) => {
                let parent_ann = self
                    .annotations
                    .get(&parent_id)
                    .ok_or(StructureError::UnknownAnnotation(parent_id))?;
                Some(parent_ann.layer_id().to_string())
            }
            None => None,
        };
        if actual_parent_layer.as_deref() != layer.parent_id.as_deref() {
            return Err(StructureError::ParentLayerMismatch {
                layer: layer_id.to_string(),
                expected: layer.parent_id.clone(),
                actual: actual_parent_layer,
            });
        }

        if layer.is_tag() {
            let (parent_start, parent_end) = match parent {
                Some(parent_id) => {
                    let parent_ann = &self.annotations[&parent_id];
                    (parent_ann.start(), parent_ann.end())
                }
                None => self.bounds,
            };
            if start != parent_start || end != parent_end {
                return Err(StructureError::TagAnchorMismatch(layer_id.to_string()));
            }
        }

        let ordinal = self.live_sibling_count(layer_id, parent) + 1;
        let id = AnnotationId(self.next_annotation);
        self.next_annotation += 1;
        self.annotations.insert(
            id,
            Annotation::new(
                id,
                layer_id.to_string(),
                AnnotationFields {
                    label: label.into(),
                    start,
                    end,
                    parent,
                    ordinal,
                    confidence,
                },
            ),
        );
        self.added_annotations.push(id);
        Ok(id)
    }

    /// Creates a zero-width tag on `layer_id` sharing the parent's anchors.
    pub fn create_tag(
        &mut self,
        parent: AnnotationId,
        layer_id: &str,
        label: impl Into<String>,
    ) -> Result<AnnotationId, StructureError> {
        let layer = self
            .schema
            .layer(layer_id)
            .ok_or_else(|| StructureError::UnknownLayer(layer_id.to_string()))?;
        if !layer.is_tag() {
            return Err(StructureError::NotATagLayer(layer_id.to_string()));
        }
        let parent_ann = self
            .annotations
            .get(&parent)
            .ok_or(StructureError::UnknownAnnotation(parent))?;
        let (start, end) = (parent_ann.start(), parent_ann.end());
        self.add_annotation(layer_id, label, start, end, Some(parent), Confidence::Manual)
    }

    /// Creates a tag on the graph root span, for schema-level annotations.
    pub fn create_graph_tag(
        &mut self,
        layer_id: &str,
        label: impl Into<String>,
    ) -> Result<AnnotationId, StructureError> {
        let layer = self
            .schema
            .layer(layer_id)
            .ok_or_else(|| StructureError::UnknownLayer(layer_id.to_string()))?;
        if !layer.is_tag() {
            return Err(StructureError::NotATagLayer(layer_id.to_string()));
        }
        let (start, end) = self.bounds;
        self.add_annotation(layer_id, label, start, end, None, Confidence::Manual)
    }

    /// Marks an annotation and all of its descendants for removal at the
    /// next commit. Until then they remain addressable by handle, so
    /// in-flight references never dangle.
    pub fn destroy_annotation(&mut self, id: AnnotationId) -> Result<(), StructureError> {
        if !self.annotations.contains_key(&id) {
            return Err(StructureError::UnknownAnnotation(id));
        }
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let children: Vec<AnnotationId> = self
                .annotations
                .values()
                .filter(|ann| !ann.is_destroyed() && ann.parent() == Some(current))
                .map(Annotation::id)
                .collect();
            pending.extend(children);
            if let Some(ann) = self.annotations.get_mut(&current) {
                ann.state_mut().mark_destroyed();
            }
        }
        Ok(())
    }

    /// Marks an anchor for removal at the next commit.
    pub fn destroy_anchor(&mut self, id: AnchorId) -> Result<(), StructureError> {
        let anchor = self
            .anchors
            .get_mut(&id)
            .ok_or(StructureError::UnknownAnchor(id))?;
        anchor.state_mut().mark_destroyed();
        Ok(())
    }

    /// The change list a persistent store replays, captured before
    /// `commit()` resets tracking. Complete and mutually exclusive per
    /// object; `NoChange` objects are omitted.
    pub fn changes(&self) -> Vec<ChangeRecord> {
        let mut records = Vec::new();
        for anchor in self.anchors.values() {
            let op = anchor.operation();
            if op != ChangeOp::NoChange {
                records.push(ChangeRecord {
                    graph: self.id,
                    target: ChangeTarget::Anchor(anchor.id()),
                    op,
                });
            }
        }
        for ann in self.annotations.values() {
            let op = ann.operation();
            if op != ChangeOp::NoChange {
                records.push(ChangeRecord {
                    graph: self.id,
                    target: ChangeTarget::Annotation(ann.id()),
                    op,
                });
            }
        }
        records
    }

    /// Reconciles tracked changes: physically removes Destroyed objects and
    /// adopts current values as the new baseline for survivors. Idempotent.
    ///
    /// A destroyed anchor still referenced by a surviving annotation is kept
    /// alive (and logged) rather than excised, so the survivor never holds a
    /// dangling handle.
    pub fn commit(&mut self) {
        let destroyed_annotations: Vec<AnnotationId> = self
            .annotations
            .values()
            .filter(|ann| ann.is_destroyed())
            .map(Annotation::id)
            .collect();
        for id in destroyed_annotations {
            self.annotations.remove(&id);
        }

        let destroyed_anchors: Vec<AnchorId> = self
            .anchors
            .values()
            .filter(|anchor| anchor.is_destroyed())
            .map(Anchor::id)
            .collect();
        for id in destroyed_anchors {
            let referenced = self
                .annotations
                .values()
                .any(|ann| ann.start() == id || ann.end() == id);
            if referenced || id == self.bounds.0 || id == self.bounds.1 {
                log::warn!(
                    "anchor {:?} is marked destroyed but still referenced; keeping it",
                    id
                );
                if let Some(anchor) = self.anchors.get_mut(&id) {
                    anchor.state_mut().revive();
                }
            } else {
                self.anchors.remove(&id);
            }
        }

        for anchor in self.anchors.values_mut() {
            anchor.state_mut().commit();
        }
        for ann in self.annotations.values_mut() {
            ann.state_mut().commit();
        }
        self.added_anchors.clear();
        self.added_annotations.clear();
    }

    /// Reverts all tracked changes since the last commit: created objects
    /// are dropped, edited objects return to their baseline, destroy marks
    /// are cleared.
    pub fn rollback(&mut self) {
        let created_annotations: Vec<AnnotationId> = self
            .annotations
            .iter()
            .filter(|(_, ann)| ann.state().original().is_none())
            .map(|(id, _)| *id)
            .collect();
        for id in created_annotations {
            self.annotations.remove(&id);
        }
        for ann in self.annotations.values_mut() {
            ann.state_mut().rollback();
        }

        let created_anchors: Vec<AnchorId> = self
            .anchors
            .iter()
            .filter(|(id, anchor)| {
                anchor.state().original().is_none()
                    && **id != self.bounds.0
                    && **id != self.bounds.1
            })
            .map(|(id, _)| *id)
            .collect();
        for id in created_anchors {
            self.anchors.remove(&id);
        }
        for anchor in self.anchors.values_mut() {
            anchor.state_mut().rollback();
        }

        self.added_anchors.clear();
        self.added_annotations.clear();
    }

    /// Anchor handles added since the last commit, in creation order.
    pub fn added_anchors(&self) -> &[AnchorId] {
        &self.added_anchors
    }

    /// Annotation handles added since the last commit, in creation order.
    pub fn added_annotations(&self) -> &[AnnotationId] {
        &self.added_annotations
    }

    // Access

    /// Looks up an anchor by handle, including Destroyed ones.
    pub fn anchor(&self, id: AnchorId) -> Option<&Anchor> {
        self.anchors.get(&id)
    }

    /// Mutable lookup, for offset writes through the confidence gate.
    pub fn anchor_mut(&mut self, id: AnchorId) -> Option<&mut Anchor> {
        self.anchors.get_mut(&id)
    }

    /// Looks up an annotation by handle, including Destroyed ones.
    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.get(&id)
    }

    /// Mutable lookup, for label edits recorded against the tracked baseline.
    pub fn annotation_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.get_mut(&id)
    }

    /// Live anchors in creation order.
    pub fn anchors(&self) -> impl Iterator<Item = &Anchor> {
        self.anchors.values().filter(|anchor| !anchor.is_destroyed())
    }

    /// Live annotations in creation order.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.values().filter(|ann| !ann.is_destroyed())
    }

    /// The offset of an annotation's start anchor, if known.
    pub fn start_offset(&self, ann: &Annotation) -> Option<f64> {
        self.anchors.get(&ann.start()).and_then(Anchor::offset)
    }

    /// The offset of an annotation's end anchor, if known.
    pub fn end_offset(&self, ann: &Annotation) -> Option<f64> {
        self.anchors.get(&ann.end()).and_then(Anchor::offset)
    }

    fn require_anchor(&self, id: AnchorId) -> Result<(), StructureError> {
        match self.anchors.get(&id) {
            Some(anchor) if !anchor.is_destroyed() => Ok(()),
            _ => Err(StructureError::UnknownAnchor(id)),
        }
    }

    fn live_sibling_count(&self, layer_id: &str, parent: Option<AnnotationId>) -> u32 {
        self.annotations
            .values()
            .filter(|ann| {
                !ann.is_destroyed() && ann.layer_id() == layer_id && ann.parent() == parent
            })
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_graph() -> Graph {
        Graph::new("test.trs", Schema::transcript(), OffsetUnit::Seconds)
    }

    /// Builds participant > turn and returns the turn's handle.
    fn scaffold_turn(graph: &mut Graph) -> AnnotationId {
        let (start, end) = graph.bounds();
        let who = graph
            .add_annotation("participant", "mop03.2b", start, end, None, Confidence::Manual)
            .unwrap();
        let t_start = graph.add_anchor(Some(0.0), Confidence::Manual);
        let t_end = graph.add_anchor(Some(10.0), Confidence::Manual);
        graph
            .add_annotation("turn", "mop03.2b", t_start, t_end, Some(who), Confidence::Manual)
            .unwrap()
    }

    #[test]
    fn test_add_annotation_checks_layer_and_parent() {
        let mut graph = word_graph();
        let a = graph.add_anchor(Some(0.0), Confidence::Manual);
        let b = graph.add_anchor(Some(1.0), Confidence::Manual);

        assert!(matches!(
            graph.add_annotation("phone", "p", a, b, None, Confidence::Manual),
            Err(StructureError::UnknownLayer(_))
        ));

        // word requires a turn parent
        assert!(matches!(
            graph.add_annotation("word", "hello", a, b, None, Confidence::Manual),
            Err(StructureError::ParentLayerMismatch { .. })
        ));

        let turn = scaffold_turn(&mut graph);
        let word = graph
            .add_annotation("word", "hello", a, b, Some(turn), Confidence::Manual)
            .unwrap();
        assert_eq!(graph.annotation(word).unwrap().ordinal(), 1);
    }

    #[test]
    fn test_ordinals_count_live_siblings() {
        let mut graph = word_graph();
        let turn = scaffold_turn(&mut graph);
        let mut previous = graph.add_anchor(Some(0.0), Confidence::Manual);
        let mut words = Vec::new();
        for (i, label) in ["the", "quick", "fox"].iter().enumerate() {
            let next = graph.add_anchor(Some((i + 1) as f64), Confidence::Manual);
            words.push(
                graph
                    .add_annotation("word", *label, previous, next, Some(turn), Confidence::Manual)
                    .unwrap(),
            );
            previous = next;
        }
        assert_eq!(graph.annotation(words[2]).unwrap().ordinal(), 3);

        graph.destroy_annotation(words[1]).unwrap();
        let end = graph.add_anchor(Some(4.0), Confidence::Manual);
        let tail = graph
            .add_annotation("word", "jumps", previous, end, Some(turn), Confidence::Manual)
            .unwrap();
        // two live siblings remain, so the new word is ordinal 3
        assert_eq!(graph.annotation(tail).unwrap().ordinal(), 3);
    }

    #[test]
    fn test_get_or_create_anchor_reuses_by_confidence() {
        let mut graph = word_graph();
        let interpolated = graph.add_anchor(Some(2.0), Confidence::Default);
        assert_eq!(
            graph.get_or_create_anchor_at(2.0, Confidence::Default),
            interpolated
        );
        // an anchor of lower confidence than requested is not reused
        let fresh = graph.get_or_create_anchor_at(2.0, Confidence::Manual);
        assert_ne!(fresh, interpolated);
        assert_eq!(graph.anchor(fresh).unwrap().confidence(), Confidence::Manual);
    }

    #[test]
    fn test_tag_layer_must_share_parent_anchors() {
        let mut graph = word_graph();
        graph.add_layer(Layer::tag("pos", "Part of speech").with_parent("word"));
        let turn = scaffold_turn(&mut graph);
        let a = graph.add_anchor(Some(0.0), Confidence::Manual);
        let b = graph.add_anchor(Some(1.0), Confidence::Manual);
        let word = graph
            .add_annotation("word", "hello", a, b, Some(turn), Confidence::Manual)
            .unwrap();

        let c = graph.add_anchor(Some(1.0), Confidence::Manual);
        assert!(matches!(
            graph.add_annotation("pos", "UH", a, c, Some(word), Confidence::Manual),
            Err(StructureError::TagAnchorMismatch(_))
        ));

        let tag = graph.create_tag(word, "pos", "UH").unwrap();
        let tag_ann = graph.annotation(tag).unwrap();
        assert_eq!(tag_ann.start(), a);
        assert_eq!(tag_ann.end(), b);
    }

    #[test]
    fn test_graph_tag_uses_bounds() {
        let mut graph = word_graph();
        graph.add_layer(Layer::tag("language", "Language"));
        let tag = graph.create_graph_tag("language", "en-NZ").unwrap();
        let (start, end) = graph.bounds();
        let tag_ann = graph.annotation(tag).unwrap();
        assert_eq!(tag_ann.start(), start);
        assert_eq!(tag_ann.end(), end);
        assert_eq!(tag_ann.parent(), None);
    }

    #[test]
    fn test_destroy_cascades_and_commit_excises() {
        let mut graph = word_graph();
        graph.add_layer(Layer::tag("pos", "Part of speech").with_parent("word"));
        let turn = scaffold_turn(&mut graph);
        let a = graph.add_anchor(Some(0.0), Confidence::Manual);
        let b = graph.add_anchor(Some(1.0), Confidence::Manual);
        let word = graph
            .add_annotation("word", "hello", a, b, Some(turn), Confidence::Manual)
            .unwrap();
        let tag = graph.create_tag(word, "pos", "UH").unwrap();

        graph.destroy_annotation(word).unwrap();
        assert!(graph.annotation(tag).unwrap().is_destroyed());
        // still addressable until commit
        assert!(graph.annotation(word).is_some());

        graph.commit();
        assert!(graph.annotation(word).is_none());
        assert!(graph.annotation(tag).is_none());
        assert_eq!(
            graph.annotation(turn).unwrap().operation(),
            ChangeOp::NoChange
        );
        // commit is idempotent
        graph.commit();
        assert!(graph.changes().is_empty());
    }

    #[test]
    fn test_referenced_destroyed_anchor_survives_commit() {
        let mut graph = word_graph();
        let turn = scaffold_turn(&mut graph);
        let a = graph.add_anchor(Some(0.0), Confidence::Manual);
        let b = graph.add_anchor(Some(1.0), Confidence::Manual);
        graph
            .add_annotation("word", "hello", a, b, Some(turn), Confidence::Manual)
            .unwrap();

        graph.destroy_anchor(b).unwrap();
        graph.commit();
        // the word still ends at b, so b was kept alive
        assert!(graph.anchor(b).is_some());
        assert!(!graph.anchor(b).unwrap().is_destroyed());
    }

    #[test]
    fn test_changes_lists_each_object_once() {
        let mut graph = word_graph();
        let turn = scaffold_turn(&mut graph);
        graph.commit();

        let a = graph.add_anchor(None, Confidence::None);
        let b = graph.add_anchor(Some(5.0), Confidence::Automatic);
        let word = graph
            .add_annotation("word", "hullo", a, b, Some(turn), Confidence::Manual)
            .unwrap();
        graph
            .annotation_mut(word)
            .unwrap()
            .set_label("hello");
        graph.destroy_annotation(word).unwrap();

        let changes = graph.changes();
        let word_records: Vec<&ChangeRecord> = changes
            .iter()
            .filter(|record| record.target == ChangeTarget::Annotation(word))
            .collect();
        assert_eq!(word_records.len(), 1);
        // Destroy dominates the label edit
        assert_eq!(word_records[0].op, ChangeOp::Destroy);
        assert!(changes
            .iter()
            .any(|record| record.target == ChangeTarget::Anchor(a)
                && record.op == ChangeOp::Create));
    }

    #[test]
    fn test_rollback_drops_created_and_restores_edits() {
        let mut graph = word_graph();
        let turn = scaffold_turn(&mut graph);
        graph.commit();

        let a = graph.add_anchor(Some(0.0), Confidence::Manual);
        let b = graph.add_anchor(Some(1.0), Confidence::Manual);
        let word = graph
            .add_annotation("word", "hello", a, b, Some(turn), Confidence::Manual)
            .unwrap();
        graph.annotation_mut(turn).unwrap().set_label("renamed");
        graph.destroy_annotation(turn).unwrap();

        graph.rollback();
        assert!(graph.annotation(word).is_none());
        assert!(graph.anchor(a).is_none());
        let turn_ann = graph.annotation(turn).unwrap();
        assert!(!turn_ann.is_destroyed());
        assert_eq!(turn_ann.label(), "mop03.2b");
        assert_eq!(turn_ann.operation(), ChangeOp::NoChange);
    }
}
