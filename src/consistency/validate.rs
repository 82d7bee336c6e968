//! Structural validation.
//!
//! Run after any bulk mutation, typically when a converter finishes building
//! a graph. Violations are collected and returned, never raised: the caller
//! sees the full picture and decides whether the graph is still usable.

use crate::graph::{Annotation, AnnotationId, Graph};
use crate::schema::Layer;

/// How bad a validation finding is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssueSeverity {
    /// The graph remains usable.
    Warning,
    /// A schema relationship is broken.
    Error,
}

/// One structural finding.
#[derive(Clone, Debug)]
pub struct ValidationIssue {
    /// Display form of the offending object, when there is a single one.
    pub target: Option<String>,
    pub severity: IssueSeverity,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            target: None,
            severity: IssueSeverity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            target: None,
            severity: IssueSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn for_annotation(mut self, id: AnnotationId) -> Self {
        self.target = Some(format!("annotation {}", id.0));
        self
    }
}

/// Verifies the invariants a well-formed graph upholds.
///
/// Saturation checks compare offsets and so are skipped while any offset in
/// the group is still unknown; validation never triggers interpolation.
pub struct GraphValidator {
    /// Tolerance for offset comparisons in saturation checks.
    epsilon: f64,
}

impl Default for GraphValidator {
    fn default() -> Self {
        Self { epsilon: 1e-9 }
    }
}

impl GraphValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Collects every violation in the graph.
    pub fn validate(&self, graph: &Graph) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        self.check_parents(graph, &mut issues);
        self.check_tag_anchors(graph, &mut issues);
        self.check_parent_includes(graph, &mut issues);
        self.check_saturation(graph, &mut issues);
        self.check_ordinals(graph, &mut issues);
        issues
    }

    /// Child spans lie within the parent's span on layers declaring
    /// `parent_includes`, once all four offsets are known.
    fn check_parent_includes(&self, graph: &Graph, issues: &mut Vec<ValidationIssue>) {
        for ann in graph.annotations() {
            let Some(layer) = graph.schema().layer(ann.layer_id()) else {
                continue;
            };
            if !layer.parent_includes || layer.is_tag() {
                continue;
            }
            let Some(parent) = ann.parent().and_then(|id| graph.annotation(id)) else {
                continue;
            };
            let (Some(p_start), Some(p_end), Some(c_start), Some(c_end)) = (
                graph.start_offset(parent),
                graph.end_offset(parent),
                graph.start_offset(ann),
                graph.end_offset(ann),
            ) else {
                continue;
            };
            if c_start < p_start - self.epsilon || c_end > p_end + self.epsilon {
                issues.push(
                    ValidationIssue::warning(format!(
                        "`{}` extends beyond its parent `{}` on layer `{}`",
                        ann.label(),
                        parent.label(),
                        layer.id
                    ))
                    .for_annotation(ann.id()),
                );
            }
        }
    }

    /// Every non-root annotation's parent exists, is live, and sits on the
    /// schema-declared parent layer.
    fn check_parents(&self, graph: &Graph, issues: &mut Vec<ValidationIssue>) {
        for ann in graph.annotations() {
            let Some(layer) = graph.schema().layer(ann.layer_id()) else {
                issues.push(
                    ValidationIssue::error(format!(
                        "`{}` is on layer `{}`, which the schema does not declare",
                        ann.label(),
                        ann.layer_id()
                    ))
                    .for_annotation(ann.id()),
                );
                continue;
            };
            let actual_parent_layer = match ann.parent() {
                Some(parent_id) => match graph.annotation(parent_id) {
                    Some(parent) if !parent.is_destroyed() => Some(parent.layer_id().to_string()),
                    Some(_) => {
                        issues.push(
                            ValidationIssue::warning(format!(
                                "`{}` has a parent marked for destruction",
                                ann.label()
                            ))
                            .for_annotation(ann.id()),
                        );
                        continue;
                    }
                    None => {
                        issues.push(
                            ValidationIssue::error(format!(
                                "`{}` references a parent that does not exist",
                                ann.label()
                            ))
                            .for_annotation(ann.id()),
                        );
                        continue;
                    }
                },
                None => None,
            };
            if actual_parent_layer.as_deref() != layer.parent_id.as_deref() {
                issues.push(
                    ValidationIssue::error(format!(
                        "`{}` on layer `{}` expects parent layer {:?} but has {:?}",
                        ann.label(),
                        layer.id,
                        layer.parent_id,
                        actual_parent_layer
                    ))
                    .for_annotation(ann.id()),
                );
            }
        }
    }

    /// Tag-layer annotations share their parent's anchors by handle.
    fn check_tag_anchors(&self, graph: &Graph, issues: &mut Vec<ValidationIssue>) {
        for ann in graph.annotations() {
            let Some(layer) = graph.schema().layer(ann.layer_id()) else {
                continue;
            };
            if !layer.is_tag() {
                continue;
            }
            let (parent_start, parent_end) = match ann.parent() {
                Some(parent_id) => match graph.annotation(parent_id) {
                    Some(parent) => (parent.start(), parent.end()),
                    None => continue, // already reported by check_parents
                },
                None => graph.bounds(),
            };
            if ann.start() != parent_start || ann.end() != parent_end {
                issues.push(
                    ValidationIssue::error(format!(
                        "tag `{}` on layer `{}` does not share its parent's anchors",
                        ann.label(),
                        layer.id
                    ))
                    .for_annotation(ann.id()),
                );
            }
        }
    }

    /// Children of a saturated layer tile the parent's span exactly:
    /// contiguous, non-overlapping, covering start to end.
    fn check_saturation(&self, graph: &Graph, issues: &mut Vec<ValidationIssue>) {
        let saturated: Vec<Layer> = graph
            .schema()
            .layers()
            .filter(|layer| layer.saturated && !layer.is_tag())
            .cloned()
            .collect();
        for layer in saturated {
            for (parent_id, children) in group_by_parent(graph, &layer.id) {
                let Some(parent_id) = parent_id else {
                    continue; // the graph root has no fixed span to tile
                };
                let Some(parent) = graph.annotation(parent_id) else {
                    continue;
                };
                let mut spans = Vec::with_capacity(children.len() + 1);
                spans.push((graph.start_offset(parent), None));
                for child in &children {
                    spans.push((graph.start_offset(child), graph.end_offset(child)));
                }
                let parent_end = graph.end_offset(parent);
                // skipped while offsets are unknown; validation never interpolates
                if parent_end.is_none()
                    || spans.iter().any(|(start, _)| start.is_none())
                    || spans[1..].iter().any(|(_, end)| end.is_none())
                {
                    continue;
                }

                let mut cursor = spans[0].0.unwrap_or(0.0);
                let mut tiled = true;
                for (start, end) in &spans[1..] {
                    let (start, end) = (start.unwrap_or(0.0), end.unwrap_or(0.0));
                    if (start - cursor).abs() > self.epsilon {
                        tiled = false;
                        break;
                    }
                    cursor = end;
                }
                if tiled && (cursor - parent_end.unwrap_or(0.0)).abs() > self.epsilon {
                    tiled = false;
                }
                if !tiled {
                    issues.push(
                        ValidationIssue::warning(format!(
                            "children on saturated layer `{}` do not tile `{}` exactly",
                            layer.id,
                            parent.label()
                        ))
                        .for_annotation(parent_id),
                    );
                }
            }
        }
    }

    /// Ordinals form a dense 1..N sequence per (parent, layer) group.
    fn check_ordinals(&self, graph: &Graph, issues: &mut Vec<ValidationIssue>) {
        let layer_ids: Vec<String> = graph
            .schema()
            .layers()
            .map(|layer| layer.id.clone())
            .collect();
        for layer_id in layer_ids {
            for (parent_id, children) in group_by_parent(graph, &layer_id) {
                let mut ordinals: Vec<u32> = children.iter().map(|ann| ann.ordinal()).collect();
                ordinals.sort_unstable();
                let dense = ordinals
                    .iter()
                    .enumerate()
                    .all(|(i, &ordinal)| ordinal == i as u32 + 1);
                if !dense {
                    let mut issue = ValidationIssue::warning(format!(
                        "ordinals on layer `{layer_id}` are not a dense 1..{} sequence",
                        children.len()
                    ));
                    if let Some(parent_id) = parent_id {
                        issue = issue.for_annotation(parent_id);
                    }
                    issues.push(issue);
                }
            }
        }
    }
}

/// Live annotations of a layer grouped by parent, children in ordinal order,
/// groups in parent creation order.
fn group_by_parent<'g>(
    graph: &'g Graph,
    layer_id: &str,
) -> Vec<(Option<AnnotationId>, Vec<&'g Annotation>)> {
    let mut groups: Vec<(Option<AnnotationId>, Vec<&Annotation>)> = Vec::new();
    for ann in graph.all(layer_id) {
        match groups.iter_mut().find(|(parent, _)| *parent == ann.parent()) {
            Some((_, children)) => children.push(ann),
            None => groups.push((ann.parent(), vec![ann])),
        }
    }
    groups
}
