//! Offset interpolation.
//!
//! Converters often know the order of words long before anyone knows their
//! timing. The interpolator fills in the missing offsets: it walks the
//! ordinal-ordered anchor chain of an ordering layer (by default the word
//! layer), finds maximal runs of unknown offsets, and spreads them between
//! the nearest known bounds. Anchors whose offsets came from an automated
//! aligner or a human are never touched.

use crate::graph::{AnchorId, Graph};
use crate::schema::LayerId;
use crate::track::Confidence;

/// How offsets are distributed across a run of unknown anchors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Equal spacing by ordinal position.
    #[default]
    ByOrdinal,
    /// Spacing proportional to the label length of the annotation following
    /// each anchor, so long words get more room.
    ByLabelLength,
}

/// What an interpolation pass did to a graph.
#[derive(Clone, Debug, Default)]
pub struct InterpolationReport {
    /// Anchors that received a computed offset.
    pub assigned: usize,
    /// Anchors bumped by the tie-break rule.
    pub bumped: usize,
    pub warnings: Vec<String>,
}

/// Fills unknown anchor offsets by proportional interpolation.
pub struct OffsetInterpolator {
    margin: f64,
    ordering_layer: Option<LayerId>,
    weighting: Weighting,
}

impl Default for OffsetInterpolator {
    fn default() -> Self {
        Self {
            margin: 1.0,
            ordering_layer: None,
            weighting: Weighting::ByOrdinal,
        }
    }
}

impl OffsetInterpolator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance added per anchor when a run has no bound on one side.
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    /// Layer whose ordinal chain orders the anchors; defaults to the
    /// schema's word layer.
    pub fn with_ordering_layer(mut self, layer_id: impl Into<LayerId>) -> Self {
        self.ordering_layer = Some(layer_id.into());
        self
    }

    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Assigns offsets to exactly the anchors that have none, at
    /// `Confidence::Default`, then enforces sibling ordering with the
    /// tie-break rule. Anchors at Automatic or Manual confidence keep their
    /// offsets no matter what run they fall in.
    pub fn interpolate(&self, graph: &mut Graph) -> InterpolationReport {
        let mut report = InterpolationReport::default();

        let Some(layer_id) = self
            .ordering_layer
            .clone()
            .or_else(|| graph.schema().word_layer_id.clone())
        else {
            report
                .warnings
                .push("no ordering layer configured and the schema declares no word layer".into());
            return report;
        };

        let chain = self.anchor_chain(graph, &layer_id);
        let plan = self.plan_offsets(graph, &chain, &layer_id, &mut report);
        for (anchor_id, offset) in plan {
            if let Some(anchor) = graph.anchor_mut(anchor_id) {
                anchor.force_offset(offset, Confidence::Default);
                report.assigned += 1;
            }
        }

        self.separate_siblings(graph, &mut report);
        report
    }

    /// The ordinal-ordered anchor chain of the ordering layer: each
    /// annotation contributes its start then its end, shared anchors
    /// appearing once.
    fn anchor_chain(&self, graph: &Graph, layer_id: &str) -> Vec<AnchorId> {
        let mut chain = Vec::new();
        for ann in graph.all(layer_id) {
            for anchor in [ann.start(), ann.end()] {
                if !chain.contains(&anchor) {
                    chain.push(anchor);
                }
            }
        }
        chain
    }

    /// Computes the offset every unknown anchor should receive. Read-only so
    /// the chain borrows stay immutable; the caller applies the plan.
    fn plan_offsets(
        &self,
        graph: &Graph,
        chain: &[AnchorId],
        layer_id: &str,
        report: &mut InterpolationReport,
    ) -> Vec<(AnchorId, f64)> {
        let mut plan = Vec::new();
        let offset_of = |id: AnchorId| graph.anchor(id).and_then(|anchor| anchor.offset());
        let untouchable = |id: AnchorId| {
            graph
                .anchor(id)
                .map(|anchor| anchor.confidence() >= Confidence::Automatic)
                .unwrap_or(true)
        };

        let known: Vec<usize> = (0..chain.len())
            .filter(|&i| offset_of(chain[i]).is_some())
            .collect();
        if known.is_empty() {
            if !chain.is_empty() {
                report
                    .warnings
                    .push(format!("no known offsets along the `{layer_id}` chain"));
            }
            return plan;
        }

        let fillable = |i: usize| offset_of(chain[i]).is_none() && !untouchable(chain[i]);

        // leading run: no lower bound, mirror the trailing margin rule
        let first_known = known[0];
        if first_known > 0 {
            report.warnings.push(format!(
                "{first_known} anchor(s) precede the first known offset; extending backwards"
            ));
            let base = offset_of(chain[first_known]).unwrap_or(0.0);
            for (steps_back, i) in (0..first_known).rev().enumerate() {
                if fillable(i) {
                    plan.push((chain[i], base - self.margin * (steps_back + 1) as f64));
                }
            }
        }

        // bounded runs between consecutive known offsets
        for pair in known.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let run: Vec<usize> = (left + 1..right).filter(|&i| fillable(i)).collect();
            if run.is_empty() {
                continue;
            }
            let start = offset_of(chain[left]).unwrap_or(0.0);
            let end = offset_of(chain[right]).unwrap_or(0.0);
            if end < start {
                report.warnings.push(format!(
                    "negative duration between known offsets {start} and {end}; run skipped"
                ));
                continue;
            }
            let weights = self.segment_weights(graph, chain, layer_id, left, &run, right);
            let total: f64 = weights.iter().sum();
            let mut cumulative = 0.0;
            for (position, &i) in run.iter().enumerate() {
                cumulative += weights[position];
                plan.push((chain[i], start + (end - start) * cumulative / total));
            }
        }

        // trailing run: extend the offset space past the last known offset
        let last_known = *known.last().unwrap_or(&0);
        let base = offset_of(chain[last_known]).unwrap_or(0.0);
        let mut steps = 0;
        for i in last_known + 1..chain.len() {
            if fillable(i) {
                steps += 1;
                plan.push((chain[i], base + self.margin * steps as f64));
            }
        }

        plan
    }

    /// One weight per segment of a bounded run (`run.len() + 1` segments).
    fn segment_weights(
        &self,
        graph: &Graph,
        chain: &[AnchorId],
        layer_id: &str,
        left: usize,
        run: &[usize],
        _right: usize,
    ) -> Vec<f64> {
        let segments = run.len() + 1;
        match self.weighting {
            Weighting::ByOrdinal => vec![1.0; segments],
            Weighting::ByLabelLength => {
                let mut starts = Vec::with_capacity(segments);
                starts.push(left);
                starts.extend_from_slice(run);
                starts
                    .into_iter()
                    .map(|i| {
                        graph
                            .starting_at(chain[i], layer_id)
                            .first()
                            .map(|ann| ann.label().chars().count().max(1) as f64)
                            .unwrap_or(1.0)
                    })
                    .collect()
            }
        }
    }

    /// Tie-break pass: within every non-overlapping peer layer, sibling
    /// start anchors proposing the same offset have the later one bumped by
    /// the smallest representable increment, forced to Default confidence
    /// even if it was Manual. Ordering correctness outranks offset exactness
    /// here.
    fn separate_siblings(&self, graph: &mut Graph, report: &mut InterpolationReport) {
        let layers: Vec<LayerId> = graph
            .schema()
            .layers()
            .filter(|layer| layer.peers && !layer.peers_overlap && !layer.is_tag())
            .map(|layer| layer.id.clone())
            .collect();

        for layer_id in layers {
            let starts: Vec<AnchorId> = graph
                .all(&layer_id)
                .iter()
                .map(|ann| ann.start())
                .collect();
            let mut previous: Option<(AnchorId, f64)> = None;
            for anchor_id in starts {
                let Some(offset) = graph.anchor(anchor_id).and_then(|a| a.offset()) else {
                    previous = None;
                    continue;
                };
                if let Some((prev_id, prev_offset)) = previous {
                    if prev_id != anchor_id && offset == prev_offset {
                        let bumped = next_up(prev_offset);
                        if let Some(anchor) = graph.anchor_mut(anchor_id) {
                            log::warn!(
                                "anchors {:?} and {:?} share offset {}; bumping the later one",
                                prev_id,
                                anchor_id,
                                prev_offset
                            );
                            anchor.force_offset(bumped, Confidence::Default);
                            report.bumped += 1;
                        }
                        previous = Some((anchor_id, bumped));
                        continue;
                    }
                }
                previous = Some((anchor_id, offset));
            }
        }
    }
}

/// The smallest `f64` strictly greater than `x`.
fn next_up(x: f64) -> f64 {
    if x.is_nan() || x == f64::INFINITY {
        return x;
    }
    if x == 0.0 {
        return f64::from_bits(1);
    }
    let bits = x.to_bits();
    if x.is_sign_positive() {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}
