//! Anchors: the nodes of the graph.
//!
//! An anchor is a point in the graph's offset space. Anchors are shared by
//! handle: the end anchor of one word is routinely the same `AnchorId` as the
//! start anchor of the next, and query algorithms rely on that identity
//! rather than on offset equality.

use serde::{Deserialize, Serialize};

use crate::track::{ChangeOp, Confidence, Tracked};

/// Stable handle of an anchor within its graph's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnchorId(pub u32);

/// The change-tracked fields of an anchor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorFields {
    /// Offset in the graph's declared unit; `None` until known or interpolated.
    pub offset: Option<f64>,
    pub confidence: Confidence,
}

/// A node of the annotation graph.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Anchor {
    id: AnchorId,
    state: Tracked<AnchorFields>,
}

impl Anchor {
    pub(crate) fn new(id: AnchorId, offset: Option<f64>, confidence: Confidence) -> Self {
        Self {
            id,
            state: Tracked::new(AnchorFields { offset, confidence }),
        }
    }

    pub fn id(&self) -> AnchorId {
        self.id
    }

    pub fn offset(&self) -> Option<f64> {
        self.state.current().offset
    }

    pub fn confidence(&self) -> Confidence {
        self.state.current().confidence
    }

    /// The offset as of the last commit, or the current offset for an
    /// anchor created since then.
    pub fn original_offset(&self) -> Option<f64> {
        match self.state.original() {
            Some(fields) => fields.offset,
            None => self.offset(),
        }
    }

    /// Confidence-gated offset write.
    ///
    /// Applied only when `confidence` is strictly greater than the anchor's
    /// current confidence; returns whether the write took effect. An anchor
    /// with no offset yet still holds a confidence (usually `None`), so the
    /// gate covers first writes too.
    pub fn try_set_offset(&mut self, offset: f64, confidence: Confidence) -> bool {
        if !self.confidence().permits(confidence) {
            return false;
        }
        self.state.update(|fields| {
            fields.offset = Some(offset);
            fields.confidence = confidence;
        });
        true
    }

    /// Unconditional offset write, bypassing the confidence gate.
    ///
    /// Used by the interpolator's tie-break rule, where ordering correctness
    /// outranks offset exactness and a Manual anchor may be downgraded.
    pub fn force_offset(&mut self, offset: f64, confidence: Confidence) {
        self.state.update(|fields| {
            fields.offset = Some(offset);
            fields.confidence = confidence;
        });
    }

    pub fn operation(&self) -> ChangeOp {
        self.state.operation()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.is_destroyed()
    }

    pub(crate) fn state(&self) -> &Tracked<AnchorFields> {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut Tracked<AnchorFields> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_write_gate() {
        let mut anchor = Anchor::new(AnchorId(0), None, Confidence::None);
        assert!(anchor.try_set_offset(1.5, Confidence::Default));
        assert_eq!(anchor.offset(), Some(1.5));

        // Default cannot overwrite Default
        assert!(!anchor.try_set_offset(2.0, Confidence::Default));
        assert_eq!(anchor.offset(), Some(1.5));

        assert!(anchor.try_set_offset(2.0, Confidence::Manual));
        assert_eq!(anchor.confidence(), Confidence::Manual);
    }

    #[test]
    fn test_force_bypasses_gate() {
        let mut anchor = Anchor::new(AnchorId(0), Some(12.0), Confidence::Manual);
        anchor.force_offset(12.5, Confidence::Default);
        assert_eq!(anchor.offset(), Some(12.5));
        assert_eq!(anchor.confidence(), Confidence::Default);
    }

    #[test]
    fn test_change_tracking_composes() {
        let mut anchor = Anchor::new(AnchorId(0), None, Confidence::None);
        assert_eq!(anchor.operation(), ChangeOp::Create);
        anchor.state_mut().commit();
        assert_eq!(anchor.operation(), ChangeOp::NoChange);

        anchor.try_set_offset(3.0, Confidence::Automatic);
        assert_eq!(anchor.operation(), ChangeOp::Update);
        assert_eq!(anchor.original_offset(), None);
    }
}
