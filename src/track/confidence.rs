//! Confidence ratings for offsets and labels.
//!
//! Confidence is a write gate, not just metadata: an automated pass may only
//! overwrite an anchor offset when it brings strictly more confidence than
//! the value already there, so interpolation never clobbers a human alignment.

use serde::{Deserialize, Serialize};

/// Ordered trust level for a value in the graph.
///
/// The derive order is the gate order: `None < Default < Automatic < Manual`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    /// No information about where the value came from.
    #[default]
    None,
    /// Computed by linear interpolation between more certain neighbours.
    Default,
    /// Produced by an automated process, e.g. forced alignment.
    Automatic,
    /// Aligned or entered by a human annotator.
    Manual,
}

impl Confidence {
    /// Whether a write at `incoming` confidence may replace a value currently
    /// held at `self` confidence.
    pub fn permits(&self, incoming: Confidence) -> bool {
        incoming > *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_order() {
        assert!(Confidence::None < Confidence::Default);
        assert!(Confidence::Default < Confidence::Automatic);
        assert!(Confidence::Automatic < Confidence::Manual);
    }

    #[test]
    fn test_permits_is_strict() {
        assert!(Confidence::None.permits(Confidence::Default));
        assert!(Confidence::Default.permits(Confidence::Manual));
        // Equal confidence is not enough
        assert!(!Confidence::Manual.permits(Confidence::Manual));
        assert!(!Confidence::Automatic.permits(Confidence::Default));
    }
}
