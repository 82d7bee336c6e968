//! Change operations and the store synchronization record.
//!
//! After a batch of edits, a persistent store replays one operation per
//! object. `ChangeOp` is that operation, derived by comparing an object's
//! current fields against its tracked baseline; `ChangeRecord` is the entry
//! handed across the store boundary just before `commit()` resets tracking.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::{AnchorId, AnnotationId};

/// How an object has changed since its baseline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeOp {
    /// No baseline exists; the object is new.
    Create,
    /// A baseline exists and at least one tracked field differs.
    Update,
    /// Explicitly marked for removal; dominates any field edits.
    Destroy,
    /// Baseline exists and matches the current fields.
    NoChange,
}

/// The object a `ChangeRecord` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeTarget {
    Anchor(AnchorId),
    Annotation(AnnotationId),
}

/// One entry of the change list consumed by a persistent store.
///
/// The list is complete and mutually exclusive per object: every anchor or
/// annotation whose operation is not `NoChange` appears exactly once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Which graph the change belongs to, so records from different
    /// transcripts never collide in a shared store.
    pub graph: Uuid,
    pub target: ChangeTarget,
    pub op: ChangeOp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_roundtrip() {
        let record = ChangeRecord {
            graph: Uuid::new_v4(),
            target: ChangeTarget::Anchor(AnchorId(3)),
            op: ChangeOp::Update,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ChangeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
