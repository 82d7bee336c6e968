//! The change-tracked field store.
//!
//! `Tracked<F>` wraps a set of fields and remembers their values as of the
//! last commit. Comparing current against baseline yields the object's
//! `ChangeOp`. Anchors and annotations both build their change semantics on
//! this one primitive; nothing else in the crate reimplements diffing.

use serde::{Deserialize, Serialize};

use super::change::ChangeOp;

/// A field set with a tracked baseline.
///
/// A `None` baseline means the object was created after the last commit.
/// Destroyed objects keep their fields editable (they may still be inspected
/// for audit purposes) but report `ChangeOp::Destroy` until `commit` or
/// `revive`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tracked<F: Clone + PartialEq> {
    current: F,
    baseline: Option<F>,
    destroyed: bool,
}

impl<F: Clone + PartialEq> Tracked<F> {
    /// Wraps freshly created fields with no prior state.
    pub fn new(fields: F) -> Self {
        Self {
            current: fields,
            baseline: None,
            destroyed: false,
        }
    }

    /// Wraps fields that already exist in the store, so the baseline is the
    /// current state and the operation starts as `NoChange`.
    pub fn existing(fields: F) -> Self {
        Self {
            current: fields.clone(),
            baseline: Some(fields),
            destroyed: false,
        }
    }

    /// The current field values.
    pub fn current(&self) -> &F {
        &self.current
    }

    /// The field values as of the last commit, or `None` for a new object.
    pub fn original(&self) -> Option<&F> {
        self.baseline.as_ref()
    }

    /// Edits the current fields in place.
    ///
    /// Permitted on destroyed objects; the derived operation stays `Destroy`
    /// regardless of what is edited.
    pub fn update(&mut self, edit: impl FnOnce(&mut F)) {
        edit(&mut self.current);
    }

    /// Marks the object for removal at the next commit.
    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Clears a destroy mark without touching field edits.
    pub fn revive(&mut self) {
        self.destroyed = false;
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Derives the operation a store would need to replay this object.
    pub fn operation(&self) -> ChangeOp {
        if self.destroyed {
            return ChangeOp::Destroy;
        }
        match &self.baseline {
            None => ChangeOp::Create,
            Some(original) if *original != self.current => ChangeOp::Update,
            Some(_) => ChangeOp::NoChange,
        }
    }

    /// Adopts the current values as the new baseline and clears any destroy
    /// mark. Idempotent.
    ///
    /// Callers that physically excise destroyed objects must do so before
    /// committing the survivors; `Tracked` itself only resets tracking.
    pub fn commit(&mut self) {
        self.baseline = Some(self.current.clone());
        self.destroyed = false;
    }

    /// Reverts the current fields to the baseline and clears any destroy
    /// mark. Returns false for objects with no baseline, which cannot be
    /// rolled back and should be dropped by the caller instead.
    pub fn rollback(&mut self) -> bool {
        self.destroyed = false;
        match &self.baseline {
            Some(original) => {
                self.current = original.clone();
                true
            }
            None => false,
        }
    }
}
