//! Change tracking primitives.
//!
//! Everything that makes incremental store synchronization safe lives here:
//! the ordered `Confidence` write gate, the `Tracked` baseline-vs-current
//! field store, and the `ChangeOp`/`ChangeRecord` vocabulary a persistent
//! store replays.

mod change;
mod confidence;
mod tracked;

pub use change::{ChangeOp, ChangeRecord, ChangeTarget};
pub use confidence::Confidence;
pub use tracked::Tracked;
