//! Store synchronization boundary.
//!
//! A persistent store replays the change list captured just before
//! `Graph::commit()` against durable storage. The storage format and the
//! query-expression language both belong to the store; expressions cross
//! this boundary as opaque strings which this crate never parses.

use crate::graph::Graph;
use crate::track::ChangeRecord;

/// A filter expression understood only by the store.
pub type QueryExpression = str;

/// Contract between a graph and a persistent store.
///
/// Implementations live outside this crate (SQL stores, HTTP stores); the
/// core only promises that `changes` is complete and mutually exclusive per
/// object.
pub trait GraphStore {
    type Error;

    /// Replays one graph's pending changes. Callers capture the list with
    /// `Graph::changes()` and call `Graph::commit()` only after the store
    /// accepts it.
    fn apply(&mut self, graph: &Graph, changes: &[ChangeRecord]) -> Result<(), Self::Error>;

    /// Ids of stored graphs matching an opaque expression.
    fn matching_graphs(&self, expression: &QueryExpression) -> Result<Vec<String>, Self::Error>;
}
