//! Converter boundary.
//!
//! Concrete transcript formats live outside this crate. A converter builds a
//! graph through the mutation API and reads one back through the query API;
//! it never reaches into tracked state. The contract here is deliberately
//! format-free: payloads are opaque strings and this crate defines no file
//! grammar.

use thiserror::Error;

use crate::graph::Graph;
use crate::schema::Schema;

/// Everything wrong with one input, reported together.
///
/// A converter collects granular issues across the whole input rather than
/// aborting at the first, so the operator sees the fullest possible picture.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("conversion failed with {} issue(s): {}", .issues.len(), .issues.join("; "))]
pub struct ConversionError {
    pub issues: Vec<String>,
}

impl ConversionError {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    pub fn push(&mut self, issue: impl Into<String>) {
        self.issues.push(issue.into());
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// `Ok(value)` when no issues accumulated, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, ConversionError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl Default for ConversionError {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a graph from an external representation.
pub trait GraphDeserializer {
    /// A short name for the format, for operator-facing messages.
    fn format_name(&self) -> &str;

    /// Builds a graph over `schema` from one opaque input payload.
    ///
    /// Best effort: recoverable problems should be worked around and
    /// reported through the graph's validation pass, not here.
    fn deserialize(&self, schema: &Schema, payload: &str) -> Result<Graph, ConversionError>;
}

/// Renders a graph into an external representation.
pub trait GraphSerializer {
    fn format_name(&self) -> &str;

    /// Reads the graph through the query API only.
    fn serialize(&self, graph: &Graph) -> Result<String, ConversionError>;
}
