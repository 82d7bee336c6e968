//! Dependency-ordered scheduling of processing stages.

mod dependency;
mod stages;

pub use dependency::{CircularDependency, DependencyGraph, NodeId};
pub use stages::{execution_order, StageRegistration};
