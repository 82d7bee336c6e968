//! Ordering layer-producing stages.
//!
//! A processing stage declares the layers it needs and the layers it fills
//! in; an orchestrator turns those declarations into dependency edges and
//! asks the resolver for a safe run order. The stages themselves (taggers,
//! aligners, stemmers) live outside this crate and are invoked against
//! graphs through the ordinary mutation and query APIs.

use std::fmt;

use crate::schema::LayerId;

use super::dependency::{CircularDependency, DependencyGraph};

/// A stage's declaration: what it consumes and what it produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StageRegistration {
    pub name: String,
    /// Layers that must be populated before this stage runs.
    pub requires: Vec<LayerId>,
    /// Layers this stage populates.
    pub outputs: Vec<LayerId>,
}

impl StageRegistration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            requires: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn requires(mut self, layer_id: impl Into<LayerId>) -> Self {
        self.requires.push(layer_id.into());
        self
    }

    pub fn outputs(mut self, layer_id: impl Into<LayerId>) -> Self {
        self.outputs.push(layer_id.into());
        self
    }
}

impl fmt::Display for StageRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Orders stages so that every stage runs after the producers of the layers
/// it requires. Stage A depends on stage B exactly when A requires a layer B
/// outputs; layers nobody produces are assumed to pre-exist (e.g. the
/// transcript's own words) and impose no edge.
pub fn execution_order(
    stages: &[StageRegistration],
) -> Result<Vec<&StageRegistration>, CircularDependency> {
    let mut graph = DependencyGraph::new();
    let nodes: Vec<_> = stages.iter().map(|stage| graph.add(stage)).collect();

    for (i, stage) in stages.iter().enumerate() {
        for layer_id in &stage.requires {
            for (j, producer) in stages.iter().enumerate() {
                if i != j && producer.outputs.contains(layer_id) {
                    graph.depends_on(nodes[i], nodes[j]);
                }
            }
        }
    }

    // resolve() hands back &&StageRegistration; flatten one level
    Ok(graph.resolve()?.into_iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(order: Vec<&StageRegistration>) -> Vec<&str> {
        order.iter().map(|stage| stage.name.as_str()).collect()
    }

    #[test]
    fn test_chain_runs_bottom_up() {
        // A requires "x" (produced by B); B requires "y" (produced by C)
        let stages = vec![
            StageRegistration::new("A").requires("x"),
            StageRegistration::new("B").requires("y").outputs("x"),
            StageRegistration::new("C").outputs("y"),
        ];
        assert_eq!(names(execution_order(&stages).unwrap()), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_unproduced_layers_impose_no_edges() {
        let stages = vec![
            StageRegistration::new("stemmer").requires("orthography").outputs("stem"),
            StageRegistration::new("standardizer").requires("word").outputs("orthography"),
        ];
        // "word" pre-exists, so only the orthography edge orders the stages
        assert_eq!(
            names(execution_order(&stages).unwrap()),
            vec!["standardizer", "stemmer"]
        );
    }

    #[test]
    fn test_mutually_dependent_stages_fail() {
        let stages = vec![
            StageRegistration::new("A").requires("x").outputs("y"),
            StageRegistration::new("B").requires("y").outputs("x"),
        ];
        let err = execution_order(&stages).unwrap_err();
        assert_eq!(err.path.first(), err.path.last());
        assert!(err.path.iter().any(|name| name == "A"));
        assert!(err.path.iter().any(|name| name == "B"));
    }

    #[test]
    fn test_multiple_producers_all_precede() {
        // two taggers both contribute to "phonology"; the aligner needs it
        let stages = vec![
            StageRegistration::new("aligner").requires("phonology").outputs("segment"),
            StageRegistration::new("celex").requires("orthography").outputs("phonology"),
            StageRegistration::new("patterns").requires("orthography").outputs("phonology"),
            StageRegistration::new("standardizer").requires("word").outputs("orthography"),
        ];
        let order = names(execution_order(&stages).unwrap());
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        assert!(position("standardizer") < position("celex"));
        assert!(position("standardizer") < position("patterns"));
        assert!(position("celex") < position("aligner"));
        assert!(position("patterns") < position("aligner"));
    }
}
