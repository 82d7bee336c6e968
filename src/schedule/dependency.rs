//! Generic dependency resolution.
//!
//! A `DependencyGraph` wraps opaque providers and answers one question: in
//! what order can they run so that every provider's dependencies precede it?
//! Resolution is deterministic, with ties between unrelated nodes falling
//! back to insertion order, and pure: resolving never mutates the graph, so one
//! graph may be resolved from several threads at once.

use std::fmt;

use thiserror::Error;

/// Handle of a node within one `DependencyGraph`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

/// A dependency cycle, fatal to resolution.
///
/// `node` is the node at which the cycle was detected; `path` is the full
/// cycle membership, first node repeated at the end (`b -> c -> d -> b`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("circular dependency detected at `{node}`: {}", .path.join(" -> "))]
pub struct CircularDependency {
    pub node: String,
    pub path: Vec<String>,
}

struct Node<P> {
    provider: P,
    /// Insertion-ordered, deduplicated dependency edges.
    depends_on: Vec<NodeId>,
}

/// A set of providers with dependency edges between them.
pub struct DependencyGraph<P> {
    nodes: Vec<Node<P>>,
}

impl<P> Default for DependencyGraph<P> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Unvisited,
    InProgress,
    Resolved,
}

impl<P> DependencyGraph<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider and returns its node handle.
    pub fn add(&mut self, provider: P) -> NodeId {
        self.nodes.push(Node {
            provider,
            depends_on: Vec::new(),
        });
        NodeId(self.nodes.len() - 1)
    }

    /// Declares that `dependent` must run after `dependency`.
    /// Duplicate and self edges are ignored.
    pub fn depends_on(&mut self, dependent: NodeId, dependency: NodeId) {
        if dependent == dependency {
            return;
        }
        let edges = &mut self.nodes[dependent.0].depends_on;
        if !edges.contains(&dependency) {
            edges.push(dependency);
        }
    }

    pub fn provider(&self, node: NodeId) -> &P {
        &self.nodes[node.0].provider
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<P: fmt::Display> DependencyGraph<P> {
    /// Depth-first topological resolution over every node, so disconnected
    /// components are all covered.
    ///
    /// Returns the providers in an order where every node's dependencies
    /// precede it; nodes with no mutual constraint keep their insertion
    /// order. Each node moves unvisited -> in-progress -> resolved and never
    /// leaves resolved; an edge into an in-progress node is a cycle.
    pub fn resolve(&self) -> Result<Vec<&P>, CircularDependency> {
        let mut states = vec![State::Unvisited; self.nodes.len()];
        let mut resolved = Vec::with_capacity(self.nodes.len());
        let mut path = Vec::new();

        for i in 0..self.nodes.len() {
            if states[i] == State::Unvisited {
                self.visit(NodeId(i), &mut states, &mut path, &mut resolved)?;
            }
        }
        Ok(resolved.into_iter().map(|NodeId(i)| &self.nodes[i].provider).collect())
    }

    fn visit(
        &self,
        node: NodeId,
        states: &mut [State],
        path: &mut Vec<NodeId>,
        resolved: &mut Vec<NodeId>,
    ) -> Result<(), CircularDependency> {
        states[node.0] = State::InProgress;
        path.push(node);
        for &dep in &self.nodes[node.0].depends_on {
            match states[dep.0] {
                State::Resolved => {}
                State::InProgress => return Err(self.cycle_at(node, dep, path)),
                State::Unvisited => self.visit(dep, states, path, resolved)?,
            }
        }
        path.pop();
        states[node.0] = State::Resolved;
        resolved.push(node);
        Ok(())
    }

    /// The cycle was detected at `node`, whose edge points back to `target`
    /// somewhere on the active path.
    fn cycle_at(&self, node: NodeId, target: NodeId, path: &[NodeId]) -> CircularDependency {
        let start = path.iter().position(|&n| n == target).unwrap_or(0);
        let mut names: Vec<String> = path[start..]
            .iter()
            .map(|&NodeId(i)| self.nodes[i].provider.to_string())
            .collect();
        names.push(self.nodes[target.0].provider.to_string());
        CircularDependency {
            node: self.nodes[node.0].provider.to_string(),
            path: names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(providers: Vec<&&str>) -> String {
        providers
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_basic_resolution() {
        let mut graph = DependencyGraph::new();
        let a = graph.add("a");
        let b = graph.add("b");
        let c = graph.add("c");
        let d = graph.add("d");
        let e = graph.add("e");

        graph.depends_on(a, b);
        graph.depends_on(a, d);
        graph.depends_on(b, c);
        graph.depends_on(b, e);
        graph.depends_on(c, d);
        graph.depends_on(c, e);

        assert_eq!(joined(graph.resolve().unwrap()), "d e c b a");
    }

    #[test]
    fn test_dependencies_always_precede_dependents() {
        let mut graph = DependencyGraph::new();
        let nodes: Vec<NodeId> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|name| graph.add(*name))
            .collect();
        graph.depends_on(nodes[0], nodes[3]);
        graph.depends_on(nodes[1], nodes[0]);
        graph.depends_on(nodes[4], nodes[1]);

        let order = graph.resolve().unwrap();
        let position = |name: &str| order.iter().position(|p| **p == name).unwrap();
        assert!(position("d") < position("a"));
        assert!(position("a") < position("b"));
        assert!(position("b") < position("e"));
        assert_eq!(order.len(), 5);
    }

    #[test]
    fn test_indirect_cycle_detected() {
        let mut graph = DependencyGraph::new();
        let a = graph.add("a");
        let b = graph.add("b");
        let c = graph.add("c");
        let d = graph.add("d");
        let e = graph.add("e");

        graph.depends_on(a, b);
        graph.depends_on(a, d);
        graph.depends_on(b, c);
        graph.depends_on(b, e);
        graph.depends_on(c, d);
        graph.depends_on(c, e);
        // closes b -> c -> d -> b
        graph.depends_on(d, b);

        let err = graph.resolve().unwrap_err();
        assert_eq!(err.node, "d");
        assert_eq!(err.path, vec!["b", "c", "d", "b"]);
    }

    #[test]
    fn test_direct_cycle_detected() {
        let mut graph = DependencyGraph::new();
        let a = graph.add("a");
        let b = graph.add("b");
        graph.depends_on(a, b);
        graph.depends_on(b, a);

        let err = graph.resolve().unwrap_err();
        assert_eq!(err.path.first(), err.path.last());
    }

    #[test]
    fn test_disconnected_components_all_resolved() {
        let mut graph = DependencyGraph::new();
        let a = graph.add("a");
        let b = graph.add("b");
        let c = graph.add("c");
        let d = graph.add("d");
        let e = graph.add("e");
        let aa = graph.add("aa");
        let bb = graph.add("bb");
        let cc = graph.add("cc");
        let dd = graph.add("dd");
        let ee = graph.add("ee");
        let _aaa = graph.add("aaa");

        graph.depends_on(a, b);
        graph.depends_on(a, d);
        graph.depends_on(b, c);
        graph.depends_on(b, e);
        graph.depends_on(c, d);
        graph.depends_on(c, e);

        graph.depends_on(aa, bb);
        graph.depends_on(aa, dd);
        graph.depends_on(bb, cc);
        graph.depends_on(bb, ee);
        graph.depends_on(cc, dd);
        graph.depends_on(cc, ee);

        assert_eq!(
            joined(graph.resolve().unwrap()),
            "d e c b a dd ee cc bb aa aaa"
        );
    }

    #[test]
    fn test_resolution_does_not_mutate() {
        let mut graph = DependencyGraph::new();
        let a = graph.add("a");
        let b = graph.add("b");
        graph.depends_on(a, b);

        let first = joined(graph.resolve().unwrap());
        let second = joined(graph.resolve().unwrap());
        assert_eq!(first, second);
    }
}
