//! Dependency graph management using `petgraph`.
//!
//! Builds a directed acyclic graph from the references between declared
//! resources and resolves the topological order an engine applies them in.

use std::collections::HashMap;

use petgraph::graph::NodeIndex;
use relaystack_common::error::{RelayError, Result};

use crate::engine::LogicalId;

/// A dependency graph of declared resources.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<LogicalId, ()>,
    /// Node lookup by logical id.
    nodes: HashMap<LogicalId, NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource node, or returns the existing node for `id`.
    pub fn add_resource(&mut self, id: &LogicalId) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(id.clone());
        let _ = self.nodes.insert(id.clone(), idx);
        idx
    }

    /// Returns the node for `id`, if it was added.
    #[must_use]
    pub fn node(&self, id: &LogicalId) -> Option<NodeIndex> {
        self.nodes.get(id).copied()
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Logical ids `id` directly depends on, sorted.
    #[must_use]
    pub fn dependencies_of(&self, id: &LogicalId) -> Vec<LogicalId> {
        let Some(idx) = self.node(id) else {
            return Vec::new();
        };
        let mut deps: Vec<LogicalId> = self
            .graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        deps.sort();
        deps
    }

    /// Number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Whether the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns a topological ordering of resources for apply.
    ///
    /// Dependencies appear before the resources that depend on them.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<LogicalId>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(RelayError::declaration(format!(
                "cyclic dependency detected in resource graph at {}",
                self.graph[cycle.node_id()]
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> LogicalId {
        LogicalId::new(name).expect("valid id")
    }

    fn names(order: &[LogicalId]) -> Vec<&str> {
        order.iter().map(LogicalId::as_str).collect()
    }

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = DependencyGraph::new();
        let order = graph.resolve_order().expect("should resolve");
        assert!(order.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn adding_twice_reuses_the_node() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_resource(&id("Vpc"));
        let b = graph.add_resource(&id("Vpc"));
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn linear_dependency_chain() {
        let mut graph = DependencyGraph::new();
        let instance = graph.add_resource(&id("Instance"));
        let subnet = graph.add_resource(&id("Subnet"));
        let vpc = graph.add_resource(&id("Vpc"));
        graph.add_dependency(instance, subnet);
        graph.add_dependency(subnet, vpc);

        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(names(&order), vec!["Vpc", "Subnet", "Instance"]);
    }

    #[test]
    fn diamond_dependency() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_resource(&id("a"));
        let b = graph.add_resource(&id("b"));
        let c = graph.add_resource(&id("c"));
        let d = graph.add_resource(&id("d"));
        graph.add_dependency(a, b);
        graph.add_dependency(a, c);
        graph.add_dependency(b, d);
        graph.add_dependency(c, d);

        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order.len(), 4);
        let pos = |name: &str| order.iter().position(|n| n.as_str() == name).expect(name);
        assert!(pos("d") < pos("b"));
        assert!(pos("d") < pos("c"));
        assert!(pos("b") < pos("a"));
        assert!(pos("c") < pos("a"));
    }

    #[test]
    fn repeated_edges_are_collapsed() {
        let mut graph = DependencyGraph::new();
        let sg = graph.add_resource(&id("Sg"));
        let vpc = graph.add_resource(&id("Vpc"));
        graph.add_dependency(sg, vpc);
        graph.add_dependency(sg, vpc);
        assert_eq!(graph.dependencies_of(&id("Sg")), vec![id("Vpc")]);
        assert!(graph.dependencies_of(&id("Vpc")).is_empty());
        assert!(graph.dependencies_of(&id("Unknown")).is_empty());
    }

    #[test]
    fn cycle_detection() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_resource(&id("a"));
        let b = graph.add_resource(&id("b"));
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);

        let result = graph.resolve_order();
        assert!(result.is_err());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
    }
}
