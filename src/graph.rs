//! Parameter dependency graph.
use crate::arch::Architecture;
use crate::name::remove_suffix;
use std::collections::HashMap;

/// Directed graph whose nodes are parameter groups (i.e., parameter names without suffix).
///
/// Nodes keep their first-insertion order and the predecessors of each node keep
/// their edge-insertion order, so iterating over the graph is deterministic.
/// Adding an existing edge is a no-op. Self-loops are allowed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParameterGraph {
    nodes: Vec<String>,
    predecessors: HashMap<String, Vec<String>>,
    edges: Vec<(String, String)>,
}
impl ParameterGraph {
    /// Makes a new empty `ParameterGraph` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node if it does not exist yet.
    pub fn add_node(&mut self, node: &str) {
        if !self.predecessors.contains_key(node) {
            self.nodes.push(node.to_owned());
            self.predecessors.insert(node.to_owned(), Vec::new());
        }
    }

    /// Adds the edge `from -> to` (and its endpoints) if it does not exist yet.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        self.add_node(from);
        self.add_node(to);
        if let Some(preds) = self.predecessors.get_mut(to) {
            if !preds.iter().any(|p| p == from) {
                preds.push(from.to_owned());
                self.edges.push((from.to_owned(), to.to_owned()));
            }
        }
    }

    /// Returns the nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    /// Returns the edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(u, v)| (u.as_str(), v.as_str()))
    }

    /// Returns the predecessors of `node`, or `None` if the node is unknown.
    pub fn predecessors(&self, node: &str) -> Option<&[String]> {
        self.predecessors.get(node).map(Vec::as_slice)
    }

    /// Returns `true` if `node` exists in the graph.
    pub fn contains_node(&self, node: &str) -> bool {
        self.predecessors.contains_key(node)
    }

    /// Returns `true` if the edge `from -> to` exists in the graph.
    pub fn contains_edge(&self, from: &str, to: &str) -> bool {
        self.predecessors
            .get(to)
            .map_or(false, |preds| preds.iter().any(|p| p == from))
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Mapping from module names to their descriptors.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ModuleDescriptors(HashMap<String, String>);
impl ModuleDescriptors {
    /// Returns the descriptor of the module `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Returns the number of known modules.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no module is known.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Builds the parameter graph and module descriptors of `arch`.
///
/// Consecutive parameters are connected in declaration order, which assumes the
/// architecture has no skip connections.
pub fn build_graph<A: Architecture + ?Sized>(arch: &A) -> (ParameterGraph, ModuleDescriptors) {
    let params = arch.parameter_names();

    let mut graph = ParameterGraph::new();
    for p in &params {
        graph.add_node(remove_suffix(p));
    }
    for pair in params.windows(2) {
        graph.add_edge(remove_suffix(&pair[0]), remove_suffix(&pair[1]));
    }

    let descriptors = arch
        .named_modules()
        .into_iter()
        .map(|m| (m.name, m.descriptor))
        .collect();
    (graph, ModuleDescriptors(descriptors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::ArchSnapshot;

    #[test]
    fn build_graph_works() {
        let arch = ArchSnapshot::new()
            .module("", "Net")
            .module("layer1", "Linear(10,10)")
            .module("layer2", "Linear(10,10)")
            .parameter("layer1.weight")
            .parameter("layer1.bias")
            .parameter("layer2.weight");
        let (graph, descriptors) = build_graph(&arch);

        assert_eq!(graph.nodes().collect::<Vec<_>>(), ["layer1", "layer2"]);
        assert_eq!(
            graph.edges().collect::<Vec<_>>(),
            [("layer1", "layer1"), ("layer1", "layer2")]
        );
        assert_eq!(
            graph.predecessors("layer2"),
            Some(&["layer1".to_owned()][..])
        );
        assert!(graph.contains_edge("layer1", "layer1"));
        assert!(!graph.contains_edge("layer2", "layer1"));
        assert_eq!(graph.predecessors("layer3"), None);

        assert_eq!(descriptors.len(), 3);
        assert_eq!(descriptors.get("layer1"), Some("Linear(10,10)"));
        assert_eq!(descriptors.get(""), Some("Net"));
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut graph = ParameterGraph::new();
        graph.add_edge("a", "b");
        graph.add_edge("a", "b");
        graph.add_edge("c", "b");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.predecessors("b").unwrap(),
            &["a".to_owned(), "c".to_owned()][..]
        );
    }

    #[test]
    fn single_and_empty_parameter_lists() {
        let (graph, _) = build_graph(&ArchSnapshot::new().parameter("emb.weight"));
        assert_eq!(graph.nodes().collect::<Vec<_>>(), ["emb"]);
        assert_eq!(graph.edge_count(), 0);

        let (graph, descriptors) = build_graph(&ArchSnapshot::new());
        assert!(graph.is_empty());
        assert!(descriptors.is_empty());
    }
}
