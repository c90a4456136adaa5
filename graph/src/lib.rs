pub mod cycle;
pub mod layers;
pub mod view;

use std::collections::BTreeMap;

pub use cycle::CycleError;
pub use view::UnknownNode;

/// One concrete shard instance of a logical app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: String,

    /// The logical app name this shard was materialized from.
    pub base_app: String,

    /// Zero-based shard index.
    pub shard: usize,

    /// Set only when the node's co-location group has more than one member.
    pub host_group: Option<String>,

    /// Dependency edges, as node IDs into the owning graph. A node never
    /// owns the nodes it depends on.
    pub depends_on: Vec<String>,
}

/// Arena of materialized nodes, keyed by node ID. The graph is the sole
/// owner of node lifetime; edges are ID keys, so cycles in the logical
/// dependency relation cannot create cycles in the storage.
///
/// The key map is a `BTreeMap` on purpose: node IDs, layer contents, and
/// rendered output are part of the reproducibility contract, so every
/// iteration that can reach output must already be sorted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: BTreeMap<String, Node>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in lexicographic ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Node IDs in lexicographic order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Sort and dedup every dependency list. Called once when linking
    /// finishes; all derivations assume it has run.
    pub fn finalize_edges(&mut self) {
        for node in self.nodes.values_mut() {
            node.depends_on.sort_unstable();
            node.depends_on.dedup();
        }
    }
}

/// Node ID scheme: the bare app name for singletons, `app-NN` (zero-padded,
/// two digits minimum) otherwise.
pub fn node_id(app: &str, shard: usize, shard_count: u32) -> String {
    if shard_count == 1 {
        app.to_string()
    } else {
        format!("{app}-{shard:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_singleton_has_no_suffix() {
        assert_eq!(node_id("sor", 0, 1), "sor");
    }

    #[test]
    fn node_id_sharded_is_zero_padded() {
        assert_eq!(node_id("sor", 0, 3), "sor-00");
        assert_eq!(node_id("sor", 2, 3), "sor-02");
        assert_eq!(node_id("sor", 11, 12), "sor-11");
    }

    #[test]
    fn finalize_edges_sorts_and_dedups() {
        let mut graph = Graph::new();
        graph.insert(Node {
            id: "a".to_string(),
            base_app: "a".to_string(),
            shard: 0,
            host_group: None,
            depends_on: vec!["c".to_string(), "b".to_string(), "c".to_string()],
        });

        graph.finalize_edges();
        assert_eq!(graph.node("a").unwrap().depends_on, ["b", "c"]);
    }
}
