use crate::{Graph, Node};

#[derive(Clone, Debug, thiserror::Error)]
#[error("node `{0}` not found in the graph")]
pub struct UnknownNode(pub String);

impl Graph {
    /// The subgraph that must be restarted together with `target`: every
    /// node sharing the target's host group (co-located shards restart as a
    /// unit), plus the transitive dependency closure of all of them.
    pub fn subgraph_for(&self, target: &str) -> Result<Graph, UnknownNode> {
        let start = self
            .node(target)
            .ok_or_else(|| UnknownNode(target.to_string()))?;

        let mut pending: Vec<&Node> = match &start.host_group {
            Some(group) => self
                .iter()
                .filter(|node| node.host_group.as_ref() == Some(group))
                .collect(),
            None => vec![start],
        };

        let mut subgraph = Graph::new();
        while let Some(node) = pending.pop() {
            if subgraph.contains(&node.id) {
                continue;
            }
            subgraph.insert(node.clone());
            for dep in &node.depends_on {
                pending.push(self.node(dep).expect("edges were validated at link time"));
            }
        }
        Ok(subgraph)
    }

    /// Collapse the concrete graph to one node per distinct base app,
    /// ignoring shard index and host grouping. A logical edge exists when
    /// any shard of the source depends on any shard of the target;
    /// self-edges and duplicates are suppressed.
    pub fn logical_view(&self) -> Graph {
        let mut logical = Graph::new();
        for node in self.iter() {
            if !logical.contains(&node.base_app) {
                logical.insert(Node {
                    id: node.base_app.clone(),
                    base_app: node.base_app.clone(),
                    shard: 0,
                    host_group: None,
                    depends_on: Vec::new(),
                });
            }
        }

        for node in self.iter() {
            for dep in &node.depends_on {
                let dep_app = &self
                    .node(dep)
                    .expect("edges were validated at link time")
                    .base_app;
                if dep_app == &node.base_app {
                    continue;
                }
                let entry = logical
                    .node_mut(&node.base_app)
                    .expect("logical node was inserted above");
                if !entry.depends_on.contains(dep_app) {
                    entry.depends_on.push(dep_app.clone());
                }
            }
        }

        logical.finalize_edges();
        logical
    }
}
