use std::collections::BTreeMap;

use flotilla_graph::{Graph, Node, node_id};
use flotilla_topology::AppDefinition;

/// Mint one node per shard of every app.
///
/// A host group ID is assigned only when the app's co-location group has
/// more than one member; shard `i` of every member carries the same group
/// ID, derived from the group root with the same suffix scheme as node IDs.
pub(crate) fn materialize(
    apps: &BTreeMap<String, AppDefinition>,
    groups: &BTreeMap<String, Vec<String>>,
    shard_counts: &BTreeMap<String, u32>,
) -> Graph {
    let mut roots: BTreeMap<&str, &str> = BTreeMap::new();
    for (root, members) in groups {
        for member in members {
            roots.insert(member, root);
        }
    }

    let mut graph = Graph::new();
    for app in apps.keys() {
        let count = shard_counts[app.as_str()];
        let root = roots[app.as_str()];
        let grouped = groups[root].len() > 1;

        for shard in 0..count as usize {
            let host_group = grouped.then(|| node_id(&format!("hostgroup-{root}"), shard, count));
            graph.insert(Node {
                id: node_id(app, shard, count),
                base_app: app.clone(),
                shard,
                host_group,
                depends_on: Vec::new(),
            });
        }
    }
    graph
}
