use std::collections::BTreeMap;

use crate::Graph;

impl Graph {
    /// Layered topological order (Kahn's algorithm). Every node in a layer
    /// depends only on nodes in earlier layers, so the members of one layer
    /// may be started concurrently. Layers are sorted lexicographically.
    pub fn startup_order(&self) -> Vec<Vec<String>> {
        let mut indegree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

        for node in self.iter() {
            indegree.insert(&node.id, node.depends_on.len());
            for dep in &node.depends_on {
                dependents.entry(dep).or_default().push(&node.id);
            }
        }

        let mut frontier: Vec<&str> = indegree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::new();
        while !frontier.is_empty() {
            frontier.sort_unstable();
            order.push(frontier.iter().map(|id| id.to_string()).collect());

            let mut next = Vec::new();
            for id in frontier {
                for &dependent in dependents.get(id).into_iter().flatten() {
                    let degree = indegree
                        .get_mut(dependent)
                        .expect("dependent is an owned node");
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(dependent);
                    }
                }
            }
            frontier = next;
        }
        order
    }

    /// The startup layering reversed end to end. Order within a layer is
    /// preserved: both directions enumerate the same concurrency sets.
    pub fn shutdown_order(&self) -> Vec<Vec<String>> {
        let mut order = self.startup_order();
        order.reverse();
        order
    }
}
