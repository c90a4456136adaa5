use std::collections::HashMap;

use crate::Graph;

#[derive(Clone, Debug, thiserror::Error)]
#[error("dependency cycle detected: {}", path.join(" -> "))]
pub struct CycleError {
    /// The cycle in dependency order, with the first node repeated at the
    /// end: `a -> b -> c -> a` means a depends on b, b on c, c on a.
    pub path: Vec<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    InPath,
    Done,
}

impl Graph {
    /// Verify the edge set is acyclic. Roots are visited in lexicographic
    /// order and dependency lists are already sorted, so the reported path
    /// is stable across runs.
    pub fn find_cycle(&self) -> Result<(), CycleError> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.len());
        let mut stack: Vec<&str> = Vec::new();

        for id in self.ids() {
            if marks.contains_key(id) {
                continue;
            }
            if let Some(path) = self.dfs(id, &mut marks, &mut stack) {
                return Err(CycleError { path });
            }
        }
        Ok(())
    }

    fn dfs<'a>(
        &'a self,
        id: &'a str,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<Vec<String>> {
        marks.insert(id, Mark::InPath);
        stack.push(id);

        let node = self.node(id).expect("graph edges point at owned nodes");
        for dep in &node.depends_on {
            match marks.get(dep.as_str()) {
                Some(Mark::InPath) => {
                    let start = stack
                        .iter()
                        .position(|&n| n == dep.as_str())
                        .expect("in-path node is on the stack");
                    let mut path: Vec<String> =
                        stack[start..].iter().map(|n| n.to_string()).collect();
                    path.push(dep.clone());
                    return Some(path);
                }
                Some(Mark::Done) => {}
                None => {
                    if let Some(path) = self.dfs(dep, marks, stack) {
                        return Some(path);
                    }
                }
            }
        }

        stack.pop();
        marks.insert(id, Mark::Done);
        None
    }
}
