use std::{collections::BTreeMap, fmt::Write as _};

use flotilla_graph::Graph;

use super::{Backend, BackendError};

#[derive(Clone, Copy, Debug, Default)]
pub struct DotOptions {
    /// Group co-located nodes into visual clusters.
    pub cluster_host_groups: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DotBackend {
    pub options: DotOptions,
}

impl Backend for DotBackend {
    type Artifact = String;

    fn emit(&self, graph: &Graph) -> Result<Self::Artifact, BackendError> {
        render_dot(graph, self.options)
    }
}

/// Render the graph as a Graphviz DOT diagram. Node and cluster keys are
/// emitted in sorted order, so output is byte-stable across runs.
pub fn render_dot(graph: &Graph, opts: DotOptions) -> Result<String, BackendError> {
    let mut out = String::new();
    writeln!(out, "digraph topology {{")?;
    writeln!(out, "  compound=true;")?;
    writeln!(out, "  rankdir=TB;")?;
    writeln!(out, "  node [shape=box, style=rounded];")?;
    writeln!(out)?;

    let mut clusters: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for node in graph.iter() {
        match &node.host_group {
            Some(group) if opts.cluster_host_groups => {
                clusters.entry(group).or_default().push(&node.id);
            }
            _ => writeln!(out, "  \"{}\";", node.id)?,
        }
    }

    for (group, members) in &clusters {
        writeln!(out, "  subgraph \"cluster_{group}\" {{")?;
        writeln!(out, "    label = \"{group}\";")?;
        writeln!(out, "    style = filled;")?;
        writeln!(out, "    color = lightgrey;")?;
        for id in members {
            writeln!(out, "    \"{id}\";")?;
        }
        writeln!(out, "  }}")?;
    }

    writeln!(out)?;
    for node in graph.iter() {
        for dep in &node.depends_on {
            writeln!(out, "  \"{}\" -> \"{dep}\";", node.id)?;
        }
    }

    writeln!(out, "}}")?;
    Ok(out)
}
