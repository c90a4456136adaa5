#[cfg(test)]
mod tests;

pub mod backend;
mod colocate;
mod expand;
mod link;
mod materialize;
mod shards;

use flotilla_graph::Graph;
use flotilla_topology::RawTopology;

pub use colocate::Error as ColocateError;
pub use expand::Error as ExpandError;
pub use link::Error as LinkError;
pub use shards::Error as ShardsError;

#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Topology(#[from] flotilla_topology::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Expand(#[from] expand::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Colocate(#[from] colocate::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Shards(#[from] shards::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Link(#[from] link::Error),

    #[error(transparent)]
    #[diagnostic(code(compile::dependency_cycle))]
    Cycle(#[from] flotilla_graph::CycleError),
}

/// Compile a topology document into a fully linked, validated graph.
///
/// A pure, single-shot transformation: the same document always yields the
/// same node IDs, edges, and derived orderings.
pub fn compile(source: &str) -> Result<Graph, Error> {
    let topology: RawTopology = source.parse()?;
    compile_topology(topology)
}

/// Compile an already-decoded topology. Every stage trusts the previous
/// stage's checks; the cycle check is last because it needs the fully
/// linked graph.
pub fn compile_topology(topology: RawTopology) -> Result<Graph, Error> {
    let apps = expand::expand(&topology)?;
    tracing::debug!(apps = apps.len(), "expanded blueprints");

    let groups = colocate::group(&apps)?;
    tracing::debug!(groups = groups.len(), "resolved co-location groups");

    let shard_counts = shards::infer(&topology.shards, &apps, &groups)?;
    let mut graph = materialize::materialize(&apps, &groups, &shard_counts);
    tracing::debug!(nodes = graph.len(), "materialized nodes");

    link::link(&mut graph, &apps, &shard_counts)?;
    graph.find_cycle()?;
    Ok(graph)
}
