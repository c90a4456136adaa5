use std::collections::BTreeMap;

use flotilla_graph::{Graph, node_id};
use flotilla_topology::AppDefinition;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("app `{app}` has `{relation}` on `{target}`, which is not defined")]
    #[diagnostic(code(compile::unknown_dependency_target))]
    UnknownTarget {
        app: String,
        target: String,
        relation: &'static str,
    },

    #[error(
        "ambiguous shard ratio: app `{app}` has {app_shards} shards \
         but depends on `{target}`, which has {target_shards}"
    )]
    #[diagnostic(
        code(compile::ambiguous_shard_ratio),
        help("use `depends_on_all_of` for fan-in dependencies")
    )]
    AmbiguousRatio {
        app: String,
        target: String,
        app_shards: u32,
        target_shards: u32,
    },
}

/// Turn app-level dependency declarations into node-level edges.
///
/// Pairwise `depends_on` supports two shard ratios: every shard may depend
/// on a singleton target (N:1), or shard `i` on the target's shard `i` when
/// the counts match (1:1). Any other ratio is ambiguous and rejected.
/// `depends_on_all_of` links every shard to every target shard.
pub(crate) fn link(
    graph: &mut Graph,
    apps: &BTreeMap<String, AppDefinition>,
    shard_counts: &BTreeMap<String, u32>,
) -> Result<(), Error> {
    for (app, definition) in apps {
        let app_shards = shard_counts[app.as_str()];

        for target in &definition.depends_on {
            let Some(&target_shards) = shard_counts.get(target) else {
                return Err(Error::UnknownTarget {
                    app: app.clone(),
                    target: target.clone(),
                    relation: "depends_on",
                });
            };
            if target_shards != 1 && target_shards != app_shards {
                return Err(Error::AmbiguousRatio {
                    app: app.clone(),
                    target: target.clone(),
                    app_shards,
                    target_shards,
                });
            }

            for shard in 0..app_shards as usize {
                let target_shard = if target_shards == 1 { 0 } else { shard };
                push_edge(
                    graph,
                    &node_id(app, shard, app_shards),
                    node_id(target, target_shard, target_shards),
                );
            }
        }

        for target in &definition.depends_on_all_of {
            let Some(&target_shards) = shard_counts.get(target) else {
                return Err(Error::UnknownTarget {
                    app: app.clone(),
                    target: target.clone(),
                    relation: "depends_on_all_of",
                });
            };

            for shard in 0..app_shards as usize {
                let id = node_id(app, shard, app_shards);
                for target_shard in 0..target_shards as usize {
                    push_edge(graph, &id, node_id(target, target_shard, target_shards));
                }
            }
        }
    }

    graph.finalize_edges();
    Ok(())
}

fn push_edge(graph: &mut Graph, from: &str, to: String) {
    graph
        .node_mut(from)
        .expect("every linked app was materialized")
        .depends_on
        .push(to);
}
