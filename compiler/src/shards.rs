use std::collections::BTreeMap;

use flotilla_topology::AppDefinition;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("shard count declared for unknown app `{app}`")]
    #[diagnostic(code(compile::shards_unknown_app))]
    UnknownApp { app: String },

    #[error("app `{app}` declares shard count {count}; counts must be at least 1")]
    #[diagnostic(code(compile::invalid_shard_count))]
    InvalidCount { app: String, count: u32 },

    #[error(
        "co-location group `{group}` has conflicting shard counts: \
         {expected} and {found} (via `{app}`)"
    )]
    #[diagnostic(
        code(compile::conflicting_shard_counts),
        help("apps that share a host must shard together")
    )]
    ConflictingCounts {
        group: String,
        expected: u32,
        found: u32,
        app: String,
    },
}

/// Resolve an effective shard count for every app.
///
/// Apps in the same co-location group shard in lockstep: a count declared
/// for any member applies to all of them, two different declared counts in
/// one group are a conflict, and a group with no declaration defaults to 1.
pub(crate) fn infer(
    declared: &BTreeMap<String, u32>,
    apps: &BTreeMap<String, AppDefinition>,
    groups: &BTreeMap<String, Vec<String>>,
) -> Result<BTreeMap<String, u32>, Error> {
    for (app, &count) in declared {
        if !apps.contains_key(app) {
            return Err(Error::UnknownApp { app: app.clone() });
        }
        if count == 0 {
            return Err(Error::InvalidCount {
                app: app.clone(),
                count,
            });
        }
    }

    let mut counts = BTreeMap::new();
    for (root, members) in groups {
        let mut adopted: Option<u32> = None;
        for member in members {
            if let Some(&count) = declared.get(member) {
                match adopted {
                    None => adopted = Some(count),
                    Some(expected) if expected != count => {
                        return Err(Error::ConflictingCounts {
                            group: root.clone(),
                            expected,
                            found: count,
                            app: member.clone(),
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        let count = adopted.unwrap_or(1);
        for member in members {
            counts.insert(member.clone(), count);
        }
    }
    Ok(counts)
}
