use std::collections::BTreeMap;

use flotilla_topology::AppDefinition;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("app `{app}` declares `same_host_as: {target}`, but `{target}` is not defined")]
    #[diagnostic(code(compile::unknown_colocation_target))]
    UnknownTarget { app: String, target: String },
}

/// Partition apps into co-location groups with union-find over app names.
///
/// The representative of each group is its lexicographically smallest
/// member, so group identity does not depend on declaration order. Every
/// app lands in exactly one group; an app with no `same_host_as` edges
/// forms a singleton.
pub(crate) fn group(
    apps: &BTreeMap<String, AppDefinition>,
) -> Result<BTreeMap<String, Vec<String>>, Error> {
    let mut parent: BTreeMap<String, String> = apps
        .keys()
        .map(|name| (name.clone(), name.clone()))
        .collect();

    for (app, definition) in apps {
        for target in &definition.same_host_as {
            if !apps.contains_key(target) {
                return Err(Error::UnknownTarget {
                    app: app.clone(),
                    target: target.clone(),
                });
            }
            union(&mut parent, app, target);
        }
    }

    // Keys iterate sorted, so member lists come out sorted too.
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for app in apps.keys() {
        let root = find(&mut parent, app);
        groups.entry(root).or_default().push(app.clone());
    }
    Ok(groups)
}

fn find(parent: &mut BTreeMap<String, String>, name: &str) -> String {
    let mut root = name.to_string();
    while parent[&root] != root {
        root = parent[&root].clone();
    }

    // Second pass: point everything on the walked chain at the root.
    let mut cursor = name.to_string();
    while cursor != root {
        let next = parent[&cursor].clone();
        parent.insert(cursor, root.clone());
        cursor = next;
    }
    root
}

fn union(parent: &mut BTreeMap<String, String>, a: &str, b: &str) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a == root_b {
        return;
    }
    if root_a < root_b {
        parent.insert(root_b, root_a);
    } else {
        parent.insert(root_a, root_b);
    }
}
