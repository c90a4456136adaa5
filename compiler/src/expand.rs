use std::collections::BTreeMap;

use flotilla_topology::{AppDefinition, RawTopology};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("app `{app}` uses undefined blueprint `{blueprint}`")]
    #[diagnostic(code(compile::undefined_blueprint))]
    UndefinedBlueprint { blueprint: String, app: String },

    #[error("blueprint `{blueprint}` would synthesize app `{name}`, which is already defined")]
    #[diagnostic(code(compile::name_collision))]
    NameCollision { name: String, blueprint: String },

    #[error(
        "blueprint `{blueprint}` needs external dependency `{placeholder}`, \
         which app `{app}` does not bind"
    )]
    #[diagnostic(
        code(compile::unresolved_external),
        help("add `{placeholder}: <app>` to the instance's `with` map")
    )]
    UnresolvedExternal {
        placeholder: String,
        blueprint: String,
        app: String,
    },

    #[error("app `{app}` in blueprint `{blueprint}` depends on `{dependency}`, which the blueprint does not define")]
    #[diagnostic(code(compile::undefined_internal))]
    UndefinedInternal {
        dependency: String,
        app: String,
        blueprint: String,
    },
}

/// Flatten every blueprint instantiation into ordinary app definitions.
///
/// Each app a blueprint defines becomes a `<parent>-<app>` entry co-located
/// with its parent. Internal dependencies are re-joined under the parent
/// prefix; external placeholders resolve through the instance's `with` map.
pub(crate) fn expand(topology: &RawTopology) -> Result<BTreeMap<String, AppDefinition>, Error> {
    let mut apps = topology.apps.clone();

    for (parent, definition) in &topology.apps {
        for instance in &definition.uses {
            let blueprint = topology.blueprints.get(&instance.blueprint).ok_or_else(|| {
                Error::UndefinedBlueprint {
                    blueprint: instance.blueprint.clone(),
                    app: parent.clone(),
                }
            })?;

            if instance.depends_on {
                let entry = apps
                    .get_mut(parent)
                    .expect("parent app was cloned from the document");
                for name in blueprint.apps.keys() {
                    entry.depends_on.push(format!("{parent}-{name}"));
                }
            }

            for (bp_app, template) in &blueprint.apps {
                let name = format!("{parent}-{bp_app}");
                if apps.contains_key(&name) {
                    return Err(Error::NameCollision {
                        name,
                        blueprint: instance.blueprint.clone(),
                    });
                }

                let mut synthesized = AppDefinition {
                    same_host_as: vec![parent.clone()].into(),
                    ..Default::default()
                };

                for dependency in &template.depends_on {
                    if !blueprint.apps.contains_key(dependency) {
                        return Err(Error::UndefinedInternal {
                            dependency: dependency.clone(),
                            app: bp_app.clone(),
                            blueprint: instance.blueprint.clone(),
                        });
                    }
                    synthesized.depends_on.push(format!("{parent}-{dependency}"));
                }
                for placeholder in &template.external_depends_on {
                    let target = resolve(instance, parent, placeholder)?;
                    synthesized.depends_on.push(target);
                }
                for placeholder in &template.external_depends_on_all_of {
                    let target = resolve(instance, parent, placeholder)?;
                    synthesized.depends_on_all_of.push(target);
                }

                apps.insert(name, synthesized);
            }
        }
    }
    Ok(apps)
}

fn resolve(
    instance: &flotilla_topology::BlueprintInstance,
    parent: &str,
    placeholder: &str,
) -> Result<String, Error> {
    instance
        .with
        .get(placeholder)
        .cloned()
        .ok_or_else(|| Error::UnresolvedExternal {
            placeholder: placeholder.to_string(),
            blueprint: instance.blueprint.clone(),
            app: parent.to_string(),
        })
}
