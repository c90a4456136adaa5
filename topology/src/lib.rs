mod error;

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};

pub use error::Error;

/// The only document version this decoder accepts.
pub const SUPPORTED_VERSION: u32 = 1;

/// Typed form of a topology document. Owned by the decoder; every later
/// pipeline stage treats it as read-only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTopology {
    pub version: u32,

    /// Explicit shard counts. Apps absent from this table default to 1
    /// unless co-location forces a value.
    #[serde(default)]
    pub shards: BTreeMap<String, u32>,

    #[serde(default)]
    pub blueprints: BTreeMap<String, Blueprint>,

    #[serde(default)]
    pub apps: BTreeMap<String, AppDefinition>,
}

impl FromStr for RawTopology {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let topology: RawTopology = serde_yaml::from_str(input)?;
        if topology.version != SUPPORTED_VERSION {
            return Err(Error::UnsupportedVersion {
                version: topology.version,
                supported: SUPPORTED_VERSION,
            });
        }
        Ok(topology)
    }
}

/// A reusable template of co-located apps. App names inside a blueprint are
/// meaningful only within it; instantiation joins them to the parent name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blueprint {
    #[serde(default)]
    pub apps: BTreeMap<String, BlueprintApp>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintApp {
    /// Dependencies on other apps in the same blueprint.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Pairwise dependencies bound by the instantiating app's `with` map.
    #[serde(default)]
    pub external_depends_on: Vec<String>,

    /// Fan-in dependencies bound by the instantiating app's `with` map.
    #[serde(default)]
    pub external_depends_on_all_of: Vec<String>,
}

/// A top-level, instantiable app.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppDefinition {
    /// Pairwise dependencies (1:1 or N:1 by shard count).
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Fan-in dependencies: every shard depends on all shards of the target.
    #[serde(default)]
    pub depends_on_all_of: Vec<String>,

    /// Apps that must share a host with this one. Accepts a single name or
    /// a list of names in the document.
    #[serde(default)]
    pub same_host_as: NameList,

    #[serde(default)]
    pub uses: Vec<BlueprintInstance>,
}

/// One usage of a blueprint by a top-level app.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintInstance {
    pub blueprint: String,

    /// When set, the parent app itself depends on every app synthesized
    /// from this instantiation.
    #[serde(default)]
    pub depends_on: bool,

    /// Bindings from the blueprint's external-dependency placeholders to
    /// concrete app names in the enclosing topology.
    #[serde(default)]
    pub with: BTreeMap<String, String>,
}

/// Canonical list form of a field that may be authored as either a single
/// name or a list of names. Normalized once at decode time; downstream code
/// never sees the raw shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NameList(Vec<String>);

impl NameList {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl<'a> IntoIterator for &'a NameList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for NameList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            One(String),
            Many(Vec<String>),
        }

        // A null or empty scalar is how YAML renders an omitted value.
        let names = match Option::<Raw>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(Raw::One(name)) if name.is_empty() => Vec::new(),
            Some(Raw::One(name)) => vec![name],
            Some(Raw::Many(names)) => names,
        };
        Ok(NameList(names))
    }
}
