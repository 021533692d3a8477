//! Component/commit catalogue of a project version.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::TypeError;

/// A selectable commit of one component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub message: String,
}

/// One component of a project version, keyed `name@version` by the backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Component {
    pub key: String,
    pub commits: Vec<Commit>,
}

impl Component {
    /// Component name: the part of the key before `@`.
    pub fn name(&self) -> &str {
        self.key.split_once('@').map_or(self.key.as_str(), |(name, _)| name)
    }

    /// Component version: the part of the key after `@`, empty when absent.
    pub fn version(&self) -> &str {
        self.key.split_once('@').map_or("", |(_, version)| version)
    }

    pub fn has_commit(&self, id: &str) -> bool {
        self.commits.iter().any(|c| c.id == id)
    }
}

/// Response of `POST /project_version`, in backend order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "ProjectVersionWire")]
pub struct ProjectComponents {
    components: Vec<Component>,
}

#[derive(Deserialize)]
struct ProjectVersionWire {
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
}

impl TryFrom<ProjectVersionWire> for ProjectComponents {
    type Error = TypeError;

    fn try_from(wire: ProjectVersionWire) -> Result<Self, Self::Error> {
        let mut components = Vec::with_capacity(wire.data.len());
        for (key, commits) in wire.data {
            let serde_json::Value::Object(commits) = commits else {
                return Err(TypeError::UnknownVariant {
                    kind: "component commit list",
                    value: commits.to_string(),
                });
            };
            let commits = commits
                .into_iter()
                .map(|(id, message)| Commit {
                    id,
                    message: match message {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    },
                })
                .collect();
            components.push(Component { key, commits });
        }
        Ok(Self { components })
    }
}

impl ProjectComponents {
    pub fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn get(&self, key: &str) -> Option<&Component> {
        self.components.iter().find(|c| c.key == key)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Commit selection for these components.
    ///
    /// Keeps a previous choice for a component when there is one, otherwise
    /// picks the component's first commit. Components without any commit and
    /// without a previous choice are left out. Choices for components that no
    /// longer exist are dropped.
    pub fn default_selection(
        &self,
        previous: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        self.components
            .iter()
            .filter_map(|c| {
                previous
                    .get(&c.key)
                    .cloned()
                    .or_else(|| c.commits.first().map(|commit| commit.id.clone()))
                    .map(|commit| (c.key.clone(), commit))
            })
            .collect()
    }
}
