//! package.json parsing and manipulation utilities.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Dependency maps that may pin a workspace version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    BundledDependencies,
    OptionalDependencies,
    Overrides,
}

impl DependencyKind {
    pub const ALL: [DependencyKind; 6] = [
        Self::Dependencies,
        Self::DevDependencies,
        Self::PeerDependencies,
        Self::BundledDependencies,
        Self::OptionalDependencies,
        Self::Overrides,
    ];

    /// Field name in package.json.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
            Self::BundledDependencies => "bundledDependencies",
            Self::OptionalDependencies => "optionalDependencies",
            Self::Overrides => "overrides",
        }
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown dependency field: {}", s))
    }
}

/// A dependency entry found in one of the dependency maps.
#[derive(Debug, Clone, PartialEq)]
pub struct Dependency {
    pub name: String,
    /// `None` when the entry is not a plain string (nested overrides, list entries).
    pub specifier: Option<String>,
    pub kind: DependencyKind,
}

/// Represents a package.json manifest file.
///
/// The typed fields are a view over `document`, which keeps unknown fields
/// and key order intact for the rewrite.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    pub path: PathBuf,
    pub version: Option<String>,
    pub display_name: Option<String>,
    pub workspaces: Option<Value>,
    pub scripts: Map<String, Value>,
    pub dependencies: Vec<Dependency>,
    document: Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestFields {
    version: Option<String>,
    display_name: Option<String>,
    workspaces: Option<Value>,
    scripts: Option<Value>,
    dependencies: Option<DependencySection>,
    dev_dependencies: Option<DependencySection>,
    peer_dependencies: Option<DependencySection>,
    bundled_dependencies: Option<DependencySection>,
    optional_dependencies: Option<DependencySection>,
    overrides: Option<DependencySection>,
}

// `bundledDependencies` is usually a list of names, and npm also accepts
// `true` there. Anything that is not a map or a list pins nothing.
#[derive(Deserialize)]
#[serde(untagged)]
enum DependencySection {
    Map(Map<String, Value>),
    List(Vec<String>),
    Other(Value),
}

impl ManifestFields {
    fn section(&self, kind: DependencyKind) -> Option<&DependencySection> {
        match kind {
            DependencyKind::Dependencies => self.dependencies.as_ref(),
            DependencyKind::DevDependencies => self.dev_dependencies.as_ref(),
            DependencyKind::PeerDependencies => self.peer_dependencies.as_ref(),
            DependencyKind::BundledDependencies => self.bundled_dependencies.as_ref(),
            DependencyKind::OptionalDependencies => self.optional_dependencies.as_ref(),
            DependencyKind::Overrides => self.overrides.as_ref(),
        }
    }
}

impl PackageManifest {
    /// Load a package.json file from disk.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(path, &content)
    }

    /// Parse manifest content that was read from `path`.
    pub fn parse(path: impl AsRef<Path>, content: &str) -> Result<Self> {
        let path = path.as_ref();
        let json_err = |source| Error::Json {
            path: path.to_path_buf(),
            source,
        };

        // Duplicate keys keep the last value, as JSON.parse does.
        let document: Map<String, Value> = serde_json::from_str(content).map_err(json_err)?;
        let fields: ManifestFields =
            serde_json::from_value(Value::Object(document.clone())).map_err(json_err)?;

        let mut dependencies = Vec::new();
        for kind in DependencyKind::ALL {
            match fields.section(kind) {
                Some(DependencySection::Map(entries)) => {
                    for (name, value) in entries {
                        dependencies.push(Dependency {
                            name: name.clone(),
                            specifier: value.as_str().map(str::to_string),
                            kind,
                        });
                    }
                }
                Some(DependencySection::List(names)) => {
                    for name in names {
                        dependencies.push(Dependency {
                            name: name.clone(),
                            specifier: None,
                            kind,
                        });
                    }
                }
                Some(DependencySection::Other(value)) => {
                    log::debug!(
                        "Ignoring {} = {} in {}",
                        kind.as_str(),
                        value,
                        path.display()
                    );
                }
                None => {}
            }
        }

        let scripts = match fields.scripts {
            Some(Value::Object(scripts)) => scripts,
            _ => Map::new(),
        };

        Ok(Self {
            path: path.to_path_buf(),
            version: fields.version,
            display_name: fields.display_name,
            workspaces: fields.workspaces,
            scripts,
            dependencies,
            document,
        })
    }

    /// Whether the manifest declares a monorepo `workspaces` field.
    pub fn has_workspaces(&self) -> bool {
        self.workspaces.as_ref().is_some_and(is_truthy)
    }

    /// Whether `scripts.<name>` is set to a truthy value.
    pub fn has_script(&self, name: &str) -> bool {
        self.scripts.get(name).is_some_and(is_truthy)
    }

    /// Update the package version.
    pub fn set_version(&mut self, new_version: &str) {
        self.version = Some(new_version.to_string());
        self.document
            .insert("version".to_string(), Value::String(new_version.to_string()));
    }

    /// Pin `dep_name` to `new_version` in every dependency map that already
    /// contains it. Returns the maps that were touched.
    pub fn update_dependency(&mut self, dep_name: &str, new_version: &str) -> Vec<DependencyKind> {
        let mut updated = Vec::new();

        for kind in DependencyKind::ALL {
            let Some(Value::Object(section)) = self.document.get_mut(kind.as_str()) else {
                continue;
            };
            match section.get_mut(dep_name) {
                Some(entry) if !entry.is_null() => {
                    *entry = Value::String(new_version.to_string());
                    updated.push(kind);
                }
                _ => {}
            }
        }

        for dep in self
            .dependencies
            .iter_mut()
            .filter(|d| d.name == dep_name && updated.contains(&d.kind))
        {
            dep.specifier = Some(new_version.to_string());
        }

        updated
    }

    /// Dependencies named `name`, across all maps.
    pub fn dependencies_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Dependency> {
        self.dependencies.iter().filter(move |d| d.name == name)
    }

    /// Compact JSON rendering of the manifest.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.document).map_err(|source| Error::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Save the manifest back to disk as compact JSON.
    pub async fn save(&self) -> Result<()> {
        let content = self.to_json()?;
        log::info!("Writing {}", self.path.display());
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| Error::Io {
                path: self.path.clone(),
                source,
            })
    }
}

/// JavaScript truthiness for JSON values.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
