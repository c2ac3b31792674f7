//! Workspace listing and discovery through the package manager.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::manifest::PackageManifest;
use crate::process;

/// A workspace as reported by the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceInfo {
    #[serde(skip)]
    pub name: String,
    /// Path relative to the repository root.
    pub location: PathBuf,
    #[serde(default)]
    pub workspace_dependencies: Vec<String>,
}

/// Human facing name and location of a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspaceDescriptor {
    pub name: String,
    pub path: PathBuf,
}

/// Parse the workspace listing printed by the package manager.
///
/// Yarn may wrap the JSON in a banner line (`yarn workspaces v1.22.19`) and
/// a footer (`Done in 0.04s.`); both are stripped before parsing. Entries are
/// returned in the order the tool printed them.
pub fn parse_workspace_listing(output: &str) -> Result<Vec<WorkspaceInfo>> {
    let mut lines: Vec<&str> = output
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    // A terminating newline is not a line of its own.
    if lines.len() > 1 && lines.last() == Some(&"") {
        lines.pop();
    }
    if lines.first().is_some_and(|line| line.contains("yarn")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|line| line.contains("Done")) {
        lines.pop();
    }

    let entries: Map<String, Value> =
        serde_json::from_str(&lines.join("\n")).map_err(|source| Error::Listing { source })?;

    entries
        .into_iter()
        .map(|(name, value)| {
            let mut info: WorkspaceInfo =
                serde_json::from_value(value).map_err(|source| Error::Listing { source })?;
            info.name = name;
            Ok(info)
        })
        .collect()
}

/// Discovers the workspaces of a repository.
#[derive(Debug, Clone)]
pub struct WorkspaceScanner {
    root: PathBuf,
    config: ToolConfig,
}

impl WorkspaceScanner {
    /// Create a new workspace scanner.
    pub fn new(root: impl AsRef<Path>, config: ToolConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    /// Path of the root package.json.
    pub fn root_manifest_path(&self) -> PathBuf {
        self.root.join("package.json")
    }

    /// Path of a workspace's package.json.
    pub fn manifest_path(&self, info: &WorkspaceInfo) -> PathBuf {
        self.root.join(&info.location).join("package.json")
    }

    /// Run the listing command and parse its output.
    pub async fn list(&self) -> Result<Vec<WorkspaceInfo>> {
        let output = process::run_captured(&self.config.list_command, &self.root).await?;
        let workspaces = parse_workspace_listing(&output)?;
        log::debug!("Found {} workspace(s)", workspaces.len());
        Ok(workspaces)
    }

    /// Describe every workspace, preferring its `displayName`.
    pub async fn describe(&self) -> Result<Vec<WorkspaceDescriptor>> {
        let mut descriptors = Vec::new();

        for info in self.list().await? {
            let manifest = PackageManifest::load(self.manifest_path(&info)).await?;
            descriptors.push(WorkspaceDescriptor {
                name: manifest.display_name.unwrap_or(info.name),
                path: info.location,
            });
        }

        Ok(descriptors)
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
