//! Version propagation and bumping across the workspace.

use semver::Version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::format::Formatter;
use crate::manifest::{DependencyKind, PackageManifest};
use crate::workspace::WorkspaceScanner;

/// Type of version bump to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpType {
    Major,
    Minor,
    Patch,
    Prerelease,
}

/// Compute the version that follows `current`.
pub fn next_version(
    current: &Version,
    bump_type: BumpType,
) -> std::result::Result<Version, semver::Error> {
    let mut new_version = current.clone();

    if bump_type == BumpType::Prerelease {
        let pre_str = new_version.pre.as_str();
        new_version.pre = if pre_str.is_empty() {
            "alpha.1".parse()?
        } else {
            // "beta.3" -> "beta.4", "rc" -> "rc.1"
            match pre_str
                .rsplit_once('.')
                .and_then(|(prefix, num)| Some((prefix, num.parse::<u64>().ok()?)))
            {
                Some((prefix, num)) => format!("{}.{}", prefix, num + 1).parse()?,
                None => format!("{}.1", pre_str).parse()?,
            }
        };
        return Ok(new_version);
    }

    let (major, minor, patch) = (current.major, current.minor, current.patch);
    (new_version.major, new_version.minor, new_version.patch) = match bump_type {
        BumpType::Major => (major + 1, 0, 0),
        BumpType::Minor => (major, minor + 1, 0),
        _ => (major, minor, patch + 1),
    };
    // A release bump always leaves the prerelease channel.
    new_version.pre = semver::Prerelease::EMPTY;

    Ok(new_version)
}

/// Propagates versions across the root manifest and every workspace.
#[derive(Debug, Clone)]
pub struct VersionManager {
    scanner: WorkspaceScanner,
    formatter: Formatter,
}

impl VersionManager {
    /// Create a new version manager for the repository at `root`.
    pub fn new(root: impl AsRef<Path>, config: ToolConfig) -> Self {
        let root = root.as_ref();
        Self {
            formatter: Formatter::new(root, config.clone()),
            scanner: WorkspaceScanner::new(root, config),
        }
    }

    /// Set every manifest to `new_version` and pin internal dependencies to it.
    ///
    /// Workspaces are rewritten one file at a time in the order the package
    /// manager lists them; that order is not a dependency order. A failure
    /// part way leaves the files already written in place. With `dry_run`
    /// nothing is written and the formatter is not run.
    pub async fn propagate(&self, new_version: &str, dry_run: bool) -> Result<PropagationReport> {
        let mut root = PackageManifest::load(self.scanner.root_manifest_path()).await?;
        let mut changes = Vec::new();

        if root.has_workspaces() {
            for info in self.scanner.list().await? {
                let mut manifest = PackageManifest::load(self.scanner.manifest_path(&info)).await?;
                let old_version = manifest.version.clone();
                manifest.set_version(new_version);

                let mut dependencies = Vec::new();
                for dep_name in &info.workspace_dependencies {
                    for kind in manifest.update_dependency(dep_name, new_version) {
                        dependencies.push(DependencyUpdate {
                            dependency: dep_name.clone(),
                            kind,
                        });
                    }
                }

                log::info!(
                    "{}: {} -> {} ({} dependency pin(s))",
                    info.name,
                    old_version.as_deref().unwrap_or("none"),
                    new_version,
                    dependencies.len()
                );

                if !dry_run {
                    manifest.save().await?;
                }

                changes.push(VersionChange {
                    workspace: Some(info.name),
                    path: manifest.path,
                    old_version,
                    dependencies,
                });
            }
        } else {
            log::debug!("Root manifest has no workspaces, updating it alone");
        }

        let old_version = root.version.clone();
        root.set_version(new_version);
        if !dry_run {
            root.save().await?;
        }
        changes.push(VersionChange {
            workspace: None,
            path: root.path,
            old_version,
            dependencies: Vec::new(),
        });

        let formatted = if dry_run {
            false
        } else {
            self.formatter.format_if_configured().await?
        };

        Ok(PropagationReport {
            new_version: new_version.to_string(),
            changes,
            formatted,
        })
    }

    /// Bump the root version and propagate the result.
    pub async fn bump(&self, bump_type: BumpType, dry_run: bool) -> Result<PropagationReport> {
        let path = self.scanner.root_manifest_path();
        let root = PackageManifest::load(&path).await?;

        let current_str = root
            .version
            .ok_or_else(|| Error::MissingVersion { path: path.clone() })?;
        let invalid = |source| Error::InvalidVersion {
            path: path.clone(),
            version: current_str.clone(),
            source,
        };
        let current = Version::parse(&current_str).map_err(invalid)?;
        let new_version = next_version(&current, bump_type).map_err(invalid)?;

        self.propagate(&new_version.to_string(), dry_run).await
    }

    /// Check for version inconsistencies across the workspace.
    pub async fn check_consistency(&self) -> Result<VersionReport> {
        let root = PackageManifest::load(self.scanner.root_manifest_path()).await?;
        let mut report = VersionReport {
            root_version: root.version.clone(),
            total_packages: 1,
            ..VersionReport::default()
        };

        if !root.has_workspaces() {
            return Ok(report);
        }

        let mut workspaces = Vec::new();
        for info in self.scanner.list().await? {
            let manifest = PackageManifest::load(self.scanner.manifest_path(&info)).await?;
            workspaces.push((info, manifest));
        }
        report.total_packages += workspaces.len();

        let package_versions: HashMap<&str, Option<&str>> = workspaces
            .iter()
            .map(|(info, manifest)| (info.name.as_str(), manifest.version.as_deref()))
            .collect();

        for (info, manifest) in &workspaces {
            if manifest.version != root.version {
                report.drift.push(VersionDrift {
                    package: info.name.clone(),
                    found: manifest.version.clone(),
                    expected: root.version.clone(),
                });
            }

            // Any pin on a listed workspace counts, declared in the listing or not.
            for dep in &manifest.dependencies {
                if dep.name == info.name {
                    continue;
                }
                let Some(Some(expected)) = package_versions.get(dep.name.as_str()) else {
                    continue;
                };
                match &dep.specifier {
                    Some(found) if found != expected => {
                        report.inconsistencies.push(VersionInconsistency {
                            package: info.name.clone(),
                            dependency: dep.name.clone(),
                            kind: dep.kind,
                            expected: expected.to_string(),
                            found: found.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }

        Ok(report)
    }
}

/// A dependency entry rewritten during propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyUpdate {
    pub dependency: String,
    pub kind: DependencyKind,
}

/// Represents a version change for one manifest.
#[derive(Debug, Clone)]
pub struct VersionChange {
    /// `None` for the root manifest.
    pub workspace: Option<String>,
    pub path: PathBuf,
    pub old_version: Option<String>,
    pub dependencies: Vec<DependencyUpdate>,
}

/// Outcome of a propagation run.
#[derive(Debug, Clone)]
pub struct PropagationReport {
    pub new_version: String,
    /// Workspaces in listing order, root manifest last.
    pub changes: Vec<VersionChange>,
    pub formatted: bool,
}

impl PropagationReport {
    pub fn dependencies_updated(&self) -> usize {
        self.changes.iter().map(|c| c.dependencies.len()).sum()
    }
}

/// Report of version consistency check.
#[derive(Debug, Default)]
pub struct VersionReport {
    pub root_version: Option<String>,
    pub total_packages: usize,
    pub drift: Vec<VersionDrift>,
    pub inconsistencies: Vec<VersionInconsistency>,
}

/// A workspace whose version differs from the root manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDrift {
    pub package: String,
    pub found: Option<String>,
    pub expected: Option<String>,
}

/// An internal dependency pinned to something other than the workspace's version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInconsistency {
    pub package: String,
    pub dependency: String,
    pub kind: DependencyKind,
    pub expected: String,
    pub found: String,
}

impl VersionReport {
    pub fn has_issues(&self) -> bool {
        !self.drift.is_empty() || !self.inconsistencies.is_empty()
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
