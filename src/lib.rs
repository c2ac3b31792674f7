//! Version propagation utilities for Yarn monorepos.
//!
//! This crate lists workspaces through the package manager, rewrites their
//! package.json files to a new version, and keeps internal dependency pins
//! in step with it.

pub mod config;
pub mod error;
pub mod format;
pub mod manifest;
pub mod process;
pub mod version;
pub mod workspace;

pub use config::{CommandSpec, ToolConfig};
pub use error::{Error, Result};
pub use format::Formatter;
pub use manifest::{Dependency, DependencyKind, PackageManifest};
pub use version::{next_version, BumpType, PropagationReport, VersionManager, VersionReport};
pub use workspace::{parse_workspace_listing, WorkspaceDescriptor, WorkspaceInfo, WorkspaceScanner};
