//! Repository formatting after manifests are rewritten.

use std::path::{Path, PathBuf};

use crate::config::ToolConfig;
use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::process;

/// Runs the repository's format script when the root manifest declares one.
#[derive(Debug, Clone)]
pub struct Formatter {
    root: PathBuf,
    config: ToolConfig,
}

impl Formatter {
    pub fn new(root: impl AsRef<Path>, config: ToolConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config,
        }
    }

    /// Returns whether the format command was run.
    pub async fn format_if_configured(&self) -> Result<bool> {
        let manifest = PackageManifest::load(self.root.join("package.json")).await?;

        if !manifest.has_script(&self.config.format_script) {
            log::debug!(
                "No `{}` script in root manifest, skipping format",
                self.config.format_script
            );
            return Ok(false);
        }

        log::info!("Formatting with `{}`", self.config.format_command);
        process::run_status(&self.config.format_command, &self.root).await?;
        Ok(true)
    }
}
