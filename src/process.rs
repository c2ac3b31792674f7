//! Subprocess execution for the package manager commands.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::CommandSpec;
use crate::error::{Error, Result};

/// Run a command in `cwd` and return its standard output.
pub async fn run_captured(spec: &CommandSpec, cwd: &Path) -> Result<String> {
    log::debug!("Running `{}` in {}", spec, cwd.display());

    let output = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| Error::Spawn {
            command: spec.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(Error::CommandFailed {
            command: spec.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Run a command in `cwd` with inherited output; only success matters.
pub async fn run_status(spec: &CommandSpec, cwd: &Path) -> Result<()> {
    log::debug!("Running `{}` in {}", spec, cwd.display());

    let status = Command::new(&spec.program)
        .args(&spec.args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .status()
        .await
        .map_err(|source| Error::Spawn {
            command: spec.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(Error::CommandFailed {
            command: spec.to_string(),
            status,
            stderr: String::new(),
        });
    }

    Ok(())
}
