//! Error types for workspace version operations.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type alias for workspace version operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is fatal to the operation that raised it; nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    /// External command could not be started
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// External command exited unsuccessfully
    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// Manifest could not be read or written
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest is not valid JSON or has fields of the wrong type
    #[error("Failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Workspace listing output is not a JSON object after stripping
    #[error("Failed to parse workspace listing: {source}")]
    Listing {
        #[source]
        source: serde_json::Error,
    },

    /// Manifest has no version to bump from
    #[error("Missing version in {}", path.display())]
    MissingVersion { path: PathBuf },

    /// Manifest version is not a semantic version
    #[error("Invalid version '{version}' in {}: {source}", path.display())]
    InvalidVersion {
        path: PathBuf,
        version: String,
        #[source]
        source: semver::Error,
    },
}
