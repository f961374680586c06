//! Error types for aptlier-core.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors from the durable snapshot file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O failure, annotated with the path being touched.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A non-blank line that is not a `name@timestamp` record.
    #[error("malformed snapshot record at {path}:{line}: {content:?}")]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },
}

/// Errors from loading `aptlier.yaml`.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error, with the settings file path.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Failure of a delegated external-tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The child process could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The child process exited unsuccessfully.
    #[error("FATAL: {status} ({command}){}", stderr_suffix(.stderr))]
    Failed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}

pub(crate) fn store_io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}
