use std::path::PathBuf;

use thiserror::Error;

use aptlier_core::ToolError;

/// Error surface for workspace preparation and the aptly / gpg adapters.
#[derive(Debug, Error)]
pub enum ToolsError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Plain-HTTP key sources are never fetched.
    #[error("refusing to fetch key over insecure HTTP: {url}")]
    InsecureKeyUrl { url: String },

    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("not a usable key source: {key:?}")]
    InvalidKeySource { key: String },

    #[error("no gpg executable found (tried gpg1, gpg); set gpg_command")]
    GpgNotFound,
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ToolsError {
    ToolsError::Io {
        path: path.into(),
        source,
    }
}
