use std::path::PathBuf;

use thiserror::Error;
use wn_protocol::ProfileError;
use wn_wapi::WapiError;

/// Discovery and cache errors.
#[derive(Debug, Error)]
pub enum McpError {
    #[error(transparent)]
    Wapi(#[from] WapiError),

    #[error("unusable schema: {0}")]
    Profile(#[from] ProfileError),

    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no schemas discovered; WAPI unreachable and cache empty")]
    NoSchemas,
}

pub type McpResult<T> = Result<T, McpError>;

impl McpError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
