use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeisterError {
    /// The scoring service answered with a non-success status.
    #[error("Remote API error: {status_code} on {method} {path}")]
    RemoteApi {
        method: String,
        path: String,
        status_code: u16,
    },

    /// No response from the scoring service within the client timeout.
    #[error("Remote API timeout on {method} {path}")]
    RemoteApiTimeout { method: String, path: String },

    #[error("Network error: {0}")]
    Network(String),

    /// Staging directory or a staged binary could not be read.
    #[error("Local IO error at {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MeisterError {
    pub fn remote_api(method: &str, path: &str, status_code: u16) -> Self {
        MeisterError::RemoteApi {
            method: method.to_string(),
            path: path.to_string(),
            status_code,
        }
    }

    pub fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MeisterError::LocalIo { path: path.into(), source }
    }
}
