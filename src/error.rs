use std::path::PathBuf;

use thiserror::Error;

use crate::host::SurfaceId;

/// Failures reported by the collaborators the panel drives.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid manifest: {reason}")]
    Manifest { path: PathBuf, reason: String },
    #[error("extension {0} is not installed")]
    NotInstalled(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{0} unavailable")]
    Unavailable(String),
}

impl HostError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Panel-level failure categories. None of them is fatal to the panel.
#[derive(Debug, Error)]
pub enum PanelError {
    #[error("configuration query failed: {0}")]
    ConfigQuery(#[source] HostError),
    #[error("startup of {extension_id} failed: {reason}")]
    Startup { extension_id: String, reason: String },
    #[error("surface {surface} could not be attached: {reason}")]
    Attach { surface: SurfaceId, reason: String },
    #[error("{channel} subscription failed: {source}")]
    Subscription {
        channel: &'static str,
        #[source]
        source: HostError,
    },
}
