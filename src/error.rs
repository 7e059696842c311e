//! Error types shared by the analysis core and the server.

use std::path::PathBuf;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// The client cancelled the request while it was being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request was cancelled")]
pub struct Cancelled;

/// Stop if the token has been cancelled.
pub fn check_cancelled(token: &CancellationToken) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        Err(Cancelled)
    } else {
        Ok(())
    }
}

/// A compilation unit's deferred scope could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("scope of {path} is unavailable: {reason}")]
pub struct ScopeError {
    pub path: PathBuf,
    pub reason: String,
}

/// Failure to load a project snapshot from disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read project snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed project snapshot {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
