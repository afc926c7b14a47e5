//! Client error types.

use std::path::PathBuf;

use uorfs_proto::ProtoError;

/// Errors that can occur while talking to a registry or walking its graph.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The reference or digest does not exist in the registry.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Proto(#[from] ProtoError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid reference: {0}")]
    InvalidReference(String),

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    /// Content read from the store does not hash to its digest.
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("size mismatch for {digest}: expected {expected}, got {actual}")]
    SizeMismatch {
        digest: String,
        expected: u64,
        actual: u64,
    },

    /// The attribute matcher failed on a node.
    #[error("matcher failed on {node}: {message}")]
    Match { node: String, message: String },

    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl ClientError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClientError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience result type.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
