//! Filesystem error taxonomy and its errno mapping.

use uorfs_client::ClientError;
use uorfs_proto::ProtoError;

use crate::node::MAX_NAME_LEN;

/// "No such attribute". Linux spells it ENODATA.
#[cfg(target_os = "macos")]
pub const ENOATTR: i32 = libc::ENOATTR;
#[cfg(not(target_os = "macos"))]
pub const ENOATTR: i32 = libc::ENODATA;

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no such entry: {0}")]
    NotFound(String),

    #[error("no such attribute: {0}")]
    AttributeNotFound(String),

    /// The caller's listing buffer rejected an entry.
    #[error("listing does not fit the supplied buffer")]
    ListTooLarge,

    #[error("path segment longer than {MAX_NAME_LEN} bytes in {0}")]
    NameTooLong(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("is a directory: {0}")]
    IsADirectory(String),

    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("failed to load collection: {0}")]
    Load(#[from] ClientError),

    #[error("failed to build tree: {0}")]
    Build(#[from] ProtoError),
}

impl FsError {
    /// Errno reported to the filesystem host.
    pub fn errno(&self) -> i32 {
        match self {
            FsError::NotFound(_) => libc::ENOENT,
            FsError::AttributeNotFound(_) => ENOATTR,
            FsError::ListTooLarge => libc::ERANGE,
            FsError::NameTooLong(_) => libc::ENAMETOOLONG,
            FsError::NotADirectory(_) => libc::ENOTDIR,
            FsError::IsADirectory(_) => libc::EISDIR,
            FsError::InvalidPath(_) => libc::EINVAL,
            FsError::Load(_) | FsError::Build(_) => libc::EIO,
        }
    }
}

impl From<FsError> for i32 {
    fn from(err: FsError) -> i32 {
        err.errno()
    }
}
