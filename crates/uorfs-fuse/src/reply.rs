//! Reply types for filesystem operations.

use bytes::Bytes;
use std::time::Duration;

use crate::types::FileAttr;

/// Reply for getattr.
#[derive(Debug, Clone)]
pub struct ReplyAttr {
    pub attr: FileAttr,
    pub attr_timeout: Duration,
}

/// Reply for open. No per-open state exists, so `fh` is always 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyOpen {
    pub fh: u64,
    pub flags: u32,
}

/// Reply for read.
#[derive(Debug, Clone)]
pub struct ReplyData {
    pub data: Bytes,
}

/// Reply for getxattr.
#[derive(Debug, Clone)]
pub struct ReplyXattr {
    pub data: Vec<u8>,
}

/// Result type for filesystem operations.
///
/// The error is an errno value (positive integer).
pub type FuseResult<T> = std::result::Result<T, i32>;
