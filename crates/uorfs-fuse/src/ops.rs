//! Filesystem operations trait.
//!
//! Path-based, host-independent. A host adapter (see `mount`) translates
//! kernel requests into these calls, and tests can call them directly.

use crate::reply::*;
use crate::types::FileAttr;

/// Directory entry sink. Returns false once it cannot take more entries.
pub type DirFiller<'a> = dyn FnMut(&str, Option<&FileAttr>) -> bool + Send + 'a;

/// Extended attribute name sink. Returns false when its buffer is full.
pub type XattrFiller<'a> = dyn FnMut(&str) -> bool + Send + 'a;

/// Operations a filesystem host dispatches.
///
/// Default implementations return `ENOSYS` (function not implemented).
/// Errors are errno values (positive integers, e.g. `libc::ENOENT`).
#[async_trait::async_trait]
pub trait FuseOps: Send + Sync + 'static {
    // ── Lifecycle ───────────────────────────────────────────────────────

    async fn init(&self) -> FuseResult<()> {
        Ok(())
    }

    async fn destroy(&self) {}

    // ── Metadata ────────────────────────────────────────────────────────

    async fn getattr(&self, path: &str) -> FuseResult<ReplyAttr> {
        let _ = path;
        Err(libc::ENOSYS)
    }

    // ── File I/O ────────────────────────────────────────────────────────

    async fn open(&self, path: &str, flags: i32) -> FuseResult<ReplyOpen> {
        let _ = (path, flags);
        Err(libc::ENOSYS)
    }

    /// Read up to `size` bytes starting at `offset`.
    ///
    /// Short reads at end of file are not errors.
    async fn read(&self, path: &str, offset: u64, size: u32) -> FuseResult<ReplyData> {
        let _ = (path, offset, size);
        Err(libc::ENOSYS)
    }

    // ── Directories ─────────────────────────────────────────────────────

    /// Emit `.`, `..` and every child through `filler`, stopping early when
    /// it reports full.
    async fn readdir(&self, path: &str, filler: &mut DirFiller<'_>) -> FuseResult<()> {
        let _ = (path, filler);
        Err(libc::ENOSYS)
    }

    // ── Extended attributes ─────────────────────────────────────────────

    /// Emit every extended attribute name. Fails with `ERANGE` when `filler`
    /// rejects a name.
    async fn listxattr(&self, path: &str, filler: &mut XattrFiller<'_>) -> FuseResult<()> {
        let _ = (path, filler);
        Err(libc::ENOSYS)
    }

    async fn getxattr(&self, path: &str, name: &str) -> FuseResult<ReplyXattr> {
        let _ = (path, name);
        Err(libc::ENOSYS)
    }
}
