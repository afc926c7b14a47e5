//! Host-independent file metadata.

use std::time::{SystemTime, UNIX_EPOCH};

use uorfs_types::{DevId, Gid, InodeId, Uid};

// ── File type bits (matching libc S_IF* constants) ──────────────────────────

pub const S_IFMT: u32 = libc::S_IFMT as u32;
pub const S_IFREG: u32 = libc::S_IFREG as u32;
pub const S_IFDIR: u32 = libc::S_IFDIR as u32;

/// Permission bits of every regular file.
pub const FILE_PERM: u32 = 0o444;
/// Permission bits of every directory.
pub const DIR_PERM: u32 = 0o555;

/// Preferred I/O size reported in `st_blksize`.
pub const BLOCK_SIZE: u32 = 4096;

/// Mirrors the `struct stat` fields a filesystem host asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttr {
    pub ino: InodeId,
    pub dev: DevId,
    /// File size in bytes.
    pub size: u64,
    /// Number of 512-byte blocks.
    pub blocks: u64,
    pub atime: SystemTime,
    pub mtime: SystemTime,
    pub ctime: SystemTime,
    /// Birth time.
    pub crtime: SystemTime,
    /// File type and permission bits.
    pub mode: u32,
    pub nlink: u32,
    pub uid: Uid,
    pub gid: Gid,
    pub rdev: u32,
    pub blksize: u32,
    pub flags: u32,
}

impl Default for FileAttr {
    fn default() -> Self {
        Self {
            ino: InodeId(0),
            dev: DevId(0),
            size: 0,
            blocks: 0,
            atime: UNIX_EPOCH,
            mtime: UNIX_EPOCH,
            ctime: UNIX_EPOCH,
            crtime: UNIX_EPOCH,
            mode: 0,
            nlink: 0,
            uid: Uid(0),
            gid: Gid(0),
            rdev: 0,
            blksize: 0,
            flags: 0,
        }
    }
}

impl FileAttr {
    /// Directory attributes: mode `0555`, two links, all times `now`.
    pub fn directory(uid: Uid, gid: Gid, now: SystemTime) -> Self {
        Self {
            mode: S_IFDIR | DIR_PERM,
            nlink: 2,
            ..Self::stamped(uid, gid, now)
        }
    }

    /// Regular file attributes: mode `0444`, one link, all times `now`.
    pub fn file(size: u64, uid: Uid, gid: Gid, now: SystemTime) -> Self {
        Self {
            mode: S_IFREG | FILE_PERM,
            nlink: 1,
            size,
            blocks: size.div_ceil(512),
            ..Self::stamped(uid, gid, now)
        }
    }

    fn stamped(uid: Uid, gid: Gid, now: SystemTime) -> Self {
        Self {
            atime: now,
            mtime: now,
            ctime: now,
            crtime: now,
            uid,
            gid,
            blksize: BLOCK_SIZE,
            ..Self::default()
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode & S_IFMT == S_IFDIR
    }

    /// Permission bits without the file type.
    pub fn perm(&self) -> u16 {
        (self.mode & 0o7777) as u16
    }
}
