//! Kernel mount through `fuser`.
//!
//! `fuser` addresses nodes by inode number while [`FuseOps`] is path based,
//! so the adapter remembers the path of every inode it has handed out
//! (through lookup or readdir) and blocks on the async operations from the
//! `fuser` session thread.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fuser::{
    FileType, Filesystem, KernelConfig, MountOption, ReplyAttr, ReplyData, ReplyDirectory,
    ReplyEntry, ReplyOpen, ReplyXattr, Request,
};
use tokio::runtime::Handle;
use tracing::{debug, info};
use uorfs_types::ROOT_INODE_ID;

use crate::config::UorfsConfig;
use crate::filesystem::UorFileSystem;
use crate::ops::FuseOps;
use crate::types::FileAttr;

/// Mount options: read-only, kernel permission checks, unmounted when the
/// process exits.
pub fn mount_options(config: &UorfsConfig) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(config.fsname.clone()),
        MountOption::RO,
        MountOption::DefaultPermissions,
        MountOption::AutoUnmount,
    ];
    if config.allow_other {
        options.push(MountOption::AllowOther);
    }
    options
}

/// Mounts `fs` at `mountpoint` on a background thread.
///
/// The filesystem is unmounted when the returned session is dropped.
pub fn spawn_mount(
    fs: Arc<UorFileSystem>,
    mountpoint: &Path,
    runtime: Handle,
) -> std::io::Result<fuser::BackgroundSession> {
    let options = mount_options(fs.config());
    info!(mountpoint = %mountpoint.display(), reference = fs.reference(), "mounting");
    fuser::spawn_mount2(FuseAdapter::new(fs, runtime), mountpoint, &options)
}

pub struct FuseAdapter {
    fs: Arc<UorFileSystem>,
    runtime: Handle,
    paths: HashMap<u64, String>,
    attr_ttl: Duration,
    entry_ttl: Duration,
}

impl FuseAdapter {
    pub fn new(fs: Arc<UorFileSystem>, runtime: Handle) -> Self {
        let attr_ttl = fs.config().attr_timeout();
        let entry_ttl = fs.config().entry_timeout();
        let mut paths = HashMap::new();
        paths.insert(*ROOT_INODE_ID, "/".to_string());
        Self {
            fs,
            runtime,
            paths,
            attr_ttl,
            entry_ttl,
        }
    }

    fn path(&self, ino: u64) -> Option<String> {
        self.paths.get(&ino).cloned()
    }

    fn remember(&mut self, attr: &FileAttr, path: String) {
        self.paths.entry(*attr.ino).or_insert(path);
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "/" {
        format!("/{name}")
    } else {
        format!("{parent}/{name}")
    }
}

fn parent_path(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}

fn file_type(attr: &FileAttr) -> FileType {
    if attr.is_dir() {
        FileType::Directory
    } else {
        FileType::RegularFile
    }
}

fn to_fuser_attr(attr: &FileAttr) -> fuser::FileAttr {
    fuser::FileAttr {
        ino: *attr.ino,
        size: attr.size,
        blocks: attr.blocks,
        atime: attr.atime,
        mtime: attr.mtime,
        ctime: attr.ctime,
        crtime: attr.crtime,
        kind: file_type(attr),
        perm: attr.perm(),
        nlink: attr.nlink,
        uid: *attr.uid,
        gid: *attr.gid,
        rdev: attr.rdev,
        blksize: attr.blksize,
        flags: attr.flags,
    }
}

/// Serializes xattr names as the kernel expects: each NUL terminated.
fn push_xattr_name(buf: &mut Vec<u8>, name: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.push(0);
}

impl Filesystem for FuseAdapter {
    fn init(&mut self, _req: &Request<'_>, _config: &mut KernelConfig) -> Result<(), libc::c_int> {
        self.runtime.block_on(self.fs.init())
    }

    fn destroy(&mut self) {
        self.runtime.block_on(self.fs.destroy());
    }

    fn lookup(&mut self, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEntry) {
        let Some(parent_path) = self.path(parent) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(libc::ENOENT);
            return;
        };
        let path = child_path(&parent_path, name);
        match self.runtime.block_on(self.fs.getattr(&path)) {
            Ok(r) => {
                self.remember(&r.attr, path);
                reply.entry(&self.entry_ttl, &to_fuser_attr(&r.attr), 0);
            }
            Err(errno) => reply.error(errno),
        }
    }

    fn getattr(&mut self, _req: &Request<'_>, ino: u64, _fh: Option<u64>, reply: ReplyAttr) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.runtime.block_on(self.fs.getattr(&path)) {
            Ok(r) => reply.attr(&self.attr_ttl, &to_fuser_attr(&r.attr)),
            Err(errno) => reply.error(errno),
        }
    }

    fn open(&mut self, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        match self.runtime.block_on(self.fs.open(&path, flags)) {
            Ok(r) => reply.opened(r.fh, r.flags),
            Err(errno) => reply.error(errno),
        }
    }

    fn read(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        size: u32,
        _flags: i32,
        _lock_owner: Option<u64>,
        reply: ReplyData,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Ok(offset) = u64::try_from(offset) else {
            reply.error(libc::EINVAL);
            return;
        };
        match self.runtime.block_on(self.fs.read(&path, offset, size)) {
            Ok(r) => reply.data(&r.data),
            Err(errno) => reply.error(errno),
        }
    }

    fn readdir(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        _fh: u64,
        offset: i64,
        mut reply: ReplyDirectory,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };

        let mut entries: Vec<(String, Option<FileAttr>)> = Vec::new();
        let result = self.runtime.block_on(self.fs.readdir(&path, &mut |name, attr| {
            entries.push((name.to_string(), attr.cloned()));
            true
        }));
        if let Err(errno) = result {
            reply.error(errno);
            return;
        }

        let parent_ino = match self.runtime.block_on(self.fs.getattr(parent_path(&path))) {
            Ok(r) => *r.attr.ino,
            Err(_) => *ROOT_INODE_ID,
        };

        let start = usize::try_from(offset).unwrap_or(0);
        for (i, (name, attr)) in entries.into_iter().enumerate().skip(start) {
            let (entry_ino, kind) = match (&attr, name.as_str()) {
                (Some(attr), _) => {
                    self.remember(attr, child_path(&path, &name));
                    (*attr.ino, file_type(attr))
                }
                (None, "..") => (parent_ino, FileType::Directory),
                (None, _) => (ino, FileType::Directory),
            };
            if reply.add(entry_ino, (i + 1) as i64, kind, &name) {
                break;
            }
        }
        reply.ok();
    }

    fn getxattr(
        &mut self,
        _req: &Request<'_>,
        ino: u64,
        name: &OsStr,
        size: u32,
        reply: ReplyXattr,
    ) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        let Some(name) = name.to_str() else {
            reply.error(crate::error::ENOATTR);
            return;
        };
        match self.runtime.block_on(self.fs.getxattr(&path, name)) {
            Ok(r) if size == 0 => reply.size(r.data.len() as u32),
            Ok(r) if r.data.len() > size as usize => reply.error(libc::ERANGE),
            Ok(r) => reply.data(&r.data),
            Err(errno) => reply.error(errno),
        }
    }

    fn listxattr(&mut self, _req: &Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        let Some(path) = self.path(ino) else {
            reply.error(libc::ENOENT);
            return;
        };
        // A zero size asks for the length only, so nothing is ever rejected.
        let limit = if size == 0 { usize::MAX } else { size as usize };
        let mut buf = Vec::new();
        let result = self.runtime.block_on(self.fs.listxattr(&path, &mut |name| {
            if buf.len() + name.len() + 1 > limit {
                return false;
            }
            push_xattr_name(&mut buf, name);
            true
        }));
        match result {
            Ok(()) if size == 0 => reply.size(buf.len() as u32),
            Ok(()) => reply.data(&buf),
            Err(errno) => {
                debug!(path = %path, errno, "listxattr failed");
                reply.error(errno)
            }
        }
    }
}
