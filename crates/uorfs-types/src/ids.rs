strong_type!(InodeId, u64);
strong_type!(DevId, u64);
strong_type!(Uid, u32);
strong_type!(Gid, u32);

/// Inode number reported for the mount root.
pub const ROOT_INODE_ID: InodeId = InodeId(1);

impl Uid {
    /// Effective uid of the current process.
    pub fn effective() -> Self {
        // SAFETY: geteuid has no preconditions and cannot fail.
        Uid(unsafe { libc::geteuid() })
    }
}

impl Gid {
    /// Effective gid of the current process.
    pub fn effective() -> Self {
        // SAFETY: getegid has no preconditions and cannot fail.
        Gid(unsafe { libc::getegid() })
    }
}
