//! In-memory directory tree.
//!
//! Nodes live in an arena and refer to each other by index. The root sits
//! at index 0; every node's inode number is its index plus one, so the root
//! is inode 1. Nodes are never removed: replacing an entry re-points the
//! parent's child map and leaves the old node unreachable.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::SystemTime;

use uorfs_proto::Descriptor;
use uorfs_types::{Gid, InodeId, Uid};

use crate::cache::DecayCache;
use crate::error::FsError;
use crate::types::FileAttr;

/// Longest accepted path segment, in bytes.
pub const MAX_NAME_LEN: usize = 255;

const ROOT_INDEX: usize = 0;

#[derive(Debug)]
pub enum NodeKind {
    Directory {
        children: HashMap<String, usize>,
    },
    File {
        descriptor: Descriptor,
        /// Created on first read.
        cache: Option<Arc<DecayCache>>,
    },
}

#[derive(Debug)]
pub struct Node {
    pub attr: FileAttr,
    /// Extended attributes; only files carry any.
    pub xattrs: BTreeMap<String, Vec<u8>>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn children(&self) -> Option<&HashMap<String, usize>> {
        match &self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct NodeTree {
    nodes: Vec<Node>,
    uid: Uid,
    gid: Gid,
}

impl NodeTree {
    /// Empty tree owned by `uid:gid`.
    pub fn new(uid: Uid, gid: Gid) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            uid,
            gid,
        };
        tree.push_dir();
        tree
    }

    /// Empty tree owned by the process's effective uid and gid.
    pub fn for_current_user() -> Self {
        Self::new(Uid::effective(), Gid::effective())
    }

    pub fn root(&self) -> usize {
        ROOT_INDEX
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    /// Number of nodes ever created, reachable or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Resolves `path` from the root.
    ///
    /// Empty segments are ignored, so `""`, `"/"` and `"//"` all name the
    /// root. Any segment longer than [`MAX_NAME_LEN`] fails with
    /// `NameTooLong`, even when an earlier segment is already missing.
    pub fn lookup(&self, path: &str) -> Result<usize, FsError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.iter().any(|s| s.len() > MAX_NAME_LEN) {
            return Err(FsError::NameTooLong(path.to_string()));
        }
        let mut current = ROOT_INDEX;
        for segment in segments {
            current = self.nodes[current]
                .children()
                .and_then(|children| children.get(segment))
                .copied()
                .ok_or_else(|| FsError::NotFound(path.to_string()))?;
        }
        Ok(current)
    }

    /// Inserts a file at `path`, creating missing parent directories.
    ///
    /// An existing entry at `path` is replaced. Fails if `path` is empty,
    /// holds `.` or `..`, has an over-long segment or runs through a file.
    pub fn insert_file(
        &mut self,
        path: &str,
        descriptor: Descriptor,
        xattrs: BTreeMap<String, Vec<u8>>,
    ) -> Result<usize, FsError> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((name, parents)) = segments.split_last() else {
            return Err(FsError::InvalidPath(path.to_string()));
        };
        for segment in &segments {
            if *segment == "." || *segment == ".." {
                return Err(FsError::InvalidPath(path.to_string()));
            }
            if segment.len() > MAX_NAME_LEN {
                return Err(FsError::NameTooLong(path.to_string()));
            }
        }

        let mut parent = ROOT_INDEX;
        for segment in parents {
            parent = self.child_dir(parent, segment, path)?;
        }

        let attr = FileAttr::file(descriptor.size, self.uid, self.gid, SystemTime::now());
        let index = self.push(Node {
            attr,
            xattrs,
            kind: NodeKind::File {
                descriptor,
                cache: None,
            },
        });

        let replaced = match &mut self.nodes[parent].kind {
            NodeKind::Directory { children } => children.insert(name.to_string(), index),
            NodeKind::File { .. } => return Err(FsError::NotADirectory(path.to_string())),
        };
        if let Some(old) = replaced {
            if self.nodes[old].is_dir() {
                self.nodes[parent].attr.nlink -= 1;
            }
        }
        Ok(index)
    }

    /// Existing directory `name` under `parent`, created if missing.
    fn child_dir(&mut self, parent: usize, name: &str, path: &str) -> Result<usize, FsError> {
        let existing = match &self.nodes[parent].kind {
            NodeKind::Directory { children } => children.get(name).copied(),
            NodeKind::File { .. } => return Err(FsError::NotADirectory(path.to_string())),
        };
        match existing {
            Some(child) if self.nodes[child].is_dir() => Ok(child),
            Some(_) => Err(FsError::NotADirectory(path.to_string())),
            None => {
                let child = self.push_dir();
                if let NodeKind::Directory { children } = &mut self.nodes[parent].kind {
                    children.insert(name.to_string(), child);
                }
                self.nodes[parent].attr.nlink += 1;
                Ok(child)
            }
        }
    }

    fn push_dir(&mut self) -> usize {
        let attr = FileAttr::directory(self.uid, self.gid, SystemTime::now());
        self.push(Node {
            attr,
            xattrs: BTreeMap::new(),
            kind: NodeKind::Directory {
                children: HashMap::new(),
            },
        })
    }

    fn push(&mut self, mut node: Node) -> usize {
        let index = self.nodes.len();
        node.attr.ino = InodeId(index as u64 + 1);
        self.nodes.push(node);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uorfs_types::ROOT_INODE_ID;

    fn tree() -> NodeTree {
        NodeTree::new(Uid(1000), Gid(1000))
    }

    fn desc(size: u64) -> Descriptor {
        Descriptor::new("text/plain", "sha256:00", size)
    }

    fn child_dirs(tree: &NodeTree, index: usize) -> u32 {
        tree.node(index)
            .children()
            .map(|c| c.values().filter(|&&i| tree.node(i).is_dir()).count() as u32)
            .unwrap_or(0)
    }

    #[test]
    fn test_root() {
        let tree = tree();
        let root = tree.lookup("").unwrap();
        assert_eq!(root, tree.root());
        assert_eq!(tree.lookup("/").unwrap(), root);
        assert_eq!(tree.lookup("//").unwrap(), root);

        let attr = &tree.node(root).attr;
        assert_eq!(attr.ino, ROOT_INODE_ID);
        assert_eq!(attr.nlink, 2);
        assert_eq!(attr.perm(), 0o555);
        assert_eq!(attr.uid, Uid(1000));
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_nested() {
        let mut tree = tree();
        let file = tree.insert_file("a/b/c.txt", desc(5), BTreeMap::new()).unwrap();
        assert_eq!(tree.lookup("/a/b/c.txt").unwrap(), file);
        assert_eq!(tree.lookup("a//b/c.txt").unwrap(), file);

        let node = tree.node(file);
        assert_eq!(node.attr.size, 5);
        assert_eq!(node.attr.perm(), 0o444);
        assert_eq!(node.attr.nlink, 1);

        let a = tree.lookup("a").unwrap();
        assert_eq!(tree.node(a).attr.size, 0);
        assert_eq!(node.attr.ino, InodeId(file as u64 + 1));
    }

    #[test]
    fn test_nlink_counts_child_directories() {
        let mut tree = tree();
        for path in ["a/x", "a/y", "b/z", "c", "a/d/e", "a/d/f"] {
            tree.insert_file(path, desc(1), BTreeMap::new()).unwrap();
        }
        for path in ["", "a", "b", "a/d"] {
            let index = tree.lookup(path).unwrap();
            assert_eq!(
                tree.node(index).attr.nlink,
                2 + child_dirs(&tree, index),
                "{path:?}"
            );
        }
        assert_eq!(tree.node(tree.root()).attr.nlink, 4);
    }

    #[test]
    fn test_replace_keeps_nlink_invariant() {
        let mut tree = tree();
        tree.insert_file("a/b/c", desc(1), BTreeMap::new()).unwrap();
        let first = tree.lookup("a/b/c").unwrap();
        let second = tree.insert_file("a/b/c", desc(2), BTreeMap::new()).unwrap();
        assert_ne!(first, second);
        assert_eq!(tree.node(tree.lookup("a/b/c").unwrap()).attr.size, 2);

        // A file replacing a directory drops that directory's link.
        tree.insert_file("a/b", desc(3), BTreeMap::new()).unwrap();
        let a = tree.lookup("a").unwrap();
        assert_eq!(tree.node(a).attr.nlink, 2);
        assert!(matches!(tree.lookup("a/b/c"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_missing_paths() {
        let mut tree = tree();
        tree.insert_file("a/file", desc(1), BTreeMap::new()).unwrap();
        assert!(matches!(tree.lookup("missing"), Err(FsError::NotFound(_))));
        assert!(matches!(tree.lookup("a/missing"), Err(FsError::NotFound(_))));
        assert!(matches!(tree.lookup("a/file/below"), Err(FsError::NotFound(_))));
    }

    #[test]
    fn test_name_too_long() {
        let mut tree = tree();
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            tree.lookup(&format!("missing/{long}")),
            Err(FsError::NameTooLong(_))
        ));
        assert!(matches!(
            tree.insert_file(&long, desc(1), BTreeMap::new()),
            Err(FsError::NameTooLong(_))
        ));

        let exact = "y".repeat(MAX_NAME_LEN);
        tree.insert_file(&exact, desc(1), BTreeMap::new()).unwrap();
        tree.lookup(&exact).unwrap();
    }

    #[test]
    fn test_invalid_inserts() {
        let mut tree = tree();
        for path in ["", "/", "a/../b", "./c"] {
            assert!(
                matches!(
                    tree.insert_file(path, desc(1), BTreeMap::new()),
                    Err(FsError::InvalidPath(_))
                ),
                "{path:?}"
            );
        }
        tree.insert_file("file", desc(1), BTreeMap::new()).unwrap();
        assert!(matches!(
            tree.insert_file("file/child", desc(1), BTreeMap::new()),
            Err(FsError::NotADirectory(_))
        ));
    }
}
