//! `UorFileSystem`, the operation handler served to the filesystem host.
//!
//! Every operation holds the tree lock for its whole duration, including
//! the content fetch inside `read`. That serializes all operations against
//! each other and guarantees at most one fetch in flight. File caches have
//! their own lock, so their decay timers do not need the tree lock.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uorfs_client::{Matcher, RegistryClient};

use crate::builder;
use crate::cache::DecayCache;
use crate::config::UorfsConfig;
use crate::error::FsError;
use crate::loader;
use crate::node::{NodeKind, NodeTree};
use crate::ops::*;
use crate::reply::*;

pub struct UorFileSystem {
    client: Arc<dyn RegistryClient>,
    reference: String,
    config: UorfsConfig,
    tree: Mutex<NodeTree>,
}

impl UorFileSystem {
    /// Serves an already built tree.
    pub fn new(
        client: Arc<dyn RegistryClient>,
        reference: impl Into<String>,
        config: UorfsConfig,
        tree: NodeTree,
    ) -> Self {
        Self {
            client,
            reference: reference.into(),
            config,
            tree: Mutex::new(tree),
        }
    }

    /// Loads `reference` and builds the tree it exposes.
    ///
    /// Load and build failures are logged and leave a partial (possibly
    /// empty) tree, unless `config.abort_on_load_error` is set, in which
    /// case the first failure is returned.
    pub async fn load(
        client: Arc<dyn RegistryClient>,
        reference: impl Into<String>,
        matcher: Option<&dyn Matcher>,
        config: UorfsConfig,
    ) -> Result<Self, FsError> {
        let reference = reference.into();
        let mut tree = NodeTree::for_current_user();

        match loader::load(client.as_ref(), &reference, matcher).await {
            Ok(descriptors) => {
                let report = builder::populate(&mut tree, &descriptors);
                info!(
                    reference = %reference,
                    files = report.inserted,
                    skipped = report.skipped,
                    failed = report.failures.len(),
                    "built filesystem tree"
                );
                if config.abort_on_load_error {
                    if let Some((_, err)) = report.failures.into_iter().next() {
                        return Err(err);
                    }
                }
            }
            Err(e) if config.abort_on_load_error => return Err(FsError::Load(e)),
            Err(e) => {
                warn!(reference = %reference, error = %e, "failed to load collection, serving an empty tree");
            }
        }

        Ok(Self::new(client, reference, config, tree))
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn config(&self) -> &UorfsConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl FuseOps for UorFileSystem {
    async fn init(&self) -> FuseResult<()> {
        info!(reference = %self.reference, "filesystem initialized");
        Ok(())
    }

    async fn destroy(&self) {
        info!(reference = %self.reference, "filesystem destroyed");
    }

    async fn getattr(&self, path: &str) -> FuseResult<ReplyAttr> {
        debug!(path, "getattr");
        let tree = self.tree.lock().await;
        let index = tree.lookup(path).map_err(|e| e.errno())?;
        Ok(ReplyAttr {
            attr: tree.node(index).attr.clone(),
            attr_timeout: self.config.attr_timeout(),
        })
    }

    async fn open(&self, path: &str, flags: i32) -> FuseResult<ReplyOpen> {
        debug!(path, flags, "open");
        let tree = self.tree.lock().await;
        tree.lookup(path).map_err(|e| e.errno())?;
        Ok(ReplyOpen { fh: 0, flags: 0 })
    }

    async fn read(&self, path: &str, offset: u64, size: u32) -> FuseResult<ReplyData> {
        debug!(path, offset, size, "read");
        let mut tree = self.tree.lock().await;
        let index = tree.lookup(path).map_err(|e| e.errno())?;
        let (descriptor, cache) = match &mut tree.node_mut(index).kind {
            NodeKind::Directory { .. } => return Err(FsError::IsADirectory(path.into()).errno()),
            NodeKind::File { descriptor, cache } => {
                let cache = cache
                    .get_or_insert_with(|| Arc::new(DecayCache::new(self.config.cache_idle())));
                (descriptor.clone(), Arc::clone(cache))
            }
        };

        // Pinned before the buffer is checked so no decay can slip between
        // the fill and the copy.
        let _pin = cache.pinned();
        let data = match cache.data() {
            Some(data) => data,
            None => {
                let data = self
                    .client
                    .get_content(&self.reference, &descriptor)
                    .await
                    .map_err(|e| {
                        error!(path, digest = %descriptor.digest, error = %e, "failed to fetch content");
                        libc::ENOENT
                    })?;
                debug!(path, bytes = data.len(), "fetched content");
                cache.fill(data.clone());
                data
            }
        };

        let len = data.len() as u64;
        let start = offset.min(len);
        let end = start.saturating_add(u64::from(size)).min(len);
        Ok(ReplyData {
            data: data.slice(start as usize..end as usize),
        })
    }

    async fn readdir(&self, path: &str, filler: &mut DirFiller<'_>) -> FuseResult<()> {
        debug!(path, "readdir");
        let tree = self.tree.lock().await;
        let index = tree.lookup(path).map_err(|e| e.errno())?;
        let children = tree
            .node(index)
            .children()
            .ok_or_else(|| FsError::NotADirectory(path.into()).errno())?;

        if !filler(".", None) || !filler("..", None) {
            return Ok(());
        }
        for (name, &child) in children {
            if !filler(name, Some(&tree.node(child).attr)) {
                break;
            }
        }
        Ok(())
    }

    async fn listxattr(&self, path: &str, filler: &mut XattrFiller<'_>) -> FuseResult<()> {
        debug!(path, "listxattr");
        let tree = self.tree.lock().await;
        let index = tree.lookup(path).map_err(|e| e.errno())?;
        for name in tree.node(index).xattrs.keys() {
            if !filler(name) {
                return Err(FsError::ListTooLarge.errno());
            }
        }
        Ok(())
    }

    async fn getxattr(&self, path: &str, name: &str) -> FuseResult<ReplyXattr> {
        debug!(path, name, "getxattr");
        let tree = self.tree.lock().await;
        let index = tree.lookup(path).map_err(|e| e.errno())?;
        tree.node(index)
            .xattrs
            .get(name)
            .map(|value| ReplyXattr {
                data: value.clone(),
            })
            .ok_or_else(|| FsError::AttributeNotFound(name.into()).errno())
    }
}
