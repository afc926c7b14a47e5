//! In-memory registry.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use uorfs_proto::{media_type, Descriptor};

use uorfs_client::{digest, ClientError, ClientResult, RegistryClient};

/// A configurable in-memory [`RegistryClient`].
///
/// Blobs are stored by digest, references map to root manifests. Content
/// fetches are counted per digest and can be made to fail or to stall.
#[derive(Default)]
pub struct MockRegistry {
    blobs: Mutex<HashMap<String, Bytes>>,
    tags: Mutex<HashMap<String, Descriptor>>,
    failing: Mutex<HashSet<String>>,
    fetches: Mutex<HashMap<String, usize>>,
    fetch_delay: Mutex<Option<Duration>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `content` and returns a descriptor for it.
    pub fn add_blob(&self, media_type: &str, content: impl Into<Bytes>) -> Descriptor {
        let content = content.into();
        let desc = Descriptor::new(media_type, digest::sha256(&content), content.len() as u64);
        self.blobs.lock().insert(desc.digest.clone(), content);
        desc
    }

    /// Stores a file blob annotated with `title` and the given attributes.
    pub fn add_file(&self, title: &str, content: &[u8], attributes: serde_json::Value) -> Descriptor {
        let mut desc = self
            .add_blob("application/octet-stream", Bytes::copy_from_slice(content))
            .with_annotation(media_type::ANNOTATION_TITLE, title);
        if attributes.as_object().map_or(false, |o| !o.is_empty()) {
            desc = desc.with_annotation(media_type::ANNOTATION_UOR_ATTRIBUTES, attributes.to_string());
        }
        desc
    }

    /// Stores an OCI image manifest over `config` and `layers`.
    pub fn add_manifest(&self, config: &Descriptor, layers: &[Descriptor]) -> Descriptor {
        let json = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": media_type::OCI_MANIFEST,
            "config": config,
            "layers": layers,
        });
        self.add_blob(media_type::OCI_MANIFEST, json.to_string())
    }

    /// Stores an OCI index over `manifests`.
    pub fn add_index(&self, manifests: &[Descriptor]) -> Descriptor {
        let json = serde_json::json!({
            "schemaVersion": 2,
            "mediaType": media_type::OCI_INDEX,
            "manifests": manifests,
        });
        self.add_blob(media_type::OCI_INDEX, json.to_string())
    }

    /// Stores a UOR collection: a manifest with a UOR config and `files`.
    pub fn add_collection(&self, reference: &str, files: &[Descriptor]) -> Descriptor {
        let config = self.add_blob(media_type::UOR_CONFIG, "{}");
        let manifest = self.add_manifest(&config, files);
        self.tag(reference, manifest.clone());
        manifest
    }

    pub fn tag(&self, reference: &str, manifest: Descriptor) {
        self.tags.lock().insert(reference.to_string(), manifest);
    }

    /// Makes every content fetch of `digest` fail.
    pub fn fail_content(&self, digest: &str) {
        self.failing.lock().insert(digest.to_string());
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Number of `get_content` calls made for `digest`.
    pub fn fetch_count(&self, digest: &str) -> usize {
        self.fetches.lock().get(digest).copied().unwrap_or(0)
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    async fn get_manifest(&self, reference: &str) -> ClientResult<(Descriptor, Bytes)> {
        let desc = self
            .tags
            .lock()
            .get(reference)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(reference.to_string()))?;
        let content = self
            .blobs
            .lock()
            .get(&desc.digest)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(desc.digest.clone()))?;
        Ok((desc, content))
    }

    async fn get_content(&self, _reference: &str, descriptor: &Descriptor) -> ClientResult<Bytes> {
        *self
            .fetches
            .lock()
            .entry(descriptor.digest.clone())
            .or_default() += 1;
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().contains(&descriptor.digest) {
            return Err(ClientError::Unsupported(format!(
                "injected failure for {}",
                descriptor.digest
            )));
        }
        self.blobs
            .lock()
            .get(&descriptor.digest)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(descriptor.digest.clone()))
    }
}
