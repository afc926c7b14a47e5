use async_trait::async_trait;
use bytes::Bytes;
use uorfs_proto::Descriptor;

use crate::collection::Collection;
use crate::error::ClientResult;

/// Read access to a content-addressable artifact registry.
#[async_trait]
pub trait RegistryClient: Send + Sync + 'static {
    /// Resolves `reference` to its root manifest descriptor and bytes.
    async fn get_manifest(&self, reference: &str) -> ClientResult<(Descriptor, Bytes)>;

    /// Fetches the content of `descriptor` from the repository named by
    /// `reference`.
    async fn get_content(&self, reference: &str, descriptor: &Descriptor) -> ClientResult<Bytes>;

    /// Loads the full successor graph reachable from `reference`.
    async fn load_collection(&self, reference: &str) -> ClientResult<Collection> {
        let (root, content) = self.get_manifest(reference).await?;
        Collection::walk(reference, root, content, |desc| async move {
            self.get_content(reference, &desc).await
        })
        .await
    }
}
