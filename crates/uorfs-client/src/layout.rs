//! Registry client over an OCI image layout directory.
//!
//! References take the form `<dir>:<tag>` or `<dir>@<digest>`; a bare
//! `<dir>` means tag `latest`. Tags are looked up through the
//! `org.opencontainers.image.ref.name` annotation in `<dir>/index.json` and
//! blobs live at `<dir>/blobs/<algorithm>/<hex>`. Every blob read is checked
//! against its descriptor's size and digest.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uorfs_proto::media_type::{self, ANNOTATION_REF_NAME};
use uorfs_proto::{Descriptor, ImageIndex};

use crate::digest;
use crate::error::{ClientError, ClientResult};
use crate::registry::RegistryClient;

const DEFAULT_TAG: &str = "latest";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Tag(String),
    Digest(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LayoutRef {
    dir: PathBuf,
    target: Target,
}

impl LayoutRef {
    fn parse(reference: &str) -> ClientResult<Self> {
        let invalid = || ClientError::InvalidReference(reference.to_string());
        let (dir, target) = if let Some((dir, d)) = reference.rsplit_once('@') {
            digest::parse(d)?;
            (dir, Target::Digest(d.to_string()))
        } else {
            match reference.rsplit_once(':') {
                Some((dir, tag)) if !tag.contains('/') => {
                    if tag.is_empty() {
                        return Err(invalid());
                    }
                    (dir, Target::Tag(tag.to_string()))
                }
                _ => (reference, Target::Tag(DEFAULT_TAG.to_string())),
            }
        };
        if dir.is_empty() {
            return Err(invalid());
        }
        Ok(LayoutRef {
            dir: PathBuf::from(dir),
            target,
        })
    }
}

/// Only the media type is needed to classify an untracked manifest blob.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MediaTypeProbe {
    #[serde(default)]
    media_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OciLayoutClient;

impl OciLayoutClient {
    pub fn new() -> Self {
        Self
    }

    async fn read_index(dir: &Path) -> ClientResult<ImageIndex> {
        let path = dir.join("index.json");
        let content = tokio::fs::read(&path)
            .await
            .map_err(|e| ClientError::io(&path, e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    async fn read_blob(dir: &Path, digest_str: &str) -> ClientResult<Bytes> {
        let (algorithm, encoded) = digest::parse(digest_str)?;
        let path = dir.join("blobs").join(algorithm).join(encoded);
        match tokio::fs::read(&path).await {
            Ok(content) => Ok(Bytes::from(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ClientError::NotFound(digest_str.to_string()))
            }
            Err(e) => Err(ClientError::io(&path, e)),
        }
    }

    async fn read_verified(dir: &Path, desc: &Descriptor) -> ClientResult<Bytes> {
        let content = Self::read_blob(dir, &desc.digest).await?;
        if content.len() as u64 != desc.size {
            return Err(ClientError::SizeMismatch {
                digest: desc.digest.clone(),
                expected: desc.size,
                actual: content.len() as u64,
            });
        }
        digest::verify(&desc.digest, &content)?;
        Ok(content)
    }
}

#[async_trait]
impl RegistryClient for OciLayoutClient {
    async fn get_manifest(&self, reference: &str) -> ClientResult<(Descriptor, Bytes)> {
        let layout = LayoutRef::parse(reference)?;
        let index = Self::read_index(&layout.dir).await?;
        let found = index.manifests.into_iter().find(|m| match &layout.target {
            Target::Tag(tag) => m.annotation(ANNOTATION_REF_NAME) == Some(tag.as_str()),
            Target::Digest(d) => &m.digest == d,
        });

        let desc = match (found, &layout.target) {
            (Some(desc), _) => desc,
            (None, Target::Digest(d)) => {
                // Not listed in index.json; classify the blob by its content.
                let content = Self::read_blob(&layout.dir, d).await?;
                digest::verify(d, &content)?;
                let probe: MediaTypeProbe = serde_json::from_slice(&content)?;
                let mt = probe
                    .media_type
                    .unwrap_or_else(|| media_type::OCI_MANIFEST.to_string());
                return Ok((Descriptor::new(mt, d.clone(), content.len() as u64), content));
            }
            (None, Target::Tag(_)) => return Err(ClientError::NotFound(reference.to_string())),
        };

        let content = Self::read_verified(&layout.dir, &desc).await?;
        tracing::debug!(reference, digest = %desc.digest, "resolved manifest");
        Ok((desc, content))
    }

    async fn get_content(&self, reference: &str, descriptor: &Descriptor) -> ClientResult<Bytes> {
        let layout = LayoutRef::parse(reference)?;
        Self::read_verified(&layout.dir, descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_blob(dir: &Path, content: &[u8]) -> String {
        let d = digest::sha256(content);
        let (_, hex) = d.split_once(':').unwrap();
        let blobs = dir.join("blobs").join("sha256");
        std::fs::create_dir_all(&blobs).unwrap();
        std::fs::write(blobs.join(hex), content).unwrap();
        d
    }

    /// Layout with one tagged manifest holding a single text layer.
    fn make_layout(dir: &Path) -> (Descriptor, Descriptor) {
        let layer_bytes = b"hello layout";
        let layer = Descriptor::new("text/plain", write_blob(dir, layer_bytes), 12)
            .with_annotation("org.opencontainers.image.title", "hello.txt");
        let config = Descriptor::new(media_type::UOR_CONFIG, write_blob(dir, b"{}"), 2);
        let manifest = serde_json::to_vec(&serde_json::json!({
            "schemaVersion": 2,
            "mediaType": media_type::OCI_MANIFEST,
            "config": config,
            "layers": [layer],
        }))
        .unwrap();
        let manifest_desc = Descriptor::new(
            media_type::OCI_MANIFEST,
            write_blob(dir, &manifest),
            manifest.len() as u64,
        )
        .with_annotation(ANNOTATION_REF_NAME, "v1");
        let index = serde_json::json!({"schemaVersion": 2, "manifests": [manifest_desc]});
        std::fs::write(dir.join("index.json"), serde_json::to_vec(&index).unwrap()).unwrap();
        (manifest_desc, layer)
    }

    #[test]
    fn test_parse_reference() {
        let r = LayoutRef::parse("/tmp/layout:v1").unwrap();
        assert_eq!(r.dir, PathBuf::from("/tmp/layout"));
        assert_eq!(r.target, Target::Tag("v1".into()));

        let r = LayoutRef::parse("./dir").unwrap();
        assert_eq!(r.target, Target::Tag(DEFAULT_TAG.into()));

        let d = digest::sha256(b"x");
        let r = LayoutRef::parse(&format!("layout@{d}")).unwrap();
        assert_eq!(r.target, Target::Digest(d));

        assert!(LayoutRef::parse(":v1").is_err());
        assert!(LayoutRef::parse("dir:").is_err());
        assert!(LayoutRef::parse("dir@sha256:bad").is_err());
    }

    #[tokio::test]
    async fn test_get_manifest_by_tag_and_digest() {
        let tmp = tempfile::tempdir().unwrap();
        let (manifest_desc, _) = make_layout(tmp.path());
        let client = OciLayoutClient::new();
        let dir = tmp.path().display();

        let (desc, content) = client.get_manifest(&format!("{dir}:v1")).await.unwrap();
        assert_eq!(desc.digest, manifest_desc.digest);
        assert_eq!(content.len() as u64, desc.size);

        let (desc, _) = client
            .get_manifest(&format!("{dir}@{}", manifest_desc.digest))
            .await
            .unwrap();
        assert_eq!(desc.media_type, media_type::OCI_MANIFEST);

        let err = client.get_manifest(&format!("{dir}:v2")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_load_collection_and_content() {
        let tmp = tempfile::tempdir().unwrap();
        let (_, layer) = make_layout(tmp.path());
        let client = OciLayoutClient::new();
        let reference = format!("{}:v1", tmp.path().display());

        let graph = client.load_collection(&reference).await.unwrap();
        assert_eq!(graph.len(), 3);

        let content = client.get_content(&reference, &layer).await.unwrap();
        assert_eq!(&content[..], b"hello layout");
    }

    #[tokio::test]
    async fn test_content_verification() {
        let tmp = tempfile::tempdir().unwrap();
        let (_, layer) = make_layout(tmp.path());
        let client = OciLayoutClient::new();
        let reference = format!("{}:v1", tmp.path().display());

        let mut wrong_size = layer.clone();
        wrong_size.size = 3;
        let err = client.get_content(&reference, &wrong_size).await.unwrap_err();
        assert!(matches!(err, ClientError::SizeMismatch { .. }));

        let (_, hex) = layer.digest.split_once(':').unwrap();
        std::fs::write(tmp.path().join("blobs/sha256").join(hex), b"tampered!!!!").unwrap();
        let err = client.get_content(&reference, &layer).await.unwrap_err();
        assert!(matches!(err, ClientError::DigestMismatch { .. }));

        let missing = Descriptor::new("text/plain", digest::sha256(b"absent"), 6);
        let err = client.get_content(&reference, &missing).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }
}
