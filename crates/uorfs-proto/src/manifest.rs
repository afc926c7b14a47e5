//! Manifest schemas and successor extraction.
//!
//! Image manifests (OCI and Docker schema 2) point at a config and layers,
//! indexes (OCI index, Docker manifest list) at child manifests, and ORAS
//! artifact manifests at an optional subject and blobs. All of them are
//! normalized to a flat list of [`Descriptor`]s.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::descriptor::Descriptor;
use crate::error::ProtoError;
use crate::media_type;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageManifest {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    pub config: Descriptor,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactManifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(default)]
    pub blobs: Vec<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

fn decode<'a, T: Deserialize<'a>>(media_type: &str, content: &'a [u8]) -> Result<T, ProtoError> {
    serde_json::from_slice(content).map_err(|source| ProtoError::Manifest {
        media_type: media_type.to_string(),
        source,
    })
}

/// Direct successors of a node with the given media type and content.
///
/// Non-manifest media types have no successors.
pub fn successors(media_type: &str, content: &[u8]) -> Result<Vec<Descriptor>, ProtoError> {
    match media_type {
        media_type::OCI_MANIFEST | media_type::DOCKER_MANIFEST => {
            let manifest: ImageManifest = decode(media_type, content)?;
            let mut out = Vec::with_capacity(manifest.layers.len() + 1);
            out.push(manifest.config);
            out.extend(manifest.layers);
            Ok(out)
        }
        media_type::OCI_INDEX | media_type::DOCKER_MANIFEST_LIST => {
            let index: ImageIndex = decode(media_type, content)?;
            Ok(index.manifests)
        }
        media_type::ARTIFACT_MANIFEST => {
            let manifest: ArtifactManifest = decode(media_type, content)?;
            let mut out = Vec::with_capacity(manifest.blobs.len() + 1);
            out.extend(manifest.subject);
            out.extend(manifest.blobs);
            Ok(out)
        }
        _ => Ok(Vec::new()),
    }
}
