use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::media_type;

/// Content-addressable reference to a blob or manifest.
///
/// `annotations` distinguishes an absent map from an empty one: descriptors
/// without any annotations carry no derivable file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    #[serde(default)]
    pub media_type: String,
    pub digest: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<BTreeMap<String, String>>,
}

impl Descriptor {
    pub fn new(media_type: impl Into<String>, digest: impl Into<String>, size: u64) -> Self {
        Self {
            media_type: media_type.into(),
            digest: digest.into(),
            size,
            urls: Vec::new(),
            annotations: None,
        }
    }

    /// Builder-style helper to attach one annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.as_ref()?.get(key).map(String::as_str)
    }

    pub fn is_manifest(&self) -> bool {
        media_type::is_manifest(&self.media_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_json() {
        let json = r#"{
            "mediaType": "text/plain",
            "digest": "sha256:abcd",
            "size": 12,
            "annotations": {"org.opencontainers.image.title": "hello.txt"},
            "artifactType": "ignored"
        }"#;
        let desc: Descriptor = serde_json::from_str(json).unwrap();
        assert_eq!(desc.media_type, "text/plain");
        assert_eq!(desc.size, 12);
        assert_eq!(desc.annotation(media_type::ANNOTATION_TITLE), Some("hello.txt"));
        assert!(desc.urls.is_empty());

        let out = serde_json::to_value(&desc).unwrap();
        assert_eq!(out["mediaType"], "text/plain");
        assert!(out.get("urls").is_none());
    }

    #[test]
    fn test_missing_annotations_stay_none() {
        let desc: Descriptor =
            serde_json::from_str(r#"{"mediaType":"a","digest":"sha256:00","size":1}"#).unwrap();
        assert!(desc.annotations.is_none());
        assert_eq!(desc.annotation(media_type::ANNOTATION_TITLE), None);
    }

    #[test]
    fn test_with_annotation() {
        let desc = Descriptor::new("text/plain", "sha256:11", 3).with_annotation("k", "v");
        assert_eq!(desc.annotation("k"), Some("v"));
        assert!(!desc.is_manifest());
    }
}
