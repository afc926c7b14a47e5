//! Populates the node tree from loaded descriptors.

use std::collections::BTreeMap;

use tracing::{error, warn};
use uorfs_proto::{media_type, AttributeSet, Descriptor};

use crate::error::FsError;
use crate::node::NodeTree;

pub const XATTR_DIGEST: &str = "user.uor.Digest";
pub const XATTR_MEDIA_TYPE: &str = "user.uor.MediaType";
/// Prefix for per-attribute extended attributes; the key follows it.
pub const XATTR_ATTRIBUTE_PREFIX: &str = "user.uor.attributes.";

/// Outcome of one [`populate`] pass.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub inserted: usize,
    /// Structural descriptors and descriptors without annotations.
    pub skipped: usize,
    /// Descriptors that could not become files, by digest.
    pub failures: Vec<(String, FsError)>,
}

/// Adds a file for every content descriptor in `descriptors`.
///
/// Failures are per descriptor: they are logged and recorded in the report
/// and the remaining descriptors are still inserted.
pub fn populate(tree: &mut NodeTree, descriptors: &[Descriptor]) -> BuildReport {
    let mut report = BuildReport::default();
    for desc in descriptors {
        if media_type::is_hidden(&desc.media_type) {
            report.skipped += 1;
            continue;
        }
        let Some(annotations) = &desc.annotations else {
            warn!(digest = %desc.digest, "descriptor has no annotations, ignoring");
            report.skipped += 1;
            continue;
        };
        match insert_descriptor(tree, desc, annotations) {
            Ok(()) => report.inserted += 1,
            Err(e) => {
                warn!(digest = %desc.digest, error = %e, "failed to add file");
                report.failures.push((desc.digest.clone(), e));
            }
        }
    }
    report
}

fn insert_descriptor(
    tree: &mut NodeTree,
    desc: &Descriptor,
    annotations: &BTreeMap<String, String>,
) -> Result<(), FsError> {
    let attributes = AttributeSet::from_annotations(annotations, |_| false)?;
    let title = attributes.find_str(media_type::ANNOTATION_TITLE)?;
    let xattrs = xattrs_for(desc, &attributes);
    tree.insert_file(title, desc.clone(), xattrs)?;
    Ok(())
}

fn xattrs_for(desc: &Descriptor, attributes: &AttributeSet) -> BTreeMap<String, Vec<u8>> {
    let mut xattrs = BTreeMap::new();
    xattrs.insert(XATTR_DIGEST.to_string(), desc.digest.as_bytes().to_vec());
    if !desc.media_type.is_empty() {
        xattrs.insert(
            XATTR_MEDIA_TYPE.to_string(),
            desc.media_type.as_bytes().to_vec(),
        );
    }
    for (key, value) in attributes.iter() {
        if key == media_type::ANNOTATION_TITLE {
            continue;
        }
        match value.to_json() {
            Ok(json) => {
                xattrs.insert(format!("{XATTR_ATTRIBUTE_PREFIX}{key}"), json);
            }
            Err(e) => error!(key = %key, error = %e, "unencodable attribute value"),
        }
    }
    xattrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use uorfs_proto::ProtoError;
    use uorfs_types::{Gid, Uid};

    fn tree() -> NodeTree {
        NodeTree::new(Uid(0), Gid(0))
    }

    fn file(digest: &str, title: &str) -> Descriptor {
        Descriptor::new("text/plain", digest, 4)
            .with_annotation(media_type::ANNOTATION_TITLE, title)
    }

    #[test]
    fn test_attribute_round_trip() {
        let mut tree = tree();
        let desc = file("sha256:ab", "a/b.txt").with_annotation("foo", "bar");
        let report = populate(&mut tree, &[desc]);
        assert_eq!(report.inserted, 1);

        let node = tree.node(tree.lookup("a/b.txt").unwrap());
        assert_eq!(node.xattrs[XATTR_DIGEST], b"sha256:ab");
        assert_eq!(node.xattrs[XATTR_MEDIA_TYPE], b"text/plain");
        let foo: String =
            serde_json::from_slice(&node.xattrs["user.uor.attributes.foo"]).unwrap();
        assert_eq!(foo, "bar");
        assert!(!node
            .xattrs
            .contains_key("user.uor.attributes.org.opencontainers.image.title"));
    }

    #[test]
    fn test_typed_attributes_encode_as_json() {
        let mut tree = tree();
        let desc = file("sha256:cd", "data.bin")
            .with_annotation("uor.attributes", r#"{"size": 3, "ok": true}"#);
        populate(&mut tree, &[desc]);
        let node = tree.node(tree.lookup("data.bin").unwrap());
        assert_eq!(node.xattrs["user.uor.attributes.size"], b"3");
        assert_eq!(node.xattrs["user.uor.attributes.ok"], b"true");
    }

    #[test]
    fn test_skips_structural_and_unannotated() {
        let mut tree = tree();
        let descs = [
            Descriptor::new(media_type::OCI_MANIFEST, "sha256:m", 1)
                .with_annotation(media_type::ANNOTATION_TITLE, "manifest"),
            Descriptor::new(media_type::UOR_CONFIG, "sha256:c", 1),
            Descriptor::new(media_type::UOR_SCHEMA, "sha256:s", 1),
            Descriptor::new("text/plain", "sha256:bare", 1),
            file("sha256:f", "kept"),
        ];
        let report = populate(&mut tree, &descs);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.skipped, 4);
        assert!(report.failures.is_empty());
        assert!(tree.lookup("manifest").is_err());
        tree.lookup("kept").unwrap();
    }

    #[test]
    fn test_missing_title_fails_only_that_descriptor() {
        let mut tree = tree();
        let untitled = Descriptor::new("text/plain", "sha256:u", 1).with_annotation("foo", "bar");
        let report = populate(&mut tree, &[untitled, file("sha256:t", "titled")]);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.failures.len(), 1);
        let (digest, err) = &report.failures[0];
        assert_eq!(digest, "sha256:u");
        assert!(matches!(
            err,
            FsError::Build(ProtoError::AttributeNotFound(_))
        ));
    }

    #[test]
    fn test_empty_media_type_has_no_media_type_xattr() {
        let mut tree = tree();
        let mut desc = file("sha256:e", "empty");
        desc.media_type.clear();
        populate(&mut tree, &[desc]);
        let node = tree.node(tree.lookup("empty").unwrap());
        assert!(!node.xattrs.contains_key(XATTR_MEDIA_TYPE));
        assert!(node.xattrs.contains_key(XATTR_DIGEST));
    }
}
