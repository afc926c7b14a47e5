//! Media type and annotation constants.

pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
pub const OCI_INDEX: &str = "application/vnd.oci.image.index.v1+json";
pub const OCI_CONFIG: &str = "application/vnd.oci.image.config.v1+json";
pub const DOCKER_MANIFEST: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const DOCKER_MANIFEST_LIST: &str =
    "application/vnd.docker.distribution.manifest.list.v2+json";
pub const ARTIFACT_MANIFEST: &str = "application/vnd.cncf.oras.artifact.manifest.v1+json";
pub const UOR_SCHEMA: &str = "application/vnd.uor.schema.v1+json";
pub const UOR_CONFIG: &str = "application/vnd.uor.config.v1+json";

/// Annotation carrying a file's path inside the collection.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";
/// Annotation whose value is a JSON object of typed attributes.
pub const ANNOTATION_UOR_ATTRIBUTES: &str = "uor.attributes";
/// Annotation naming a manifest inside an OCI layout `index.json`.
pub const ANNOTATION_REF_NAME: &str = "org.opencontainers.image.ref.name";

/// Returns true for media types whose content lists further descriptors.
pub fn is_manifest(media_type: &str) -> bool {
    matches!(
        media_type,
        OCI_MANIFEST | OCI_INDEX | DOCKER_MANIFEST | DOCKER_MANIFEST_LIST | ARTIFACT_MANIFEST
    )
}

/// Structural leaves: kept by attribute filtering regardless of the query.
pub fn is_structural_leaf(media_type: &str) -> bool {
    matches!(media_type, UOR_SCHEMA | OCI_CONFIG | UOR_CONFIG)
}

/// Media types that never become files in the mounted tree.
pub fn is_hidden(media_type: &str) -> bool {
    is_structural_leaf(media_type) || is_manifest(media_type)
}
