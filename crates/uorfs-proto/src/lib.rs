//! Content descriptors and manifest schemas for UOR collections.
//!
//! Based on the OCI image spec (descriptor, manifest, index), the Docker
//! schema-2 equivalents and the ORAS artifact manifest. Only the fields that
//! matter for walking a collection graph are modeled; unknown JSON fields are
//! ignored.

pub mod attributes;
pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod media_type;

pub use attributes::{AttributeSet, AttributeValue};
pub use descriptor::Descriptor;
pub use error::ProtoError;
pub use manifest::{successors, ArtifactManifest, ImageIndex, ImageManifest};
