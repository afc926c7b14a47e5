//! Registry access for uorfs.
//!
//! `RegistryClient` is the contract the filesystem consumes: resolve a
//! reference to its root manifest, load the whole descriptor graph behind it
//! and fetch the content of single descriptors. `OciLayoutClient` serves
//! these from an OCI image layout on local disk. An in-memory implementation
//! for tests lives in `uorfs-stubs`.

pub mod collection;
pub mod digest;
pub mod error;
pub mod layout;
pub mod matcher;
pub mod registry;

pub use collection::{Collection, CollectionNode};
pub use error::{ClientError, ClientResult};
pub use layout::OciLayoutClient;
pub use matcher::{AttributeQuery, Matcher, PartialAttributeMatcher};
pub use registry::RegistryClient;
