//! uorfs-fuse: a read-only filesystem over a UOR artifact collection.
//!
//! # Architecture
//!
//! - **[`loader`]** resolves a reference through a
//!   [`RegistryClient`](uorfs_client::RegistryClient), walks the manifest
//!   graph and applies the attribute filter.
//! - **[`builder`]** turns the resulting descriptors into files in the
//!   [`node`] tree, named by their title annotation and carrying their
//!   attributes as extended attributes.
//! - **[`cache`]** holds fetched file content until it has been idle for a
//!   while.
//! - **[`filesystem`]** is `UorFileSystem`, the [`FuseOps`] implementation
//!   serving getattr, open, read, readdir, listxattr and getxattr.
//! - **`mount`** (feature `fuse`) attaches `UorFileSystem` to the kernel
//!   through the `fuser` crate.
//!
//! Because [`FuseOps`] is a plain async trait, everything except the kernel
//! mount can be exercised by direct calls.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod loader;
#[cfg(feature = "fuse")]
pub mod mount;
pub mod node;
pub mod ops;
pub mod reply;
pub mod types;

pub use cache::DecayCache;
pub use config::{ConfigError, UorfsConfig};
pub use error::FsError;
pub use filesystem::UorFileSystem;
pub use node::NodeTree;
pub use ops::FuseOps;
pub use reply::FuseResult;
pub use types::FileAttr;
