//! In-memory implementations of the uorfs client contracts.
//!
//! `MockRegistry` stands in for a registry in unit and integration tests:
//! it serves manifests and blobs from memory, counts fetches and can inject
//! failures or latency.

pub mod registry_stub;

pub use registry_stub::MockRegistry;
