//! Attribute matching.

use serde::Deserialize;
use std::path::Path;
use uorfs_proto::AttributeSet;

use crate::collection::CollectionNode;
use crate::error::{ClientError, ClientResult};

/// Predicate deciding whether a leaf node is visible.
pub trait Matcher: Send + Sync {
    fn matches(&self, node: &CollectionNode) -> ClientResult<bool>;
}

/// Matches nodes carrying every queried attribute with an equal value.
///
/// An empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialAttributeMatcher {
    query: AttributeSet,
}

impl PartialAttributeMatcher {
    pub fn new(query: AttributeSet) -> Self {
        Self { query }
    }

    pub fn query(&self) -> &AttributeSet {
        &self.query
    }
}

impl Matcher for PartialAttributeMatcher {
    fn matches(&self, node: &CollectionNode) -> ClientResult<bool> {
        Ok(node.attributes.contains_all(&self.query))
    }
}

/// On-disk attribute query: `{"attributes": {"key": value, ...}}`.
#[derive(Debug, Deserialize)]
pub struct AttributeQuery {
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl AttributeQuery {
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let content = std::fs::read(path).map_err(|e| ClientError::io(path, e))?;
        Ok(serde_json::from_slice(&content)?)
    }

    pub fn into_matcher(self) -> ClientResult<PartialAttributeMatcher> {
        Ok(PartialAttributeMatcher::new(AttributeSet::from_json_map(
            self.attributes,
        )?))
    }
}
