//! In-memory descriptor graph.

use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use uorfs_proto::{successors, AttributeSet, Descriptor};

use crate::error::ClientResult;

/// One descriptor in a collection, keyed by its digest.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionNode {
    pub id: String,
    pub descriptor: Descriptor,
    pub attributes: AttributeSet,
}

impl CollectionNode {
    pub fn new(descriptor: Descriptor) -> ClientResult<Self> {
        let attributes = match &descriptor.annotations {
            Some(annotations) => AttributeSet::from_annotations(annotations, |_| false)?,
            None => AttributeSet::new(),
        };
        Ok(Self {
            id: descriptor.digest.clone(),
            descriptor,
            attributes,
        })
    }
}

/// Directed graph of descriptors. Node order is insertion (traversal) order.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    nodes: Vec<CollectionNode>,
    index: HashMap<String, usize>,
    edges: HashMap<String, Vec<String>>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Breadth-first walk from `root`, expanding manifests through `fetch`.
    ///
    /// Each digest is visited once even when several manifests point at it.
    /// Only manifest media types are fetched; leaves are recorded as-is.
    pub async fn walk<F, Fut>(
        reference: &str,
        root: Descriptor,
        root_content: Bytes,
        mut fetch: F,
    ) -> ClientResult<Collection>
    where
        F: FnMut(Descriptor) -> Fut,
        Fut: Future<Output = ClientResult<Bytes>>,
    {
        tracing::debug!(reference, root = %root.digest, "walking collection");
        let mut graph = Collection::new();
        let mut queue = VecDeque::new();
        graph.add_node(CollectionNode::new(root.clone())?);
        queue.push_back((root, Some(root_content)));

        while let Some((desc, content)) = queue.pop_front() {
            if !desc.is_manifest() {
                continue;
            }
            let content = match content {
                Some(content) => content,
                None => fetch(desc.clone()).await?,
            };
            for child in successors(&desc.media_type, &content)? {
                graph.add_edge(&desc.digest, &child.digest);
                if graph.add_node(CollectionNode::new(child.clone())?) {
                    queue.push_back((child, None));
                }
            }
        }
        tracing::debug!(reference, nodes = graph.len(), "collection loaded");
        Ok(graph)
    }

    /// Adds `node` unless its id is already present. Returns true if added.
    pub fn add_node(&mut self, node: CollectionNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        true
    }

    pub fn add_edge(&mut self, from: &str, to: &str) {
        let targets = self.edges.entry(from.to_string()).or_default();
        if !targets.iter().any(|t| t == to) {
            targets.push(to.to_string());
        }
    }

    pub fn node(&self, id: &str) -> Option<&CollectionNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn nodes(&self) -> &[CollectionNode] {
        &self.nodes
    }

    /// Ids of the direct successors of `id`.
    pub fn edges_from(&self, id: &str) -> &[String] {
        self.edges.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Descriptors of all nodes, in traversal order.
    pub fn descriptors(&self) -> Vec<Descriptor> {
        self.nodes.iter().map(|n| n.descriptor.clone()).collect()
    }

    /// Keeps the nodes accepted by `keep` and the edges between them.
    ///
    /// `keep` sees the nodes in traversal order; its first error aborts.
    pub fn sub_collection<F>(&self, mut keep: F) -> ClientResult<Collection>
    where
        F: FnMut(&CollectionNode) -> ClientResult<bool>,
    {
        let mut sub = Collection::new();
        for node in &self.nodes {
            if keep(node)? {
                sub.add_node(node.clone());
            }
        }
        for (from, targets) in &self.edges {
            if sub.index.contains_key(from) {
                let kept: Vec<&String> = targets
                    .iter()
                    .filter(|t| sub.index.contains_key(*t))
                    .collect();
                for to in kept {
                    sub.add_edge(from, to);
                }
            }
        }
        Ok(sub)
    }
}
