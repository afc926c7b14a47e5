//! Resolves a reference to the filtered set of descriptors to expose.

use tracing::{debug, info};
use uorfs_client::{ClientResult, Matcher, RegistryClient};
use uorfs_proto::{media_type, successors, Descriptor};

/// Loads the descriptor graph behind `reference`, filtered by `matcher`.
///
/// With a matcher, manifests that have successors and structural leaves
/// (schema, image config, UOR config) are always kept so the graph stays
/// connected; other leaves are kept only when the matcher accepts them. If
/// no leaf is accepted the result is empty, which is not an error.
pub async fn load(
    client: &dyn RegistryClient,
    reference: &str,
    matcher: Option<&dyn Matcher>,
) -> ClientResult<Vec<Descriptor>> {
    let (root, content) = client.get_manifest(reference).await?;
    let direct = successors(&root.media_type, &content)?;
    debug!(
        reference,
        digest = %root.digest,
        media_type = %root.media_type,
        successors = direct.len(),
        "resolved root manifest"
    );

    let graph = client.load_collection(reference).await?;

    let Some(matcher) = matcher else {
        return Ok(graph.descriptors());
    };

    let mut matched = 0usize;
    let filtered = graph.sub_collection(|node| {
        if !graph.edges_from(&node.id).is_empty() {
            return Ok(true);
        }
        if media_type::is_structural_leaf(&node.descriptor.media_type) {
            return Ok(true);
        }
        let accepted = matcher.matches(node)?;
        if accepted {
            matched += 1;
        }
        Ok(accepted)
    })?;

    if matched == 0 {
        info!(reference, "no content matched the attribute query");
        return Ok(Vec::new());
    }
    debug!(reference, matched, kept = filtered.len(), "filtered collection");
    Ok(filtered.descriptors())
}
