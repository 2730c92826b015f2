//! Merging colocated candidates with fallback nodes.

use tandem_topology::Datanode;

/// Candidates first, then `fallback`, cut to `replicas` entries.
///
/// Nodes are not deduplicated across the two inputs.
pub fn compose_targets<I>(candidates: I, fallback: &[Datanode], replicas: usize) -> Vec<Datanode>
where
    I: IntoIterator<Item = Datanode>,
{
    candidates
        .into_iter()
        .chain(fallback.iter().cloned())
        .take(replicas)
        .collect()
}
