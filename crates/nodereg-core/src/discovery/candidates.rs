// # Candidate Building
//
// Expands a set of seed addresses into the deduplicated union of the seeds
// and every peer those seeds report.
//
// ## Failure Containment
//
// A seed whose own query fails is still retained as a candidate: the `{seed}`
// term never depends on the query outcome. Total network failure therefore
// degrades to "candidates = original list", not to the empty set, which
// bounds the catastrophic-forgetting failure mode.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::traits::{AddressSet, NodeAddr, NodeQuery};

/// Expand a single seed into `{seed} ∪ peer_addresses(seed)`.
///
/// A failed or malformed peer query is logged and treated as "no peers
/// learned". A single bad peer must never abort discovery for the whole
/// list.
pub async fn discover_candidates(seed: &NodeAddr, query: &dyn NodeQuery) -> AddressSet {
    let mut candidates = AddressSet::new();
    candidates.insert(seed.clone());

    match query.peer_addresses(seed).await {
        Ok(peers) => {
            debug!("seed {} reported {} peer(s)", seed, peers.len());
            candidates.extend(peers);
        }
        Err(e) => {
            warn!("peer query for seed {} failed, learning no peers: {}", seed, e);
        }
    }

    candidates
}

/// Expand a whole seed list: the union of [`discover_candidates`] applied to
/// every seed.
///
/// Queries fan out concurrently, bounded by `limit`. The union is symmetric
/// and associative, so completion order does not affect the result.
pub async fn discover_candidates_for_list(
    seeds: &AddressSet,
    query: Arc<dyn NodeQuery>,
    limit: Arc<Semaphore>,
) -> AddressSet {
    let mut tasks = JoinSet::new();

    for seed in seeds {
        let seed = seed.clone();
        let query = Arc::clone(&query);
        let limit = Arc::clone(&limit);

        tasks.spawn(async move {
            // A closed semaphore means the bound is gone: skip the query
            // rather than run it unbounded, keeping the seed itself
            let Ok(_permit) = limit.acquire_owned().await else {
                warn!("query limit closed, learning no peers from {}", seed);
                return [seed].into_iter().collect();
            };
            discover_candidates(&seed, query.as_ref()).await
        });
    }

    let mut candidates = AddressSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(set) => candidates.extend(set),
            Err(e) => warn!("discovery task failed to join: {}", e),
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedQuery;

    #[async_trait]
    impl NodeQuery for ScriptedQuery {
        async fn peer_addresses(&self, addr: &NodeAddr) -> crate::Result<AddressSet> {
            match addr.as_str() {
                "10.0.0.1" => Ok(["10.0.0.2", "10.0.0.3"].iter().map(|s| NodeAddr::new(*s)).collect()),
                "10.0.0.9" => Err(crate::Error::node_query("connection refused")),
                _ => Ok(AddressSet::new()),
            }
        }

        async fn sync_status(&self, _addr: &NodeAddr) -> crate::Result<crate::SyncStatus> {
            Ok(crate::SyncStatus::Synced)
        }

        fn query_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn seed_unions_with_reported_peers() {
        let got = discover_candidates(&NodeAddr::new("10.0.0.1"), &ScriptedQuery).await;
        let want: AddressSet = ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
            .iter()
            .map(|s| NodeAddr::new(*s))
            .collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn failed_seed_query_retains_the_seed() {
        let got = discover_candidates(&NodeAddr::new("10.0.0.9"), &ScriptedQuery).await;
        let want: AddressSet = [NodeAddr::new("10.0.0.9")].into_iter().collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn list_expansion_deduplicates_across_seeds() {
        let seeds: AddressSet = ["10.0.0.1", "10.0.0.2"].iter().map(|s| NodeAddr::new(*s)).collect();
        let got = discover_candidates_for_list(
            &seeds,
            Arc::new(ScriptedQuery),
            Arc::new(Semaphore::new(4)),
        )
        .await;
        // 10.0.0.2 appears both as a seed and as a reported peer of 10.0.0.1
        let want: AddressSet = ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
            .iter()
            .map(|s| NodeAddr::new(*s))
            .collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn closed_limit_skips_queries_but_keeps_seeds() {
        let seeds: AddressSet = ["10.0.0.1", "10.0.0.2"].iter().map(|s| NodeAddr::new(*s)).collect();
        let limit = Arc::new(Semaphore::new(4));
        limit.close();

        let got = discover_candidates_for_list(&seeds, Arc::new(ScriptedQuery), limit).await;
        // No peer queries ran, so no peers of 10.0.0.1 were learned
        assert_eq!(got, seeds);
    }
}
