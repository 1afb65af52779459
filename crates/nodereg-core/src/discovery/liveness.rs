// # Liveness Filtering
//
// Partitions a candidate set into synced and not-synced, keeping only the
// synced subset.
//
// ## Fail-Closed
//
// A candidate whose status query fails is excluded: unreachable nodes are
// never considered synced. Liveness is re-validated on every cycle rather
// than trusted from a prior one, since node status is time-varying and the
// published list must reflect current state.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::traits::{AddressSet, NodeQuery, SyncStatus};

/// Keep only candidates that currently report being caught up.
///
/// Each membership test is independent; checks fan out concurrently, bounded
/// by `limit`. Each candidate is validated individually, never the seed it
/// was discovered through.
pub async fn filter_synced(
    candidates: AddressSet,
    query: Arc<dyn NodeQuery>,
    limit: Arc<Semaphore>,
) -> AddressSet {
    let mut tasks = JoinSet::new();

    for addr in candidates {
        let query = Arc::clone(&query);
        let limit = Arc::clone(&limit);

        tasks.spawn(async move {
            // A closed semaphore means the bound is gone: fail closed
            // instead of querying unbounded
            let Ok(_permit) = limit.acquire_owned().await else {
                warn!("query limit closed, treating {} as not synced", addr);
                return (addr, SyncStatus::NotSynced);
            };
            let status = match query.sync_status(&addr).await {
                Ok(status) => status,
                Err(e) => {
                    warn!("sync status query for {} failed, treating as not synced: {}", addr, e);
                    SyncStatus::NotSynced
                }
            };
            (addr, status)
        });
    }

    let mut synced = AddressSet::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((addr, SyncStatus::Synced)) => {
                synced.insert(addr);
            }
            Ok((addr, SyncStatus::NotSynced)) => {
                debug!("dropping {}: not synced", addr);
            }
            Err(e) => warn!("liveness task failed to join: {}", e),
        }
    }

    synced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NodeAddr;
    use async_trait::async_trait;

    struct ScriptedQuery;

    #[async_trait]
    impl NodeQuery for ScriptedQuery {
        async fn peer_addresses(&self, _addr: &NodeAddr) -> crate::Result<AddressSet> {
            Ok(AddressSet::new())
        }

        async fn sync_status(&self, addr: &NodeAddr) -> crate::Result<SyncStatus> {
            match addr.as_str() {
                "10.0.0.1" | "10.0.0.3" => Ok(SyncStatus::Synced),
                "10.0.0.2" => Ok(SyncStatus::NotSynced),
                _ => Err(crate::Error::node_query("timed out")),
            }
        }

        fn query_name(&self) -> &'static str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn keeps_only_synced_candidates() {
        let candidates: AddressSet = ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
            .iter()
            .map(|s| NodeAddr::new(*s))
            .collect();
        let got = filter_synced(candidates, Arc::new(ScriptedQuery), Arc::new(Semaphore::new(4))).await;
        let want: AddressSet = ["10.0.0.1", "10.0.0.3"].iter().map(|s| NodeAddr::new(*s)).collect();
        assert_eq!(got, want);
    }

    #[tokio::test]
    async fn query_failure_is_not_synced() {
        let candidates: AddressSet = [NodeAddr::new("10.0.0.99")].into_iter().collect();
        let got = filter_synced(candidates, Arc::new(ScriptedQuery), Arc::new(Semaphore::new(4))).await;
        assert!(got.is_empty());
    }

    #[tokio::test]
    async fn closed_limit_fails_closed() {
        let candidates: AddressSet = [NodeAddr::new("10.0.0.1")].into_iter().collect();
        let limit = Arc::new(Semaphore::new(4));
        limit.close();

        let got = filter_synced(candidates, Arc::new(ScriptedQuery), limit).await;
        assert!(got.is_empty());
    }
}
