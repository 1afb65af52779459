//! Core refresh engine
//!
//! The RefreshEngine is responsible for:
//! - Enumerating tracked list keys in the ListStore
//! - Expanding each stored seed list via peer discovery
//! - Filtering candidates by sync status
//! - Conditionally writing back refreshed lists
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      list_keys / read       ┌───────────────┐
//! │  ListStore  │────────────────────────────▶│ RefreshEngine │
//! └─────────────┘                             └───────────────┘
//!        ▲                                            │
//!        │ conditional write                          │ fan-out
//!        │                                            ▼
//!        │                                    ┌───────────────┐
//!        └────────────────────────────────────│   NodeQuery   │
//!                                             └───────────────┘
//! ```
//!
//! ## Cycle Flow (per tracked key)
//!
//! 1. Read stored seeds; empty ⇒ skip (never manufacture a list)
//! 2. Candidates = union of every seed and its reported peers
//! 3. Validated = candidates that report being synced
//! 4. Write only when validated is non-empty and differs from the seeds;
//!    an all-failed cycle leaves the stored list untouched

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::discovery::{discover_candidates_for_list, filter_synced};
use crate::error::{Error, Result};
use crate::traits::{ListKey, ListStore, NodeQuery};

/// Events emitted by the RefreshEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// A refresh cycle started
    CycleStarted {
        tracked_keys: usize,
    },

    /// A tracked key's refresh began
    KeyStarted {
        key: ListKey,
        seeds: usize,
    },

    /// A refreshed list was written back
    ListUpdated {
        key: ListKey,
        added: usize,
        removed: usize,
        total: usize,
    },

    /// A key's stored list was left untouched
    ListUnchanged {
        key: ListKey,
    },

    /// A key with an empty stored list was skipped
    KeySkipped {
        key: ListKey,
    },

    /// A key's refresh failed (store read or write)
    KeyFailed {
        key: ListKey,
        error: String,
    },

    /// A refresh cycle finished
    CycleFinished {
        updated: usize,
        failed: usize,
    },
}

/// Per-key outcome of a refresh cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum KeyOutcome {
    /// The stored list was replaced
    Updated {
        /// Addresses present now that were not stored before
        added: usize,
        /// Previously stored addresses that were dropped
        removed: usize,
        /// Size of the written list
        total: usize,
    },
    /// The stored list was left untouched
    ///
    /// Covers both "validated set equals the stored set" and "validation
    /// produced nothing"; `candidates` lets callers tell the two apart.
    Unchanged {
        /// Candidates examined this cycle
        candidates: usize,
    },
    /// The stored list was empty; nothing to refresh
    SkippedEmpty,
    /// Store read or write failed for this key
    Failed {
        /// Diagnostic detail
        error: String,
    },
}

impl KeyOutcome {
    /// Whether this outcome represents a failure
    pub fn is_failed(&self) -> bool {
        matches!(self, KeyOutcome::Failed { .. })
    }
}

/// Result of one refresh cycle across every tracked key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    /// When the cycle started
    pub started_at: DateTime<Utc>,
    /// When the cycle finished
    pub finished_at: DateTime<Utc>,
    /// Per-key outcomes, keyed by list key
    pub outcomes: BTreeMap<ListKey, KeyOutcome>,
}

impl RefreshReport {
    /// Keys whose refresh failed this cycle
    pub fn failed_keys(&self) -> Vec<&ListKey> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failed())
            .map(|(key, _)| key)
            .collect()
    }

    /// Number of keys whose stored list was replaced
    pub fn updated_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|o| matches!(o, KeyOutcome::Updated { .. }))
            .count()
    }
}

/// Structured outcome of the scheduler-facing entry point
///
/// Serializes as `{"status": "success", ...}` / `{"status": "failure", ...}`
/// for invokers that expect a non-throwing, structured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RefreshOutcome {
    /// The cycle ran to completion (individual keys may still have failed)
    Success {
        /// The per-key report
        report: RefreshReport,
    },
    /// The cycle could not run at all (e.g., the store was unreachable)
    Failure {
        /// Diagnostic detail
        detail: String,
    },
}

/// Core refresh engine
///
/// The engine orchestrates the read → discover → filter → conditional-write
/// flow for every tracked list key. One call to [`RefreshEngine::refresh_all`]
/// is one complete cycle; the engine holds no state between cycles beyond
/// what the store persists.
///
/// ## Concurrency
///
/// Keys are processed concurrently (their store entries are independent),
/// and within each key the per-address queries fan out under a shared
/// semaphore bounding in-flight requests. The engine assumes at most one
/// cycle runs at a time; that exclusion is the external scheduler's job.
///
/// ## Load Resistance
///
/// - **Bounded event channel**: when full, events are dropped with a warning
/// - **Bounded query fan-out**: `max_concurrent_queries` caps network load
pub struct RefreshEngine {
    /// Durable list storage
    store: Arc<dyn ListStore>,

    /// Node query client
    query: Arc<dyn NodeQuery>,

    /// Prefix a key must carry to be refreshed
    key_prefix: String,

    /// Whether candidates are filtered by sync status
    filter_by_sync: bool,

    /// Shared bound on in-flight node queries
    query_limit: Arc<Semaphore>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl RefreshEngine {
    /// Create a new refresh engine
    ///
    /// # Parameters
    ///
    /// - `store`: List store implementation
    /// - `query`: Node query implementation
    /// - `config`: Engine configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields
    /// engine events
    pub fn new(
        store: Arc<dyn ListStore>,
        query: Arc<dyn NodeQuery>,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let engine = Self {
            store,
            query,
            key_prefix: config.key_prefix,
            filter_by_sync: config.filter_by_sync,
            query_limit: Arc::new(Semaphore::new(config.max_concurrent_queries)),
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one refresh cycle across every tracked key
    ///
    /// # Returns
    ///
    /// - `Ok(RefreshReport)`: The cycle ran; per-key failures are recorded
    ///   in the report, not propagated
    /// - `Err(Error)`: The store could not even be enumerated
    pub async fn refresh_all(&self) -> Result<RefreshReport> {
        let started_at = Utc::now();

        let keys = self
            .store
            .list_keys()
            .await
            .map_err(|e| Error::list_store(format!("failed to enumerate keys: {}", e)))?;

        let tracked: Vec<ListKey> = keys
            .into_iter()
            .filter(|key| key.has_prefix(&self.key_prefix))
            .collect();

        info!(
            "refresh cycle started: {} tracked key(s) with prefix {:?}",
            tracked.len(),
            self.key_prefix
        );
        self.emit_event(EngineEvent::CycleStarted {
            tracked_keys: tracked.len(),
        });

        let mut tasks = JoinSet::new();
        for key in tracked {
            let store = Arc::clone(&self.store);
            let query = Arc::clone(&self.query);
            let limit = Arc::clone(&self.query_limit);
            let event_tx = self.event_tx.clone();
            let filter_by_sync = self.filter_by_sync;

            tasks.spawn(async move {
                let outcome =
                    Self::refresh_key(&key, store, query, limit, filter_by_sync, &event_tx).await;
                (key, outcome)
            });
        }

        let mut outcomes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, outcome)) => {
                    outcomes.insert(key, outcome);
                }
                Err(e) => {
                    // A panicked key task is a bug, but it must not take the
                    // rest of the sweep down with it.
                    error!("key refresh task failed to join: {}", e);
                }
            }
        }

        let report = RefreshReport {
            started_at,
            finished_at: Utc::now(),
            outcomes,
        };

        let failed = report.failed_keys().len();
        let updated = report.updated_count();
        info!("refresh cycle finished: {} updated, {} failed", updated, failed);
        self.emit_event(EngineEvent::CycleFinished { updated, failed });

        Ok(report)
    }

    /// Scheduler-facing entry point
    ///
    /// Never returns an error: a cycle that cannot run at all is reported as
    /// a structured [`RefreshOutcome::Failure`] instead of propagating, since
    /// external schedulers expect a non-throwing result.
    pub async fn run_refresh(&self) -> RefreshOutcome {
        match self.refresh_all().await {
            Ok(report) => RefreshOutcome::Success { report },
            Err(e) => {
                error!("refresh cycle failed outright: {}", e);
                RefreshOutcome::Failure {
                    detail: e.to_string(),
                }
            }
        }
    }

    /// Refresh a single tracked key
    ///
    /// Store failures are confined to this key's outcome; network failures
    /// have already degraded to "no information" inside the discovery
    /// pipeline.
    async fn refresh_key(
        key: &ListKey,
        store: Arc<dyn ListStore>,
        query: Arc<dyn NodeQuery>,
        limit: Arc<Semaphore>,
        filter_by_sync: bool,
        event_tx: &mpsc::Sender<EngineEvent>,
    ) -> KeyOutcome {
        let seeds = match store.read(key).await {
            Ok(seeds) => seeds,
            Err(e) => {
                error!("failed to read list {}: {}", key, e);
                let error = e.to_string();
                Self::emit(event_tx, EngineEvent::KeyFailed {
                    key: key.clone(),
                    error: error.clone(),
                });
                return KeyOutcome::Failed { error };
            }
        };

        if seeds.is_empty() {
            debug!("list {} is empty, nothing to refresh", key);
            Self::emit(event_tx, EngineEvent::KeySkipped { key: key.clone() });
            return KeyOutcome::SkippedEmpty;
        }

        Self::emit(event_tx, EngineEvent::KeyStarted {
            key: key.clone(),
            seeds: seeds.len(),
        });

        let candidates =
            discover_candidates_for_list(&seeds, Arc::clone(&query), Arc::clone(&limit)).await;
        let candidate_count = candidates.len();

        let validated = if filter_by_sync {
            filter_synced(candidates, query, limit).await
        } else {
            candidates
        };

        // The critical safety property: an all-failed cycle must never wipe
        // out a previously good list. Staleness over data loss.
        if validated.is_empty() {
            warn!(
                "list {}: no candidate validated ({} examined), keeping stored list",
                key, candidate_count
            );
            Self::emit(event_tx, EngineEvent::ListUnchanged { key: key.clone() });
            return KeyOutcome::Unchanged {
                candidates: candidate_count,
            };
        }

        if validated == seeds {
            debug!("list {} unchanged ({} address(es))", key, seeds.len());
            Self::emit(event_tx, EngineEvent::ListUnchanged { key: key.clone() });
            return KeyOutcome::Unchanged {
                candidates: candidate_count,
            };
        }

        let added = validated.difference(&seeds).count();
        let removed = seeds.difference(&validated).count();

        match store.write(key, &validated).await {
            Ok(()) => {
                info!(
                    "list {} updated: +{} -{} = {} address(es)",
                    key,
                    added,
                    removed,
                    validated.len()
                );
                Self::emit(event_tx, EngineEvent::ListUpdated {
                    key: key.clone(),
                    added,
                    removed,
                    total: validated.len(),
                });
                KeyOutcome::Updated {
                    added,
                    removed,
                    total: validated.len(),
                }
            }
            Err(e) => {
                error!("failed to write list {}: {}", key, e);
                let error = e.to_string();
                Self::emit(event_tx, EngineEvent::KeyFailed {
                    key: key.clone(),
                    error: error.clone(),
                });
                KeyOutcome::Failed { error }
            }
        }
    }

    /// Emit an engine event from `&self`
    fn emit_event(&self, event: EngineEvent) {
        Self::emit(&self.event_tx, event);
    }

    /// Emit an engine event, dropping it if the channel is full
    fn emit(event_tx: &mpsc::Sender<EngineEvent>, event: EngineEvent) {
        if event_tx.try_send(event).is_err() {
            warn!("event channel full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_outcome_serializes_with_tag() {
        let outcome = KeyOutcome::Updated {
            added: 2,
            removed: 1,
            total: 5,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "updated");
        assert_eq!(json["total"], 5);
    }

    #[test]
    fn refresh_outcome_serializes_status_field() {
        let outcome = RefreshOutcome::Failure {
            detail: "store unreachable".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failure");
        assert_eq!(json["detail"], "store unreachable");
    }
}
