//! Contract Test: Partial Failure Isolation
//!
//! The refresh is a best-effort sweep across independent keys: one key's
//! store failure is reported in that key's outcome and never blocks or
//! corrupts the others.

mod common;

use std::sync::Arc;

use common::*;
use nodereg_core::engine::KeyOutcome;
use nodereg_core::{ListKey, RefreshEngine, RefreshOutcome};

fn healthy_two_list_network() -> ScriptedNetwork {
    ScriptedNetwork::new()
        .with_peers("10.0.0.1", &["10.0.0.2"])
        .with_peers("10.0.1.1", &["10.0.1.2"])
        .with_synced(&["10.0.0.1", "10.0.0.2", "10.0.1.1", "10.0.1.2"])
}

#[tokio::test]
async fn write_failure_on_one_key_does_not_affect_the_other() {
    let store = ScriptedStore::new()
        .with_list("seeds/healthy.json", &["10.0.0.1"])
        .with_list("seeds/broken.json", &["10.0.1.1"])
        .with_failing_write("seeds/broken.json");

    let (engine, _events) = RefreshEngine::new(
        Arc::new(store.clone()),
        Arc::new(healthy_two_list_network()),
        test_config(),
    )
    .expect("engine construction succeeds");

    let report = engine.refresh_all().await.unwrap();

    // Healthy key refreshed and persisted
    assert_eq!(
        report.outcomes[&ListKey::new("seeds/healthy.json")],
        KeyOutcome::Updated {
            added: 1,
            removed: 0,
            total: 2
        }
    );
    assert_eq!(
        store.stored("seeds/healthy.json"),
        addrs(&["10.0.0.1", "10.0.0.2"])
    );

    // Broken key reports its failure; its stored list is untouched
    match &report.outcomes[&ListKey::new("seeds/broken.json")] {
        KeyOutcome::Failed { error } => {
            assert!(error.contains("injected write failure"), "got: {}", error);
        }
        other => panic!("expected Failed, got {:?}", other),
    }
    assert_eq!(store.stored("seeds/broken.json"), addrs(&["10.0.1.1"]));
}

#[tokio::test]
async fn read_failure_on_one_key_does_not_affect_the_other() {
    let store = ScriptedStore::new()
        .with_list("seeds/healthy.json", &["10.0.0.1"])
        .with_list("seeds/broken.json", &["10.0.1.1"])
        .with_failing_read("seeds/broken.json");

    let (engine, _events) = RefreshEngine::new(
        Arc::new(store.clone()),
        Arc::new(healthy_two_list_network()),
        test_config(),
    )
    .expect("engine construction succeeds");

    let report = engine.refresh_all().await.unwrap();

    assert!(report.outcomes[&ListKey::new("seeds/broken.json")].is_failed());
    assert_eq!(report.failed_keys().len(), 1);
    assert_eq!(
        store.stored("seeds/healthy.json"),
        addrs(&["10.0.0.1", "10.0.0.2"])
    );
}

#[tokio::test]
async fn per_key_failures_still_count_as_a_completed_cycle() {
    let store = ScriptedStore::new()
        .with_list("seeds/broken.json", &["10.0.1.1"])
        .with_failing_read("seeds/broken.json");

    let (engine, _events) = RefreshEngine::new(
        Arc::new(store.clone()),
        Arc::new(ScriptedNetwork::new()),
        test_config(),
    )
    .expect("engine construction succeeds");

    // The sweep ran, so the entry point reports success with the failure
    // recorded per key, not a top-level failure.
    match engine.run_refresh().await {
        RefreshOutcome::Success { report } => {
            assert_eq!(report.failed_keys().len(), 1);
        }
        RefreshOutcome::Failure { detail } => {
            panic!("expected per-key failure, got cycle failure: {}", detail)
        }
    }
}
