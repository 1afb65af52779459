// # noderegd - Peer Registry Refresh Daemon
//
// The noderegd binary is a thin integration layer:
//
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Register store and query backends
// 4. Run one refresh cycle and exit
//
// All discovery, filtering, and persistence logic lives in nodereg-core.
// The binary is meant to run under an external scheduler (cron, a systemd
// timer, a Kubernetes CronJob); it never loops on its own.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### List Store
// - `NODEREG_STORE_TYPE`: Store type (memory, file, s3)
// - `NODEREG_STORE_ROOT`: Root directory (for file store)
// - `NODEREG_S3_ENDPOINT`: Object store endpoint URL (for s3)
// - `NODEREG_S3_BUCKET`: Bucket name (for s3)
// - `NODEREG_S3_REGION`: Signing region (for s3)
// - `NODEREG_S3_ACCESS_KEY` / `NODEREG_S3_SECRET_KEY`: Credentials (for s3)
// - `NODEREG_S3_KEYS`: Comma-separated tracked keys (for s3)
//
// ### Node Query
// - `NODEREG_RPC_PORT`: RPC port queried on every node
// - `NODEREG_QUERY_TIMEOUT_SECS`: Per-request timeout
//
// ### Engine
// - `NODEREG_KEY_PREFIX`: Prefix selecting which lists are refreshed
// - `NODEREG_FILTER_BY_SYNC`: Drop candidates that are not caught up (true/false)
// - `NODEREG_MAX_CONCURRENT_QUERIES`: Bound on in-flight node queries
//
// ### Logging
// - `NODEREG_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export NODEREG_STORE_TYPE=s3
// export NODEREG_S3_ENDPOINT=https://s3.amazonaws.com
// export NODEREG_S3_BUCKET=testnet-seed
// export NODEREG_S3_REGION=us-east-1
// export NODEREG_S3_ACCESS_KEY=...
// export NODEREG_S3_SECRET_KEY=...
// export NODEREG_S3_KEYS=seeds/nodes.json,seeds/validators.json
//
// noderegd
// ```

use anyhow::Result;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use nodereg_core::config::{EngineConfig, QueryConfig, StoreConfig};
use nodereg_core::engine::EngineEvent;
use nodereg_core::{ComponentRegistry, RefreshEngine, RefreshOutcome};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Refresh cycle completed (possibly with per-key failures)
/// - 1: Configuration or startup error
/// - 2: Runtime error (refresh cycle could not run at all)
#[derive(Debug, Clone, Copy)]
enum NoderegExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<NoderegExitCode> for ExitCode {
    fn from(code: NoderegExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    store_root: Option<String>,
    s3_endpoint: Option<String>,
    s3_bucket: Option<String>,
    s3_region: Option<String>,
    s3_access_key: Option<String>,
    s3_secret_key: Option<String>,
    s3_keys: Vec<String>,
    rpc_port: u16,
    query_timeout_secs: u64,
    key_prefix: String,
    filter_by_sync: bool,
    max_concurrent_queries: usize,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            store_type: env::var("NODEREG_STORE_TYPE").unwrap_or_else(|_| "s3".to_string()),
            store_root: env::var("NODEREG_STORE_ROOT").ok(),
            s3_endpoint: env::var("NODEREG_S3_ENDPOINT").ok(),
            s3_bucket: env::var("NODEREG_S3_BUCKET").ok(),
            s3_region: env::var("NODEREG_S3_REGION").ok(),
            s3_access_key: env::var("NODEREG_S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("NODEREG_S3_SECRET_KEY").ok(),
            s3_keys: env::var("NODEREG_S3_KEYS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rpc_port: env::var("NODEREG_RPC_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(26657),
            query_timeout_secs: env::var("NODEREG_QUERY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            key_prefix: env::var("NODEREG_KEY_PREFIX").unwrap_or_else(|_| "seeds/".to_string()),
            filter_by_sync: env::var("NODEREG_FILTER_BY_SYNC")
                .ok()
                .map(|s| s.to_lowercase() != "false")
                .unwrap_or(true),
            max_concurrent_queries: env::var("NODEREG_MAX_CONCURRENT_QUERIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            log_level: env::var("NODEREG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "memory" => {}
            "file" => {
                if self.store_root.as_ref().is_none_or(|r| r.is_empty()) {
                    anyhow::bail!(
                        "NODEREG_STORE_ROOT is required when NODEREG_STORE_TYPE=file. \
                        Set it via: export NODEREG_STORE_ROOT=/var/lib/nodereg"
                    );
                }
            }
            "s3" => {
                for (name, value) in [
                    ("NODEREG_S3_ENDPOINT", &self.s3_endpoint),
                    ("NODEREG_S3_BUCKET", &self.s3_bucket),
                    ("NODEREG_S3_REGION", &self.s3_region),
                    ("NODEREG_S3_ACCESS_KEY", &self.s3_access_key),
                    ("NODEREG_S3_SECRET_KEY", &self.s3_secret_key),
                ] {
                    if value.as_ref().is_none_or(|v| v.is_empty()) {
                        anyhow::bail!("{} is required when NODEREG_STORE_TYPE=s3", name);
                    }
                }

                if let Some(ref endpoint) = self.s3_endpoint
                    && !endpoint.starts_with("https://")
                    && !endpoint.starts_with("http://")
                {
                    anyhow::bail!(
                        "NODEREG_S3_ENDPOINT must use HTTP or HTTPS scheme. Got: {}",
                        endpoint
                    );
                }

                if self.s3_keys.is_empty() {
                    anyhow::bail!(
                        "NODEREG_S3_KEYS must contain at least one key. \
                        Set it via: export NODEREG_S3_KEYS=seeds/nodes.json"
                    );
                }

                // Check for obvious placeholder credentials (common mistake)
                if let Some(ref secret) = self.s3_secret_key {
                    let lower = secret.to_lowercase();
                    if lower.contains("your_key") || lower.contains("replace_me") {
                        anyhow::bail!(
                            "NODEREG_S3_SECRET_KEY appears to be a placeholder. \
                            Use an actual credential."
                        );
                    }
                }
            }
            other => anyhow::bail!(
                "NODEREG_STORE_TYPE '{}' is not supported. \
                Supported types: memory, file, s3",
                other
            ),
        }

        if self.rpc_port == 0 {
            anyhow::bail!("NODEREG_RPC_PORT must be nonzero");
        }

        if !(1..=300).contains(&self.query_timeout_secs) {
            anyhow::bail!(
                "NODEREG_QUERY_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.query_timeout_secs
            );
        }

        if self.max_concurrent_queries == 0 || self.max_concurrent_queries > 1024 {
            anyhow::bail!(
                "NODEREG_MAX_CONCURRENT_QUERIES must be between 1 and 1024. Got: {}",
                self.max_concurrent_queries
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "NODEREG_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the store configuration for the registry
    fn store_config(&self) -> StoreConfig {
        match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            "file" => StoreConfig::File {
                root: self.store_root.clone().unwrap_or_default(),
            },
            _ => StoreConfig::S3 {
                endpoint: self.s3_endpoint.clone().unwrap_or_default(),
                bucket: self.s3_bucket.clone().unwrap_or_default(),
                region: self.s3_region.clone().unwrap_or_default(),
                access_key: self.s3_access_key.clone().unwrap_or_default(),
                secret_key: self.s3_secret_key.clone().unwrap_or_default(),
                keys: self.s3_keys.clone(),
            },
        }
    }

    /// Build the query configuration for the registry
    fn query_config(&self) -> QueryConfig {
        QueryConfig::Http {
            port: self.rpc_port,
            timeout_secs: self.query_timeout_secs,
        }
    }

    /// Build the engine configuration
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            key_prefix: self.key_prefix.clone(),
            filter_by_sync: self.filter_by_sync,
            max_concurrent_queries: self.max_concurrent_queries,
            ..EngineConfig::default()
        }
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return NoderegExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return NoderegExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return NoderegExitCode::ConfigError.into();
    }

    info!("Starting noderegd");
    info!(
        "Store type: {}, key prefix: {}, sync filter: {}",
        config.store_type, config.key_prefix, config.filter_by_sync
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return NoderegExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run_refresh(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Startup error: {}", e);
                NoderegExitCode::ConfigError
            }
        }
    })
    .into()
}

/// Build the components and run one refresh cycle
async fn run_refresh(config: Config) -> Result<NoderegExitCode> {
    // Create component registry with built-in stores
    let registry = ComponentRegistry::with_builtins();

    #[cfg(feature = "http")]
    {
        info!("Registering HTTP node query client");
        nodereg_query_http::register(&registry);
    }

    #[cfg(feature = "s3")]
    {
        info!("Registering S3 list store");
        nodereg_store_s3::register(&registry);
    }

    let store: Arc<dyn nodereg_core::ListStore> =
        Arc::from(registry.create_store(&config.store_config())?);
    let query: Arc<dyn nodereg_core::NodeQuery> =
        Arc::from(registry.create_query(&config.query_config())?);

    info!(
        "Using store '{}' with query '{}'",
        store.store_name(),
        query.query_name()
    );

    let (engine, mut events) = RefreshEngine::new(store, query, config.engine_config())?;

    // Surface engine events in the log as the cycle progresses
    let event_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                EngineEvent::CycleStarted { tracked_keys } => {
                    info!("Refreshing {} tracked list(s)", tracked_keys);
                }
                EngineEvent::KeyStarted { key, seeds } => {
                    info!("{}: {} stored seed(s)", key, seeds);
                }
                EngineEvent::ListUpdated {
                    key,
                    added,
                    removed,
                    total,
                } => {
                    info!("{}: +{} -{} = {} address(es)", key, added, removed, total);
                }
                EngineEvent::ListUnchanged { key } => {
                    info!("{}: unchanged", key);
                }
                EngineEvent::KeySkipped { key } => {
                    info!("{}: empty, skipped", key);
                }
                EngineEvent::KeyFailed { key, error } => {
                    warn!("{}: failed: {}", key, error);
                }
                EngineEvent::CycleFinished { updated, failed } => {
                    info!("Cycle finished: {} updated, {} failed", updated, failed);
                }
            }
        }
    });

    let outcome = engine.run_refresh().await;
    drop(engine);
    let _ = event_task.await;

    match outcome {
        RefreshOutcome::Success { report } => {
            let failed = report.failed_keys();
            if failed.is_empty() {
                info!("Refresh cycle complete: {} list(s) updated", report.updated_count());
            } else {
                warn!(
                    "Refresh cycle complete with failures: {:?}",
                    failed.iter().map(|k| k.to_string()).collect::<Vec<_>>()
                );
            }
            Ok(NoderegExitCode::CleanShutdown)
        }
        RefreshOutcome::Failure { detail } => {
            error!("Refresh cycle failed: {}", detail);
            Ok(NoderegExitCode::RuntimeError)
        }
    }
}
