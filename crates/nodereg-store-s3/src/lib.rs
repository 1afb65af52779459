// # S3-Compatible List Store
//
// This crate provides a ListStore implementation over an S3-compatible
// object store, the durable, publicly-readable home of the published
// address lists.
//
// ## Behavior
//
// - **read**: signed `GET {endpoint}/{bucket}/{key}`; 404 means "no list
//   yet" and yields the empty set, not an error
// - **write**: signed `PUT` with `x-amz-acl: public-read` and
//   `content-type: application/json`, so external bootstrap clients can
//   fetch the lists anonymously with the right media type
// - **list_keys**: returns the configured tracked-key roster; buckets are
//   not enumerated, the set of published lists is deployment configuration
//
// ## Ownership
//
// One request per call, full error propagation, no retry or backoff logic.
// The engine confines a failure to the affected key and the scheduler owns
// re-running the cycle.
//
// ## Security
//
// The secret key never appears in logs or Debug output.

mod sign;

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use nodereg_core::config::StoreConfig;
use nodereg_core::traits::{AddressSet, ListKey, ListStore, ListStoreFactory, NodeAddr};
use nodereg_core::{ComponentRegistry, Error, Result};

pub use sign::Signer;

/// Default HTTP timeout for object store requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Content type declared on every written list
const LIST_CONTENT_TYPE: &str = "application/json";

/// S3-compatible list store
pub struct S3ListStore {
    /// Endpoint URL without a trailing slash (e.g., "https://s3.amazonaws.com")
    endpoint: String,

    /// Bucket holding the published lists
    bucket: String,

    /// Tracked keys in this bucket
    keys: Vec<ListKey>,

    /// Request signer (redacts its secret in Debug)
    signer: Signer,

    /// HTTP client for object store requests
    client: reqwest::Client,
}

impl std::fmt::Debug for S3ListStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ListStore")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("keys", &self.keys)
            .field("signer", &self.signer)
            .finish()
    }
}

impl S3ListStore {
    /// Create a store for one bucket and its tracked keys
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Object store endpoint URL
    /// - `bucket`: Bucket name
    /// - `region`: Region used for request signing
    /// - `access_key` / `secret_key`: Credentials with read/write access
    /// - `keys`: The keys tracked in this bucket
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        region: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        keys: Vec<ListKey>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::config(format!("failed to build http client: {}", e)))?;

        let endpoint = endpoint.into();
        let endpoint = endpoint.trim_end_matches('/').to_string();

        Ok(Self {
            endpoint,
            bucket: bucket.into(),
            keys,
            signer: Signer::new(access_key, secret_key, region),
            client,
        })
    }

    /// Absolute path of an object within the endpoint
    fn object_path(&self, key: &ListKey) -> String {
        format!("/{}/{}", self.bucket, key)
    }

    /// Host portion of the endpoint, for the signed host header
    fn host(&self) -> Result<String> {
        let stripped = self
            .endpoint
            .strip_prefix("https://")
            .or_else(|| self.endpoint.strip_prefix("http://"))
            .ok_or_else(|| {
                Error::config(format!("endpoint must be an http(s) url: {}", self.endpoint))
            })?;
        Ok(stripped.trim_end_matches('/').to_string())
    }

    /// Map an error status to a store error
    fn status_error(&self, key: &ListKey, status: reqwest::StatusCode, body: String) -> Error {
        match status.as_u16() {
            401 | 403 => Error::auth(format!("object store rejected credentials for {}", key)),
            429 => Error::backend("s3", format!("rate limited writing {}", key)),
            _ => Error::backend(
                "s3",
                format!("{} for {}: {}", status, key, body.chars().take(200).collect::<String>()),
            ),
        }
    }
}

#[async_trait]
impl ListStore for S3ListStore {
    async fn list_keys(&self) -> Result<Vec<ListKey>> {
        Ok(self.keys.clone())
    }

    async fn read(&self, key: &ListKey) -> Result<AddressSet> {
        let path = self.object_path(key);
        let url = format!("{}{}", self.endpoint, path);
        let headers = self
            .signer
            .signed_headers("GET", &self.host()?, &path, b"", &[], Utc::now());

        let mut request = self.client.get(&url);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("GET {} failed: {}", url, e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!("no object at {}, treating as empty list", key);
            return Ok(AddressSet::new());
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(key, status, body));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("failed to read body for {}: {}", key, e)))?;

        let addrs: Vec<NodeAddr> = serde_json::from_str(&body)
            .map_err(|e| Error::list_store(format!("failed to parse {}: {}", key, e)))?;

        Ok(addrs.into_iter().collect())
    }

    async fn write(&self, key: &ListKey, addrs: &AddressSet) -> Result<()> {
        let path = self.object_path(key);
        let url = format!("{}{}", self.endpoint, path);

        let ordered: Vec<&NodeAddr> = addrs.iter().collect();
        let body = serde_json::to_vec(&ordered)?;

        let headers = self.signer.signed_headers(
            "PUT",
            &self.host()?,
            &path,
            &body,
            &[
                ("content-type", LIST_CONTENT_TYPE),
                ("x-amz-acl", "public-read"),
            ],
            Utc::now(),
        );

        let mut request = self.client.put(&url).body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("PUT {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(self.status_error(key, status, body));
        }

        tracing::debug!("wrote {} address(es) to {}", addrs.len(), key);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "s3"
    }
}

/// Factory for creating S3 list stores
pub struct S3StoreFactory;

impl ListStoreFactory for S3StoreFactory {
    fn create(&self, config: &StoreConfig) -> Result<Box<dyn ListStore>> {
        match config {
            StoreConfig::S3 {
                endpoint,
                bucket,
                region,
                access_key,
                secret_key,
                keys,
            } => {
                let keys = keys.iter().map(|k| ListKey::new(k.clone())).collect();
                Ok(Box::new(S3ListStore::new(
                    endpoint.clone(),
                    bucket.clone(),
                    region.clone(),
                    access_key.clone(),
                    secret_key.clone(),
                    keys,
                )?))
            }
            _ => Err(Error::config("invalid config for s3 store")),
        }
    }
}

/// Register the S3 store with a registry
pub fn register(registry: &ComponentRegistry) {
    registry.register_store("s3", Box::new(S3StoreFactory));
}
