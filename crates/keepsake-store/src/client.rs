//! Store client construction and shared request plumbing.

use std::time::Duration;

use reqwest::Client;
use tracing::info;

use keepsake_core::{Config, Error, Result};

use crate::query::Query;
use crate::storage::StorageBucket;

/// Timeout for store requests (seconds). Generous because video
/// uploads and downloads ride the same client.
const STORE_TIMEOUT_SECS: u64 = 120;

/// A credentialed client for the store platform.
///
/// Cloning is cheap; the underlying `reqwest::Client` is shared.
#[derive(Clone)]
pub struct StoreClient {
    pub(crate) http: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
}

impl StoreClient {
    /// Create a client for the given endpoint and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(STORE_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// Restricted (row-level-security-bound) client from config.
    pub fn anon(config: &Config) -> Result<Self> {
        let client = Self::new(&config.store_url, &config.anon_key)?;
        info!(endpoint = %client.base_url, tier = "anon", "store client ready");
        Ok(client)
    }

    /// Elevated (RLS-bypass) client from config.
    pub fn service(config: &Config) -> Result<Self> {
        let client = Self::new(&config.store_url, &config.service_key)?;
        info!(endpoint = %client.base_url, tier = "service", "store client ready");
        Ok(client)
    }

    /// Begin a row query against `table`.
    pub fn from(&self, table: &str) -> Query<'_> {
        Query::new(self, table)
    }

    /// Access an object-storage bucket.
    pub fn bucket(&self, bucket: &str) -> StorageBucket<'_> {
        StorageBucket::new(self, bucket)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base headers required by every store request.
    pub(crate) fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }
}
