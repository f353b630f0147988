//! Application state shared across handlers.

use std::sync::Arc;

use keepsake_core::{Config, Result};
use keepsake_inference::GeminiBackend;
use keepsake_store::StoreClient;

/// Shared state: the two store tiers, the AI backend, and config.
///
/// Cloned per request; everything inside is cheap to clone or Arc'd.
#[derive(Clone)]
pub struct AppState {
    /// Restricted (RLS-bound) store client.
    pub anon: StoreClient,
    /// Elevated (RLS-bypass) store client for server-side writes and
    /// cross-user admin reads.
    pub service: StoreClient,
    /// Generative text backend.
    pub ai: Arc<GeminiBackend>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let anon = StoreClient::anon(&config)?;
        let service = StoreClient::service(&config)?;
        let ai = Arc::new(GeminiBackend::from_env(config.gemini_api_key.clone())?);
        Ok(Self {
            anon,
            service,
            ai,
            config: Arc::new(config),
        })
    }
}
