//! Server configuration loaded from the environment.

use crate::error::{Error, Result};

/// Default HTTP listen port.
pub const DEFAULT_PORT: u16 = 5000;

/// Local development frontend origin, always allowed by CORS.
pub const DEV_ORIGIN: &str = "http://localhost:5173";

/// Runtime configuration for the keepsake server.
///
/// Loaded once at startup via [`Config::from_env`]. The store keys come
/// in two privilege tiers: the anon key is bound by row-level security,
/// the service key bypasses it for server-side and admin operations.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the store platform, e.g. `https://xyz.supabase.co`.
    pub store_url: String,
    /// Restricted (RLS-bound) API key.
    pub anon_key: String,
    /// Elevated (RLS-bypass) API key.
    pub service_key: String,
    /// Generative-AI API key.
    pub gemini_api_key: String,
    /// HTTP listen port.
    pub port: u16,
    /// Deployed frontend origin allowed by CORS, if any.
    pub frontend_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `SUPABASE_URL`, `SUPABASE_ANON_KEY`,
    /// `SUPABASE_SERVICE_ROLE_KEY`, `GEMINI_API_KEY`.
    /// Optional: `PORT` (default 5000), `FRONTEND_URL`.
    pub fn from_env() -> Result<Self> {
        let store_url = require("SUPABASE_URL")?;
        let anon_key = require("SUPABASE_ANON_KEY")?;
        let service_key = require("SUPABASE_SERVICE_ROLE_KEY")?;
        let gemini_api_key = require("GEMINI_API_KEY")?;

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let frontend_url = std::env::var("FRONTEND_URL")
            .ok()
            .filter(|v| !v.is_empty());

        Ok(Self {
            store_url: store_url.trim_end_matches('/').to_string(),
            anon_key,
            service_key,
            gemini_api_key,
            port,
            frontend_url,
        })
    }
}

fn require(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::Config(format!("{} is not set", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_is_config_error() {
        let err = require("KEEPSAKE_DOES_NOT_EXIST").unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("KEEPSAKE_DOES_NOT_EXIST")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_port() {
        assert_eq!(DEFAULT_PORT, 5000);
    }
}
