//! Gemini generative text backend.
//!
//! One-shot prompt → free-text completion. The primary (flash) model
//! handles all traffic; a quota error triggers a single retry against
//! the higher-tier pro model, the only retry anywhere in the system.

use std::time::{Duration, Instant};

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use keepsake_core::{Error, Result};

/// Default API endpoint prefix.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default primary model.
pub const DEFAULT_FLASH_MODEL: &str = "gemini-2.5-flash";

/// Default fallback model for quota errors.
pub const DEFAULT_PRO_MODEL: &str = "gemini-2.5-pro";

/// Timeout for generation requests (seconds).
const GEN_TIMEOUT_SECS: u64 = 60;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Gemini inference backend.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    flash_model: String,
    pro_model: String,
}

impl GeminiBackend {
    /// Create a backend with default models.
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_config(
            DEFAULT_GEMINI_URL.to_string(),
            api_key,
            DEFAULT_FLASH_MODEL.to_string(),
            DEFAULT_PRO_MODEL.to_string(),
        )
    }

    /// Create a backend with custom endpoint and models.
    pub fn with_config(
        base_url: String,
        api_key: String,
        flash_model: String,
        pro_model: String,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(GEN_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            flash_model,
            pro_model,
        })
    }

    /// Create from environment variables, honoring model overrides
    /// `GEMINI_FLASH_MODEL` and `GEMINI_PRO_MODEL`.
    pub fn from_env(api_key: String) -> Result<Self> {
        let base_url =
            std::env::var("GEMINI_BASE").unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string());
        let flash_model = std::env::var("GEMINI_FLASH_MODEL")
            .unwrap_or_else(|_| DEFAULT_FLASH_MODEL.to_string());
        let pro_model =
            std::env::var("GEMINI_PRO_MODEL").unwrap_or_else(|_| DEFAULT_PRO_MODEL.to_string());

        Self::with_config(base_url, api_key, flash_model, pro_model)
    }

    /// Generate a completion, falling back to the pro model once if
    /// the flash model reports quota exhaustion.
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        match self.generate_with_model(&self.flash_model, prompt).await {
            Err(Error::InferenceQuota(msg)) => {
                warn!(model = %self.flash_model, %msg, "quota exceeded, retrying on pro model");
                self.generate_with_model(&self.pro_model, prompt).await
            }
            other => other,
        }
    }

    async fn generate_with_model(&self, model: &str, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::InferenceQuota(body));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "{} returned {}: {}",
                model, status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("failed to parse response: {}", e)))?;

        let text = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::Inference(format!("{} returned no candidates", model)))?;

        debug!(
            model,
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );

        Ok(text)
    }
}
