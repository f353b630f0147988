//! AI enrichment handler: generate a title and description for an
//! existing memory and persist them.

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use keepsake_core::Memory;
use keepsake_inference::parse_generated_details;

use crate::auth::Authed;
use crate::error::ApiError;
use crate::state::AppState;

/// Fallback context when the client sends no prompt.
const DEFAULT_CONTEXT: &str = "Beautiful life memory";

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Accepted for future multimodal prompting; unused today.
    #[serde(default, rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub id: Option<Uuid>,
}

/// `POST /api/ai/generate-video` — ask the model for a short title and
/// one-sentence description, then write them onto the target memory.
/// The update is filtered by both memory id and owner id, so a caller
/// naming someone else's memory gets 404, never a cross-user write.
pub async fn generate_details(
    State(state): State<AppState>,
    Authed(_caller): Authed,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let (Some(user_id), Some(memory_id)) = (request.user_id, request.id) else {
        return Err(ApiError::BadRequest(
            "user_id and memory id are required".into(),
        ));
    };

    if let Some(url) = request.image_url.as_deref() {
        debug!(image_url = url, "image context received, not yet used");
    }

    let context = request.prompt.as_deref().unwrap_or(DEFAULT_CONTEXT);
    let prompt = format!(
        "Create cinematic memory details.\n\
         Return EXACT format:\n\
         TITLE: 3-5 word cinematic title\n\
         DESCRIPTION: One emotional sentence\n\
         Context: {}",
        context
    );

    let text = state.ai.generate(&prompt).await?;
    let details = parse_generated_details(&text, request.prompt.as_deref());

    let memory: Memory = state
        .service
        .from("memories")
        .update(json!({
            "title": details.title,
            "description": details.description,
        }))
        .eq("id", memory_id)
        .eq("user_id", user_id)
        .select("*")
        .fetch_one()
        .await
        .map_err(|_| ApiError::NotFound("Memory not found for this user".into()))?;

    info!(memory_id = %memory_id, "memory details generated");
    Ok(Json(json!({ "success": true, "memory": memory })))
}
