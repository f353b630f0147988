//! # keepsake-api
//!
//! HTTP server for keepsake: REST routes for memories, albums, tags,
//! auth, admin, and AI enrichment, delegating persistence to the
//! external store via `keepsake-store`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod services;
pub mod shape;
pub mod state;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use keepsake_core::{config::DEV_ORIGIN, Config};

pub use error::ApiError;
pub use state::AppState;

/// Slack on top of the per-file ceiling for multipart framing and
/// metadata fields.
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

/// Whether a browser origin may call the API with credentials.
///
/// Allowed: the local dev frontend, the configured deployed frontend,
/// and Vercel preview deployments.
pub fn origin_allowed(origin: &str, frontend_url: Option<&str>) -> bool {
    origin == DEV_ORIGIN
        || frontend_url.map(|f| f == origin).unwrap_or(false)
        || origin.ends_with(".vercel.app")
}

fn cors_layer(config: &Config) -> CorsLayer {
    let frontend_url = config.frontend_url.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| origin_allowed(o, frontend_url.as_deref()))
                .unwrap_or(false)
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn liveness() -> Json<Value> {
    Json(json!({ "message": "Keepsake API running" }))
}

/// Build the application router with all routes and middleware.
pub fn router(state: AppState) -> Router {
    // Legacy disk uploads are served directly; browsers embed them
    // cross-origin, so the blanket ACAO and CORP headers are required.
    let uploads_service = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            HeaderName::from_static("cross-origin-resource-policy"),
            HeaderValue::from_static("cross-origin"),
        ))
        .service(ServeDir::new("uploads"));

    let memories = Router::new()
        .route("/", post(handlers::memories::create_memory).get(handlers::memories::list_memories))
        .route("/bulk", post(handlers::memories::bulk_upload_memories))
        .route("/all", get(handlers::memories::list_all_memories))
        .route("/stats", get(handlers::memories::memory_stats))
        .route("/tags", get(handlers::memories::list_tags))
        .route("/tags/admin", get(handlers::memories::list_tags_admin))
        .route("/milestones", get(handlers::memories::list_milestones))
        .route("/random", get(handlers::memories::random_memory))
        .route("/tag/:tag_id", get(handlers::memories::list_memories_by_tag))
        .route(
            "/:id",
            put(handlers::memories::update_memory).delete(handlers::memories::delete_memory),
        );

    let albums = Router::new()
        .route("/", get(handlers::albums::list_albums).post(handlers::albums::create_album))
        .route("/all", get(handlers::albums::list_all_albums))
        .route("/:id", get(handlers::albums::get_album).delete(handlers::albums::delete_album))
        .route("/:id/memories", post(handlers::albums::add_memories_to_album))
        .route(
            "/:id/memories/:memory_id",
            delete(handlers::albums::remove_memory_from_album),
        )
        .route("/:id/download", get(handlers::albums::download_album));

    let admin = Router::new()
        .route("/users", get(handlers::admin::list_users))
        .route("/memories", get(handlers::admin::recent_memories))
        .route("/memories/:id", delete(handlers::admin::force_delete_memory))
        .route("/stats", get(handlers::admin::platform_stats));

    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let ai = Router::new().route("/generate-video", post(handlers::ai::generate_details));

    Router::new()
        .route("/", get(liveness))
        .nest("/api/auth", auth_routes)
        .nest("/api/memories", memories)
        .nest("/api/albums", albums)
        .nest("/api/admin", admin)
        .nest("/api/ai", ai)
        .nest_service("/uploads", uploads_service)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::disable())
        // Sized for a full bulk batch: per-file and per-request file
        // counts are enforced in collect_multipart; this layer only
        // backstops the whole body.
        .layer(RequestBodyLimitLayer::new(
            upload::MAX_FILE_BYTES * upload::MAX_FILES_PER_REQUEST + BODY_LIMIT_SLACK,
        ))
        .with_state(state)
}
