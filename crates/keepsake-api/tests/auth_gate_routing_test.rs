//! Router-level tests for the authentication gate.
//!
//! Unauthenticated requests to protected routes are rejected before
//! any handler runs, and non-admin callers are rejected from admin
//! routes before any mutation can reach the store. The store itself is
//! a local stub server, so these run without external services.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    extract::Request,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use keepsake_api::{router, AppState};
use keepsake_core::Config;

fn test_config(store_url: &str) -> Config {
    Config {
        store_url: store_url.to_string(),
        anon_key: "anon-key".into(),
        service_key: "service-key".into(),
        gemini_api_key: "gemini-key".into(),
        port: 0,
        frontend_url: None,
    }
}

async fn spawn_stub(stub: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stub).await.unwrap();
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    // Nothing listens on the discard port; the gate must reject before
    // any store call is attempted.
    let state = AppState::from_config(test_config("http://127.0.0.1:9")).unwrap();
    let app = router(state);

    let album_id = Uuid::new_v4();
    let routes = [
        (Method::GET, "/api/memories".to_string()),
        (Method::GET, "/api/memories/stats".to_string()),
        (Method::GET, "/api/memories/milestones".to_string()),
        (Method::GET, "/api/albums".to_string()),
        (Method::DELETE, format!("/api/albums/{}", album_id)),
        (Method::GET, format!("/api/albums/{}/download", album_id)),
    ];

    for (method, uri) in routes {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri(uri.as_str())
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{} {} must require a bearer token",
            method,
            uri
        );
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let state = AppState::from_config(test_config("http://127.0.0.1:9")).unwrap();
    let app = router(state);

    // Verification against an unreachable store fails closed.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/memories")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_admin_is_forbidden_without_mutation() {
    let user_id = Uuid::new_v4();
    let hits: Arc<Mutex<Vec<String>>> = Arc::default();
    let recorded = hits.clone();

    let stub = Router::new()
        .route(
            "/auth/v1/user",
            get(move || async move { Json(json!({ "id": user_id, "email": "user@example.com" })) }),
        )
        .route(
            "/rest/v1/profiles",
            get(|| async { Json(json!({ "role": "user" })) }),
        )
        .fallback(move |request: Request| {
            let recorded = recorded.clone();
            async move {
                recorded
                    .lock()
                    .unwrap()
                    .push(format!("{} {}", request.method(), request.uri().path()));
                StatusCode::NOT_FOUND.into_response()
            }
        });

    let store_url = spawn_stub(stub).await;
    let state = AppState::from_config(test_config(&store_url)).unwrap();
    let app = router(state);

    let memory_id = Uuid::new_v4();
    let admin_routes = [
        (Method::GET, "/api/admin/users".to_string()),
        (Method::GET, "/api/admin/stats".to_string()),
        (Method::DELETE, format!("/api/admin/memories/{}", memory_id)),
    ];

    for (method, uri) in admin_routes {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method.clone())
                    .uri(uri.as_str())
                    .header("Authorization", "Bearer user-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "{} {} must be admin-only",
            method,
            uri
        );
    }

    // The force-delete never reached the store's rows.
    let seen = hits.lock().unwrap().clone();
    assert!(
        seen.iter().all(|hit| !hit.contains("/rest/v1/memories")),
        "admin gate leaked a mutation: {:?}",
        seen
    );
}
