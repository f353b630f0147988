//! Router-level test for the album ZIP export.
//!
//! One of the album's blobs is missing from storage; the export must
//! still return an archive containing the entries that could be
//! fetched, never failing the whole download for one bad object.

use std::io::Cursor;

use axum::{
    body::Body,
    extract::{Path, Request},
    http::{header, StatusCode},
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
async fn test_archive_skips_missing_blob() {
    let owner_id = Uuid::new_v4();
    let album_id = Uuid::new_v4();

    let entry = |title: &str, file: &str| {
        json!({
            "memory": {
                "id": Uuid::new_v4(),
                "user_id": owner_id,
                "title": title,
                "media": [ { "file_url": format!("u/m/{}", file) } ]
            }
        })
    };
    let album = json!({
        "name": "Goa Trip",
        "user_id": owner_id,
        "memories": [
            entry("Beach Walk", "a.jpg"),
            entry("Lost Shot", "missing.jpg"),
            entry("Sunset", "b.jpg"),
        ]
    });

    let stub = Router::new()
        .route(
            "/auth/v1/user",
            get(move || async move { Json(json!({ "id": owner_id, "email": "owner@example.com" })) }),
        )
        .route(
            "/rest/v1/profiles",
            get(|| async { Json(json!({ "role": "user" })) }),
        )
        .route("/rest/v1/albums", get(move || async move { Json(album) }))
        .route(
            "/storage/v1/object/memories/*path",
            get(|Path(path): Path<String>| async move {
                if path.ends_with("missing.jpg") {
                    StatusCode::NOT_FOUND.into_response()
                } else {
                    vec![0xffu8, 0xd8, 0xff, 0xe0].into_response()
                }
            }),
        )
        .fallback(|request: Request| async move {
            // Any unexpected store call fails the export and the test.
            eprintln!("unexpected store call: {} {}", request.method(), request.uri());
            StatusCode::INTERNAL_SERVER_ERROR
        });

    let store_url = spawn_stub(stub).await;
    let state = AppState::from_config(test_config(&store_url)).unwrap();
    let app = router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/albums/{}/download", album_id))
                .header("Authorization", "Bearer owner-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/zip"
    );
    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("Goa_Trip.zip"), "{}", disposition);

    let bytes = axum::body::to_bytes(response.into_body(), 10 * 1024 * 1024)
        .await
        .unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();

    assert_eq!(archive.len(), 2, "missing blob must be skipped");
    let names: Vec<&str> = archive.file_names().collect();
    assert!(names.iter().any(|n| n.starts_with("Beach_Walk_")));
    assert!(names.iter().any(|n| n.starts_with("Sunset_")));
    assert!(!names.iter().any(|n| n.starts_with("Lost_Shot_")));
}
