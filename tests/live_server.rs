//! End-to-end tests against a seeded MongoDB database.
//!
//! These need either the `test-containers` feature (and a Docker daemon), or the
//! `MONGODB_USERNAME`, `MONGODB_PASSWORD`, `MONGODB_HOST` and `MONGODB_DATABASE` env vars. Without
//! the feature they are ignored by default; run them with `cargo test -- --ignored`.

use mongo_pages::api::http::pages;
use mongo_pages::testing::live_server::{index_url, run_live_server_test, run_live_test};
use reqwest::StatusCode;

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn index_returns_ok() {
    run_live_server_test(async |server| {
        let response = reqwest::get(index_url(server).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    })
    .await
    .unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn index_lists_seeded_collections() {
    run_live_test(async |app, server| {
        let body = reqwest::get(index_url(server).unwrap())
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        let db = app.context().db();
        assert!(body.contains(&format!("<h1>{}</h1>", db.name())));
        assert!(body.contains("<li>destinations: "));
        assert!(body.contains("<li>cruises: "));
    })
    .await
    .unwrap();
}

#[tokio::test]
#[cfg_attr(not(feature = "test-containers"), ignore)]
async fn health_reports_database_ok() {
    run_live_server_test(async |server| {
        let response = reqwest::get(server.url_for(pages::HEALTH).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["resources"]["db"]["status"], "ok");
    })
    .await
    .unwrap();
}
