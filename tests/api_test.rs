mod fixtures;
mod helpers;

use serde_json::{json, Value};

use recipe_cascade::app_state::AppState;
use recipe_cascade::routes::api_router;
use recipe_cascade::services::generator::Chef;

use helpers::{harness, seed, template_chef};

/// Serve the API on an ephemeral port and return its base URL.
async fn spawn_api() -> String {
    let h = harness(vec![], Chef::Template(template_chef())).await;
    seed(h.resolver.cache(), &[fixtures::chicken_tacos()]).await;
    let app = api_router(AppState::new(h.pool.clone(), h.resolver));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_health_reports_cache_size() {
    let base = spawn_api().await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["database"]["cached_recipes"], 1);
}

#[tokio::test]
async fn test_resolve_serves_cached_recipe() {
    let base = spawn_api().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/resolve"))
        .json(&json!({"cuisine": "Mexican", "ingredients": ["chicken"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "resolved");
    assert_eq!(body["recipe"]["id"], "themealdb_90001");
    assert_eq!(body["provenance"]["level"], 1);
}

#[tokio::test]
async fn test_resolve_generates_for_unknown_cuisine() {
    let base = spawn_api().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/resolve"))
        .json(&json!({"cuisine": "atlantean", "dish_type": "soup", "ingredients": ["onion"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "resolved");
    assert_eq!(body["provenance"]["level"], 4);
    assert_eq!(body["recipe"]["cuisine"], "atlantean");
    assert_eq!(body["recipe"]["dish_type"], "soup");
}

#[tokio::test]
async fn test_resolve_rejects_empty_cuisine() {
    let base = spawn_api().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/resolve"))
        .json(&json!({"cuisine": "", "ingredients": ["chicken"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 422);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "invalid request");
}

#[tokio::test]
async fn test_resolve_rejects_unknown_preference() {
    let base = spawn_api().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/v1/resolve"))
        .json(&json!({"cuisine": "thai", "dietary_preference": "carnivore"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
