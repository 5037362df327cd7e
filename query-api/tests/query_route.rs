use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use query_api::{AppState, ServerConfig, build_router};
use query_collaborators::InMemoryGraphBuilder;
use query_core::EngineConfig;
use query_core::model::Entity;
use query_core::testkit::FakeCollaborators;

fn entity(id: &str, type_tag: &str) -> Entity {
    Entity { id: id.into(), label: id.into(), type_tag: type_tag.into(), properties: Default::default(), source_collections: vec![] }
}

fn state() -> Arc<AppState> {
    let graph = Arc::new(InMemoryGraphBuilder::new().with_entity(entity("gw", "person")).build());
    let embedder = Arc::new(FakeCollaborators::new());
    Arc::new(AppState {
        graph: graph.clone(),
        vector: graph,
        embedder,
        engine_config: EngineConfig::default(),
        content_store: Arc::new(query_api::enrichment::InMemoryContentStore::new().with_blob("gw", "biography text")),
        hierarchy: Arc::new(query_api::lineage::InMemoryHierarchy::new()),
    })
}

async fn post_query(body: Value) -> (StatusCode, Value) {
    let app = build_router(state(), &ServerConfig::default());
    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

#[tokio::test]
async fn zero_hop_exact_entry_returns_enriched_result() {
    let (status, body) = post_query(json!({ "path": "@gw", "enrich": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let results = body["data"]["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["entity"]["id"], "gw");
    assert_eq!(results[0]["content"], "biography text");
    assert!(body["data"]["metadata"]["error"].is_null());
}

#[tokio::test]
async fn invalid_entry_point_is_reported_as_response_metadata_not_http_error() {
    let (status, body) = post_query(json!({ "path": "type:person -[*]-> type:file" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["metadata"]["error"]["tag"], "invalid_entry_point");
}

#[tokio::test]
async fn malformed_json_body_is_rejected_as_bad_request() {
    let app = build_router(state(), &ServerConfig::default());
    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
