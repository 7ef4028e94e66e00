#![allow(clippy::unwrap_used)]
// Integration tests for `SemanticHubClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_api::models::{ArtifactType, FilterParams, NewSemanticModel};
use portal_api::{HttpClient, SemanticHubClient};

async fn setup() -> (MockServer, SemanticHubClient) {
    let server = MockServer::start().await;
    let service = HttpClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    let client = SemanticHubClient::for_service(&service).unwrap();
    (server, client)
}

fn model_json(urn: &str) -> serde_json::Value {
    json!({
        "urn": urn,
        "name": "Battery",
        "version": "1.0.0",
        "type": "BAMM",
        "status": "RELEASED"
    })
}

#[tokio::test]
async fn test_get_models_with_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/hub/api/v1/models"))
        .and(query_param("page", "1"))
        .and(query_param("pageSize", "5"))
        .and(query_param("namespaceFilter", "io.catenax"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [model_json("m1")],
            "totalItems": 6,
            "currentPage": 1,
            "totalPages": 2,
            "itemCount": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let filters = FilterParams {
        page: 1,
        page_size: 5,
        namespace_filter: Some("io.catenax".into()),
        ..FilterParams::default()
    };
    let list = client.get_models(&filters).await.unwrap();

    assert_eq!(list.total_items, 6);
    assert_eq!(list.items[0].model_type, "BAMM");
}

#[tokio::test]
async fn test_get_model_by_id() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/hub/api/v1/models/m42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_json("m42")))
        .mount(&server)
        .await;

    let model = client.get_model_by_id("m42").await.unwrap();
    assert_eq!(model.urn, "m42");
}

#[tokio::test]
async fn test_post_semantic_model_sends_text() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/hub/api/v1/models"))
        .and(query_param("type", "BAMM"))
        .and(query_param("status", "DRAFT"))
        .and(header("content-type", "text/plain"))
        .and(body_string("@prefix bamm: <urn:bamm:io.openmanufacturing:meta-model:1.0.0#> ."))
        .respond_with(ResponseTemplate::new(200).set_body_json(model_json("new")))
        .expect(1)
        .mount(&server)
        .await;

    let upload = NewSemanticModel {
        model: "@prefix bamm: <urn:bamm:io.openmanufacturing:meta-model:1.0.0#> .".into(),
        model_type: "BAMM".into(),
        status: "DRAFT".into(),
    };
    let created = client.post_semantic_model(&upload).await.unwrap();
    assert_eq!(created.urn, "new");
}

#[tokio::test]
async fn test_get_artifact_returns_bytes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/hub/api/v1/models/m1/example-payload"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"{\"sample\":1}".to_vec()))
        .mount(&server)
        .await;

    let bytes = client.get_artifact(ArtifactType::Payload, "m1").await.unwrap();
    assert_eq!(&bytes[..], &b"{\"sample\":1}"[..]);
}
