#![allow(clippy::unwrap_used)]
// Integration tests for `HttpClient` using wiremock.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_string, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portal_api::models::{AppMarketplaceApp, SubscriptionStatus};
use portal_api::{BearerToken, Error, HttpClient, Request, ResponseBody, ResponseType};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, HttpClient) {
    let server = MockServer::start().await;
    let client = HttpClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn with_token(client: HttpClient, token: &str) -> HttpClient {
    client.with_token_provider(Arc::new(BearerToken::new(SecretString::from(
        token.to_string(),
    ))))
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_json_list() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": "a1",
                "title": "Dataspace Connector",
                "provider": "Catena-X",
                "leadPictureUri": "a1.png",
                "shortDescription": "EDC",
                "useCases": ["Traceability"],
                "price": "free",
                "status": "ACTIVE"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let apps: Vec<AppMarketplaceApp> = client.get_json("/api/apps/active").await.unwrap();

    assert_eq!(apps.len(), 1);
    assert_eq!(apps[0].title, "Dataspace Connector");
    assert_eq!(apps[0].status, Some(SubscriptionStatus::Active));
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let (server, client) = setup().await;
    let client = with_token(client, "session-token");

    Mock::given(method("GET"))
        .and(path("/api/apps/favourites"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a1", "a2"])))
        .expect(1)
        .mount(&server)
        .await;

    let favourites: Vec<String> = client.get_json("api/apps/favourites").await.unwrap();
    assert_eq!(favourites, vec!["a1", "a2"]);
}

#[tokio::test]
async fn test_query_params_are_form_encoded() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/models"))
        .and(query_param("nameFilter", "battery pass"))
        .and(query_param("status", "RELEASED"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let req = Request::get("models")
        .query_from(&json!({ "nameFilter": "battery pass", "status": ["RELEASED"] }))
        .unwrap();
    let resp = client.request(req).await.unwrap();

    assert_eq!(resp.body(), &ResponseBody::Json(json!({ "ok": true })));
}

#[tokio::test]
async fn test_put_json_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/apps/a1/subscription/s1/tenantUrl"))
        .and(body_string(r#"{"url":"https://example.com"}"#))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let req = Request::put("/api/apps/a1/subscription/s1/tenantUrl")
        .json(json!({ "url": "https://example.com" }));
    let resp = client.request(req).await.unwrap();

    assert_eq!(resp.status().as_u16(), 204);
    assert_eq!(resp.body(), &ResponseBody::Empty);
}

#[tokio::test]
async fn test_binary_response() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/models/m1/diagram"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47])
                .insert_header("content-type", "image/png"),
        )
        .mount(&server)
        .await;

    let req = Request::get("models/m1/diagram").response_type(ResponseType::Binary);
    let bytes = client.request(req).await.unwrap().into_bytes();

    assert_eq!(&bytes[..], &[0x89_u8, 0x50, 0x4e, 0x47][..]);
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_surfaces_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/provided"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = with_token(client, "expired");
    let result: Result<Vec<AppMarketplaceApp>, _> = client.get_json("/api/apps/provided").await;

    let err = result.unwrap_err();
    assert!(err.is_unauthorized(), "expected 401, got: {err:?}");
    assert!(matches!(err, Error::HttpStatus { status: 401, .. }));
}

#[tokio::test]
async fn test_server_error_message_uses_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/active"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let result: Result<Vec<AppMarketplaceApp>, _> = client.get_json("/api/apps/active").await;

    match result {
        Err(Error::HttpStatus { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected HttpStatus, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/apps/active"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let result: Result<Vec<AppMarketplaceApp>, _> = client.get_json("/api/apps/active").await;
    assert!(matches!(result, Err(Error::Decode { .. })));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on port 1.
    let client = HttpClient::from_reqwest("http://127.0.0.1:1", reqwest::Client::new()).unwrap();
    let result: Result<Vec<String>, _> = client.get_json("/api/apps/favourites").await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::Network(_)), "got: {err:?}");
    assert_eq!(err.status(), None);
}
