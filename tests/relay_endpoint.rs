//! Router-level tests for the /api/chat relay
//!
//! Covers the method policy, the missing-credential response, model
//! remapping on the forwarded body and passthrough of upstream errors.

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use chatrelay::client::Credential;
use chatrelay::config::Config;
use chatrelay::handlers::{AppState, build_router};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(base_url: &str, credential: Option<&str>) -> Router {
    let mut config = Config::default();
    config.upstream.base_url = base_url.to_string();
    let state = AppState::new(config, credential.and_then(Credential::new))
        .expect("AppState::new should succeed");
    build_router(state)
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// -------------------------------------------------------------------------
// Method policy
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_relay_rejects_get_with_405() {
    let request = Request::builder()
        .method("GET")
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();

    let (status, _, body) = send(app("http://127.0.0.1:9/v1", Some("sk-x")), request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_relay_rejects_put_and_delete() {
    for verb in ["PUT", "DELETE", "PATCH"] {
        let request = Request::builder()
            .method(verb)
            .uri("/api/chat")
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = send(app("http://127.0.0.1:9/v1", None), request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{} should be rejected", verb);
        assert_eq!(body["error"], "Method not allowed");
    }
}

#[tokio::test]
async fn test_relay_answers_options_with_200() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .body(Body::empty())
        .unwrap();

    let (status, _, _) = send(app("http://127.0.0.1:9/v1", None), request).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_cors_preflight_allows_any_origin() {
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();

    let (status, headers, _) = send(app("http://127.0.0.1:9/v1", None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["access-control-allow-origin"], "*");
    let methods = headers["access-control-allow-methods"].to_str().unwrap();
    for verb in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
        assert!(methods.contains(verb), "missing {} in {}", verb, methods);
    }
}

// -------------------------------------------------------------------------
// Credential and forwarding
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_missing_credential_is_500() {
    let request = post_json(
        "/api/chat",
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    );

    let (status, _, body) = send(app("http://127.0.0.1:9/v1", None), request).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "API key not configured"}));
}

#[tokio::test]
async fn test_relay_remaps_model_and_returns_upstream_body() {
    let server = MockServer::start().await;
    let upstream_body = json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Hi there"}}]
    });
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-relay"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.7,
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(upstream_body.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let request = post_json(
        "/api/chat",
        json!({"model": "gpt-4o", "messages": [{"role": "user", "content": "hi"}]}),
    );
    let (status, headers, body) = send(
        app(&format!("{}/v1", server.uri()), Some("sk-relay")),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, upstream_body);
    assert_eq!(headers["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn test_upstream_error_status_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached for gpt-4o-mini"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = post_json(
        "/api/chat",
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    );
    let (status, _, body) = send(
        app(&format!("{}/v1", server.uri()), Some("sk-relay")),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({
            "error": "OpenAI request failed",
            "details": "Rate limit reached for gpt-4o-mini",
            "code": 429
        })
    );
}

#[tokio::test]
async fn test_unreachable_upstream_is_500_with_details() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let request = post_json(
        "/api/chat",
        json!({"messages": [{"role": "user", "content": "hi"}]}),
    );
    let (status, _, body) = send(
        app(&format!("http://127.0.0.1:{}/v1", port), Some("sk-relay")),
        request,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "OpenAI request failed");
    assert_eq!(body["code"], 500);
    assert!(body["details"].as_str().unwrap().contains("Could not connect"));
}

#[tokio::test]
async fn test_invalid_temperature_is_400() {
    let request = post_json(
        "/api/chat",
        json!({"temperature": 9.0, "messages": [{"role": "user", "content": "hi"}]}),
    );

    let (status, _, body) = send(app("http://127.0.0.1:9/v1", Some("sk-relay")), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("temperature"));
}

#[tokio::test]
async fn test_malformed_json_uses_error_shape() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header("content-type", "application/json")
        .body(Body::from("{oops"))
        .unwrap();

    let (status, _, body) = send(app("http://127.0.0.1:9/v1", Some("sk-relay")), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
