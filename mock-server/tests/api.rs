use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, sized_payload, Echo, BINARY_PAYLOAD};
use serde_json::json;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- ping / status ---

#[tokio::test]
async fn ping_returns_ok_true() {
    let resp = app().oneshot(get("/status/ping")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, json!({"ok": true}));
}

#[tokio::test]
async fn status_route_echoes_code() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/status/503")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_bytes(resp).await, "status 503");
}

#[tokio::test]
async fn status_204_has_empty_body() {
    let resp = app().oneshot(get("/status/204")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_route_rejects_out_of_range_code() {
    let resp = app().oneshot(get("/status/1000")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- echo ---

#[tokio::test]
async fn echo_reports_json_body_and_query() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/echo?a=1&b=x")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("X-Trace", "abc")
                .body(r#"{"title":"Buy milk"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=x"));
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("abc"));
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, json!({"title": "Buy milk"}));
}

#[tokio::test]
async fn echo_without_query_reports_none() {
    let resp = app().oneshot(get("/echo")).await.unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert!(echo.query.is_none());
    assert!(echo.body.is_null());
}

#[tokio::test]
async fn echo_rejects_malformed_json() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .header(http::header::CONTENT_TYPE, "application/json")
                .body("{oops".to_string())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- fixtures ---

#[tokio::test]
async fn bytes_route_serves_binary_payload() {
    let resp = app().oneshot(get("/bytes")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), &BINARY_PAYLOAD[..]);
}

#[tokio::test]
async fn sized_bytes_route_serves_requested_length() {
    let resp = app().oneshot(get("/bytes/1000")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body_bytes(resp).await;
    assert_eq!(bytes.len(), 1000);
    assert_eq!(bytes.as_ref(), sized_payload(1000).as_slice());
}

#[tokio::test]
async fn html_route_is_not_json() {
    let resp = app().oneshot(get("/html")).await.unwrap();
    let bytes = body_bytes(resp).await;
    assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_err());
}

#[tokio::test]
async fn redirect_points_at_ping() {
    let resp = app().oneshot(get("/redirect")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers()[http::header::LOCATION], "/status/ping");
}

#[tokio::test]
async fn delay_route_reports_delay() {
    let resp = app().oneshot(get("/delay/10")).await.unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, json!({"delayed_ms": 10}));
}

// --- hit counter ---

#[tokio::test]
async fn count_route_increments_hits() {
    use tower::Service;

    let mut app = app().into_service();

    for _ in 0..3 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(get("/count/500"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get("/hits"))
        .await
        .unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body, json!({"hits": 3}));
}
