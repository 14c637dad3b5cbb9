use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Fixed payload served by `/bytes`; not valid UTF-8.
pub const BINARY_PAYLOAD: [u8; 4] = [0, 159, 146, 150];

/// Deterministic payload of `len` bytes served by `/bytes/{len}`.
pub fn sized_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub const HTML_PAGE: &str = "<html><body>404 page not found</body></html>";

/// What `/echo` saw. Header names are lower-cased.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub content_type: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct AppState {
    hits: Arc<AtomicUsize>,
}

pub fn app() -> Router {
    Router::new()
        .route("/status/ping", get(ping))
        .route("/status/{code}", any(status))
        .route("/count/{code}", any(count))
        .route("/hits", get(hits))
        .route("/echo", any(echo))
        .route("/delay/{ms}", get(delay))
        .route("/bytes", get(binary))
        .route("/bytes/{len}", get(sized))
        .route("/html", get(html))
        .route("/redirect", get(redirect))
        .layer(middleware::from_fn(log_request))
        .with_state(AppState::default())
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let response = next.run(request).await;
    tracing::info!(%method, %uri, status = response.status().as_u16(), "handled request");
    response
}

async fn ping() -> Json<Value> {
    Json(json!({"ok": true}))
}

fn status_response(code: u16) -> Response {
    let Ok(status) = StatusCode::from_u16(code) else {
        return (StatusCode::BAD_REQUEST, format!("invalid status {code}")).into_response();
    };
    if status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED {
        return status.into_response();
    }
    (status, format!("status {code}")).into_response()
}

async fn status(Path(code): Path<u16>) -> Response {
    status_response(code)
}

async fn count(State(state): State<AppState>, Path(code): Path<u16>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    status_response(code)
}

async fn hits(State(state): State<AppState>) -> Json<Value> {
    Json(json!({"hits": state.hits.load(Ordering::SeqCst)}))
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Echo>, (StatusCode, String)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = decode_body(content_type.as_deref(), &body)
        .map_err(|message| (StatusCode::BAD_REQUEST, message))?;
    let headers = headers
        .iter()
        .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
        .collect();

    Ok(Json(Echo {
        method: method.to_string(),
        query: uri.query().map(str::to_string),
        headers,
        content_type,
        body,
    }))
}

/// Decode a request body according to its content type.
pub fn decode_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, String> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    match mime {
        "application/msgpack" => rmp_serde::from_slice(body).map_err(|e| e.to_string()),
        "application/x-www-form-urlencoded" => {
            let pairs: Vec<(String, String)> =
                serde_urlencoded::from_bytes(body).map_err(|e| e.to_string())?;
            Ok(Value::Object(
                pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
            ))
        }
        _ => serde_json::from_slice(body).map_err(|e| e.to_string()),
    }
}

async fn delay(Path(ms): Path<u64>) -> Json<Value> {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    Json(json!({"delayed_ms": ms}))
}

async fn binary() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        BINARY_PAYLOAD.to_vec(),
    )
}

async fn sized(Path(len): Path<usize>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/octet-stream")],
        sized_payload(len),
    )
}

async fn html() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html")], HTML_PAGE)
}

async fn redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/status/ping")])
}
