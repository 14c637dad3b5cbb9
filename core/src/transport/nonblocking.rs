//! Async transport backed by reqwest.

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::{Client, Method};

use super::{describe, AsyncTransport, MAX_REDIRECTS};
use crate::error::{ConfigurationError, TransportError};
use crate::http::{HttpRequest, HttpResponse};

/// reqwest client with certificate verification, redirect following and
/// HTTP/2 negotiated through ALPN when the server offers it.
///
/// `reqwest::Client` is reference counted; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, ConfigurationError> {
        let client = Client::builder()
            .use_rustls_tls()
            .redirect(Policy::limited(MAX_REDIRECTS as usize))
            .build()
            .map_err(|e| ConfigurationError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one with proxy settings.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| TransportError::protocol("InvalidMethod", e.to_string()))?;

        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::timeout(describe(&e))
            } else {
                TransportError::decode(status, String::new(), describe(&e))
            }
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

fn kind_of(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "Timeout"
    } else if err.is_connect() {
        "Connect"
    } else if err.is_redirect() {
        "Redirect"
    } else if err.is_builder() {
        "Builder"
    } else if err.is_body() {
        "Body"
    } else if err.is_decode() {
        "Decode"
    } else {
        "Request"
    }
}

fn map_error(err: reqwest::Error) -> TransportError {
    let message = describe(&err);
    if err.is_timeout() {
        TransportError::timeout(message)
    } else if err.is_connect() {
        TransportError::unreachable(kind_of(&err), message)
    } else {
        TransportError::protocol(kind_of(&err), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_builds_with_defaults() {
        assert!(ReqwestTransport::new().is_ok());
    }

    #[tokio::test]
    async fn invalid_method_is_protocol_error() {
        let transport = ReqwestTransport::new().unwrap();
        let request = HttpRequest {
            method: "BAD METHOD".to_string(),
            url: "http://127.0.0.1:9/".to_string(),
            headers: Vec::new(),
            body: None,
            timeout: std::time::Duration::from_secs(1),
        };
        let err = transport.send(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Protocol { .. }));
    }
}
