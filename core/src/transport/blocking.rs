//! Blocking transport backed by ureq.

use std::io::ErrorKind;

use ureq::http;
use ureq::Agent;

use super::{describe, has_io_kind, BlockingTransport, MAX_REDIRECTS};
use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

/// ureq agent configured for the executor: status codes are returned as
/// data, redirects are followed, TLS certificates are verified.
///
/// The agent's connection pool is shared by every request sent through the
/// same `UreqTransport`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(MAX_REDIRECTS)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockingTransport for UreqTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let result = match &request.body {
            Some(body) => {
                let req = builder
                    .body(body.clone())
                    .map_err(|e| TransportError::protocol("InvalidRequest", e.to_string()))?;
                let req = self
                    .agent
                    .configure_request(req)
                    .timeout_global(Some(request.timeout))
                    .build();
                self.agent.run(req)
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| TransportError::protocol("InvalidRequest", e.to_string()))?;
                let req = self
                    .agent
                    .configure_request(req)
                    .timeout_global(Some(request.timeout))
                    .build();
                self.agent.run(req)
            }
        };

        let mut response = result.map_err(map_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| match map_error(e) {
                timeout @ TransportError::Timeout { .. } => timeout,
                other => TransportError::decode(status, String::new(), other.to_string()),
            })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn kind_of(err: &ureq::Error) -> &'static str {
    match err {
        ureq::Error::StatusCode(_) => "StatusCode",
        ureq::Error::Http(_) => "Http",
        ureq::Error::BadUri(_) => "BadUri",
        ureq::Error::Protocol(_) => "Protocol",
        ureq::Error::Io(_) => "Io",
        ureq::Error::Timeout(_) => "Timeout",
        ureq::Error::HostNotFound => "HostNotFound",
        ureq::Error::RedirectFailed => "RedirectFailed",
        ureq::Error::ConnectionFailed => "ConnectionFailed",
        ureq::Error::BodyExceedsLimit(_) => "BodyExceedsLimit",
        ureq::Error::TooManyRedirects => "TooManyRedirects",
        ureq::Error::Tls(_) => "Tls",
        ureq::Error::Other(_) => "Other",
        _ => "Error",
    }
}

/// I/O error kinds that mean the peer could not be reached at all.
fn is_unreachable_kind(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkUnreachable
            | ErrorKind::AddrNotAvailable
    )
}

fn map_error(err: ureq::Error) -> TransportError {
    let kind = kind_of(&err);
    let message = describe(&err);
    match err {
        ureq::Error::Timeout(_) => TransportError::timeout(message),
        ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            TransportError::unreachable(kind, message)
        }
        ureq::Error::Io(ref io) if io.kind() == ErrorKind::TimedOut => {
            TransportError::timeout(message)
        }
        ureq::Error::Io(ref io) if is_unreachable_kind(io.kind()) => {
            TransportError::unreachable(kind, message)
        }
        ref other if has_io_kind(other, ErrorKind::ConnectionRefused) => {
            TransportError::unreachable(kind, message)
        }
        _ => TransportError::protocol(kind, message),
    }
}
