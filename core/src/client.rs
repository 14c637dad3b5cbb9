//! Request executor.
//!
//! # Design
//! `ApiKit` holds a base URL, the process configuration and a transport.
//! Executing a call is split the same way for both concurrency models:
//!
//! - `build_request` turns a `RequestSpec` into an `HttpRequest` (URL
//!   resolution, encoding selection, header coercion, timeout).
//! - `parse_response` classifies one attempt's outcome and either asks for a
//!   retry or produces the final `Response`.
//!
//! `request` and `request_async` are thin loops around those two steps that
//! differ only in how they send and how they sleep, so both modes classify
//! and count retries identically.

use std::time::Duration;

use tracing::{debug, info_span, Instrument, Span};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::diagnostics;
use crate::encode::{
    append_query, encode_form, encode_json, encode_msgpack, string_pairs, CONTENT_TYPE,
    CONTENT_TYPE_FORM, CONTENT_TYPE_JSON, CONTENT_TYPE_MSGPACK,
};
use crate::error::{ConfigurationError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::retry::{retry_delay, Failure};
use crate::transport::{AsyncTransport, BlockingTransport, ReqwestTransport, UreqTransport};
use crate::types::{
    Encoding, Json, OutputMode, Params, RequestSpec, Response, STATUS_CONNECTION_ERROR,
    STATUS_TIMEOUT, STATUS_TRANSPORT_ERROR,
};

/// Client that blocks the calling thread for the whole call.
pub type BlockingApiKit = ApiKit<UreqTransport>;

/// Client whose calls suspend on network waits and retry delays.
pub type AsyncApiKit = ApiKit<ReqwestTransport>;

/// Outcome of classifying one attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    /// Sleep for the given delay, then send the same request again.
    Retry(Duration),
    Done(Response),
}

#[derive(Debug, Clone)]
pub struct ApiKit<T> {
    base_url: String,
    config: ClientConfig,
    transport: T,
}

impl BlockingApiKit {
    /// Blocking client with the default ureq transport. Reads
    /// `APIKIT_REQUEST_TIMEOUT_SECS` once.
    pub fn new(base_url: &str) -> Result<Self, ConfigurationError> {
        Ok(Self::with_transport(
            base_url,
            ClientConfig::from_env()?,
            UreqTransport::new(),
        ))
    }
}

impl AsyncApiKit {
    /// Async client with the default reqwest transport. Reads
    /// `APIKIT_REQUEST_TIMEOUT_SECS` once.
    pub fn new(base_url: &str) -> Result<Self, ConfigurationError> {
        Ok(Self::with_transport(
            base_url,
            ClientConfig::from_env()?,
            ReqwestTransport::new()?,
        ))
    }
}

impl<T> ApiKit<T> {
    pub fn with_transport(base_url: &str, config: ClientConfig, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Absolute URLs pass through; anything else is joined to the base URL.
    pub fn resolve_url(&self, path: &str) -> Result<String, ConfigurationError> {
        if is_absolute(path) {
            return Ok(path.to_string());
        }
        if self.base_url.is_empty() {
            return Err(ConfigurationError::MissingBaseUrl(path.to_string()));
        }
        Ok(format!(
            "{}/{}",
            self.base_url,
            path.trim_start_matches('/')
        ))
    }

    pub fn build_request(&self, spec: &RequestSpec) -> Result<HttpRequest, ConfigurationError> {
        let method = spec.normalized_method();
        if method.is_empty() || !method.bytes().all(is_token_byte) {
            return Err(ConfigurationError::InvalidMethod(spec.method.clone()));
        }

        let mut url = self.resolve_url(&spec.path)?;
        let mut headers = spec.headers.as_ref().map(string_pairs).unwrap_or_default();
        if let Some((name, _)) = headers
            .iter()
            .find(|(name, _)| name.is_empty() || !name.bytes().all(is_token_byte))
        {
            return Err(ConfigurationError::InvalidHeaderName(name.clone()));
        }

        let body = if method == "GET" {
            if let Some(params) = &spec.params {
                url = append_query(&url, params)?;
            }
            None
        } else {
            match spec.encoding {
                Encoding::MsgPack => {
                    headers.retain(|(name, _)| !name.eq_ignore_ascii_case(CONTENT_TYPE));
                    headers.push((CONTENT_TYPE.to_string(), CONTENT_TYPE_MSGPACK.to_string()));
                    Some(encode_msgpack(spec.params.as_ref())?)
                }
                Encoding::FormEncoded => match &spec.params {
                    Some(params) => {
                        default_content_type(&mut headers, CONTENT_TYPE_FORM);
                        Some(encode_form(params)?)
                    }
                    None => None,
                },
                Encoding::Json => match &spec.params {
                    Some(params) => {
                        default_content_type(&mut headers, CONTENT_TYPE_JSON);
                        Some(encode_json(params)?)
                    }
                    None => None,
                },
            }
        };

        Ok(HttpRequest {
            method,
            url,
            headers,
            body,
            timeout: self.config.timeout(spec.timeout_secs),
        })
    }

    /// Classify the outcome of one attempt.
    ///
    /// `retries_remaining` is the budget left *before* this attempt's
    /// failure is counted; a `Retry` means the caller should decrement it.
    pub fn parse_response(
        &self,
        spec: &RequestSpec,
        request: &HttpRequest,
        outcome: Result<HttpResponse, TransportError>,
        retries_remaining: u32,
    ) -> Attempt {
        let response = match outcome {
            Ok(response) => response,
            Err(err) => return self.transport_failure(spec, request, err, retries_remaining),
        };

        let text = response.text();
        diagnostics::echo_exchange(
            &request.method,
            &spec.path,
            spec.params.as_ref(),
            &request.headers,
            response.status,
            &text,
            spec.debug,
        );

        if !response.is_success()
            && retries_remaining > 0
            && spec.retry_on.should_retry(Failure::Status(response.status))
        {
            return Attempt::Retry(retry_delay(spec.retry_delay_secs));
        }

        let envelope = Response::received(response.status, &text);
        let shaped = match spec.output {
            OutputMode::RawBinary => envelope.with_content(response.body),
            OutputMode::RawText => envelope.with_text(text),
            OutputMode::ParsedJson if response.body.is_empty() => {
                envelope.with_data(Json::Object(Params::new()))
            }
            OutputMode::ParsedJson => match serde_json::from_slice::<Json>(&response.body) {
                Ok(data) => envelope.with_data(data),
                Err(e) => {
                    let err = TransportError::decode(response.status, text, e.to_string());
                    return self.transport_failure(spec, request, err, retries_remaining);
                }
            },
        };
        Attempt::Done(shaped)
    }

    fn transport_failure(
        &self,
        spec: &RequestSpec,
        request: &HttpRequest,
        err: TransportError,
        retries_remaining: u32,
    ) -> Attempt {
        if retries_remaining > 0 && spec.retry_on.should_retry(Failure::Transport(&err)) {
            debug!(error = %err, "attempt failed");
            return Attempt::Retry(retry_delay(spec.retry_delay_secs));
        }
        Attempt::Done(failure_response(spec, request, err))
    }
}

impl<T: BlockingTransport> ApiKit<T> {
    /// Execute a call on the current thread, sleeping between retries.
    ///
    /// Network failures never surface as `Err`; they are folded into the
    /// returned `Response`. Only an invalid `spec` is an error.
    pub fn request(&self, spec: &RequestSpec) -> Result<Response, ConfigurationError> {
        let request = self.build_request(spec)?;
        let span = request_span(spec, &request);
        let _entered = span.enter();

        let mut retries_remaining = spec.retries;
        let response = loop {
            let outcome = self.transport.send(&request);
            match self.parse_response(spec, &request, outcome, retries_remaining) {
                Attempt::Done(response) => break response,
                Attempt::Retry(delay) => {
                    retries_remaining -= 1;
                    debug!(retries_remaining, delay_secs = delay.as_secs(), "retrying");
                    std::thread::sleep(delay);
                }
            }
        };
        Ok(response)
    }
}

impl<T: AsyncTransport> ApiKit<T> {
    /// Async counterpart of `request`. Network waits and retry delays yield
    /// to the runtime.
    pub async fn request_async(&self, spec: &RequestSpec) -> Result<Response, ConfigurationError> {
        let request = self.build_request(spec)?;
        let span = request_span(spec, &request);

        let response = async {
            let mut retries_remaining = spec.retries;
            loop {
                let outcome = self.transport.send(&request).await;
                match self.parse_response(spec, &request, outcome, retries_remaining) {
                    Attempt::Done(response) => break response,
                    Attempt::Retry(delay) => {
                        retries_remaining -= 1;
                        debug!(retries_remaining, delay_secs = delay.as_secs(), "retrying");
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
        .instrument(span)
        .await;
        Ok(response)
    }
}

fn request_span(spec: &RequestSpec, request: &HttpRequest) -> Span {
    info_span!(
        "apikit.request",
        request_id = %Uuid::new_v4(),
        method = %request.method,
        path = %spec.path,
    )
}

/// Map a terminal transport failure to its envelope and echo it.
fn failure_response(spec: &RequestSpec, request: &HttpRequest, err: TransportError) -> Response {
    let method = request.method.as_str();
    let path = spec.path.as_str();
    match err {
        TransportError::Unreachable { kind, message } => {
            diagnostics::echo_failure(method, path, &message);
            Response::failure(
                STATUS_CONNECTION_ERROR,
                format!("Connection error: {kind} {message} {path}"),
            )
        }
        TransportError::Protocol { kind, message } => {
            diagnostics::echo_failure(method, path, &message);
            Response::failure(STATUS_TRANSPORT_ERROR, format!("{kind}: {message}"))
        }
        TransportError::Timeout { message } => {
            let secs = request.timeout.as_secs();
            diagnostics::echo_failure(method, path, &format!("[timeout {secs}s] {message}"));
            Response::failure(STATUS_TIMEOUT, format!("Timeout ({secs}s) for {path}"))
        }
        TransportError::Decode {
            status,
            text,
            message,
        } => {
            diagnostics::echo_failure(method, path, &message);
            Response::decode_failure(status, text, &message)
        }
    }
}

fn default_content_type(headers: &mut Vec<(String, String)>, value: &str) {
    if !headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
    {
        headers.push((CONTENT_TYPE.to_string(), value.to_string()));
    }
}

fn is_absolute(path: &str) -> bool {
    let lower = path.get(..8).unwrap_or(path).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// RFC 9110 token characters, valid in methods and header names.
fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}
