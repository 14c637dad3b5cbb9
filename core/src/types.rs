//! Request description and response envelope.
//!
//! # Design
//! `RequestSpec` carries every per-call option as one value that can be
//! cloned, serialized and re-sent. Encoding and output selection are enums, so
//! the contradictory combinations a pair of booleans would allow cannot be
//! expressed; `RequestSpecBuilder` additionally rejects a caller who asks for
//! two encodings at once.
//!
//! `Response` is the single envelope returned for every call. Which optional
//! field is populated depends on `OutputMode` and on the failure class.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::retry::RetryOn;

/// Any JSON value. Objects keep insertion order.
pub type Json = serde_json::Value;

/// Ordered string-keyed mapping used for parameters and headers.
pub type Params = serde_json::Map<String, Json>;

/// Status code reported when the remote host could not be reached.
pub const STATUS_CONNECTION_ERROR: i32 = -3;
/// Status code reported for any other transport or protocol failure.
pub const STATUS_TRANSPORT_ERROR: i32 = -4;
/// Status code reported when a connect or read timeout fired.
pub const STATUS_TIMEOUT: i32 = -5;

pub const DEFAULT_METHOD: &str = "POST";
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

/// How `params` are sent for non-GET requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Json,
    #[serde(rename = "msgpack")]
    MsgPack,
    #[serde(rename = "form")]
    FormEncoded,
}

impl Encoding {
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::MsgPack => "msgpack",
            Encoding::FormEncoded => "form",
        }
    }
}

/// Which representation of the response body the caller wants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Parse the body as JSON into `Response::data`.
    #[default]
    ParsedJson,
    /// Return the body in `Response::text`, decoded with the declared
    /// charset (UTF-8 when none is declared).
    RawText,
    /// Return the raw bytes in `Response::content`.
    RawBinary,
}

/// Everything needed to perform one logical call, retries included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestSpec {
    /// Absolute URL, or a path relative to the client's base URL.
    pub path: String,
    pub method: String,
    pub params: Option<Params>,
    pub headers: Option<Params>,
    pub encoding: Encoding,
    pub output: OutputMode,
    /// Per-attempt timeout. `None` (or zero) uses the client default.
    pub timeout_secs: Option<u64>,
    /// Additional attempts allowed after the first one fails.
    pub retries: u32,
    pub retry_delay_secs: u64,
    /// Echo request and response at debug level even on success.
    pub debug: bool,
    pub retry_on: RetryOn,
}

impl Default for RequestSpec {
    fn default() -> Self {
        Self {
            path: String::new(),
            method: DEFAULT_METHOD.to_string(),
            params: None,
            headers: None,
            encoding: Encoding::default(),
            output: OutputMode::default(),
            timeout_secs: None,
            retries: 0,
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
            debug: true,
            retry_on: RetryOn::default(),
        }
    }
}

impl RequestSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(path).with_method("GET")
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(path)
    }

    /// Start a validated builder; see `RequestSpecBuilder`.
    pub fn builder(path: impl Into<String>) -> RequestSpecBuilder {
        RequestSpecBuilder {
            spec: Self::new(path),
            encodings: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.params
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: Params) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.headers
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay_secs(mut self, secs: u64) -> Self {
        self.retry_delay_secs = secs;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_retry_on(mut self, retry_on: RetryOn) -> Self {
        self.retry_on = retry_on;
        self
    }

    /// The method as it goes on the wire.
    pub(crate) fn normalized_method(&self) -> String {
        self.method.trim().to_ascii_uppercase()
    }
}

/// Builder that records every encoding the caller selects and refuses to
/// build when they disagree.
#[derive(Debug, Clone)]
pub struct RequestSpecBuilder {
    spec: RequestSpec,
    encodings: Vec<Encoding>,
}

impl RequestSpecBuilder {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.spec.method = method.into();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.spec = self.spec.with_param(key, value);
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.spec.params = Some(params);
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.spec = self.spec.with_header(key, value);
        self
    }

    pub fn headers(mut self, headers: Params) -> Self {
        self.spec.headers = Some(headers);
        self
    }

    pub fn json(mut self) -> Self {
        self.encodings.push(Encoding::Json);
        self
    }

    pub fn msgpack(mut self) -> Self {
        self.encodings.push(Encoding::MsgPack);
        self
    }

    pub fn form_encoded(mut self) -> Self {
        self.encodings.push(Encoding::FormEncoded);
        self
    }

    pub fn output(mut self, output: OutputMode) -> Self {
        self.spec.output = output;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.spec.timeout_secs = Some(secs);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.spec.retries = retries;
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.spec.retry_delay_secs = secs;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.spec.debug = debug;
        self
    }

    pub fn retry_on(mut self, retry_on: RetryOn) -> Self {
        self.spec.retry_on = retry_on;
        self
    }

    pub fn build(self) -> Result<RequestSpec, ConfigurationError> {
        let mut spec = self.spec;
        if let Some((&first, rest)) = self.encodings.split_first() {
            if let Some(&second) = rest.iter().find(|&&e| e != first) {
                return Err(ConfigurationError::ConflictingEncoding {
                    first: first.name(),
                    second: second.name(),
                });
            }
            spec.encoding = first;
        }
        Ok(spec)
    }
}

/// Uniform result of a call.
///
/// `is_success` equals `(200..=299).contains(&status_code)` for every
/// response that was shaped normally. A body that fails to decode keeps its
/// real status code but is never a success. Negative status codes are
/// sentinels for calls that never received a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: i32,
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<u8>>,
    pub summary: String,
}

impl Response {
    /// Envelope for a received response; `raw_text` feeds the failure summary.
    pub fn received(status: u16, raw_text: &str) -> Self {
        let is_success = is_success_status(i32::from(status));
        let summary = if is_success {
            format!("{status} success")
        } else {
            format!("{status} fail: {raw_text}")
        };
        Self {
            status_code: i32::from(status),
            is_success,
            data: None,
            text: None,
            content: None,
            summary,
        }
    }

    /// Envelope for a call that ended without a usable response.
    pub fn failure(status_code: i32, summary: impl Into<String>) -> Self {
        Self {
            status_code,
            is_success: false,
            data: None,
            text: None,
            content: None,
            summary: summary.into(),
        }
    }

    /// Envelope for a received response whose body could not be decoded.
    pub fn decode_failure(status: u16, raw_text: impl Into<String>, message: &str) -> Self {
        Self {
            status_code: i32::from(status),
            is_success: false,
            data: Some(Json::Object(Params::new())),
            text: Some(raw_text.into()),
            content: None,
            summary: format!("{status} error {message}"),
        }
    }

    pub fn with_data(mut self, data: Json) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_content(mut self, content: Vec<u8>) -> Self {
        self.content = Some(content);
        self
    }
}

pub fn is_success_status(status: i32) -> bool {
    (200..=299).contains(&status)
}
