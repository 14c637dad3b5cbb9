//! HTTP client core for APIKit-style JSON APIs.
//!
//! # Overview
//! Describes a call as a `RequestSpec`, sends it through a pluggable
//! transport, retries after a fixed delay, and always returns a uniform
//! `Response` envelope. Network failures never surface as errors; they become
//! responses with negative sentinel status codes.
//!
//! # Design
//! - Request building and response classification are pure functions on
//!   `ApiKit`; transports only move bytes (host-does-IO pattern).
//! - One algorithm serves both concurrency models: `request` blocks on a
//!   `BlockingTransport`, `request_async` awaits an `AsyncTransport`.
//! - Parameters are JSON values and may be sent as JSON, MessagePack or a
//!   form body; GET requests put them in the query string.
//! - Configuration is read from the environment once, at construction.
//!
//! ```no_run
//! use apikit_core::{BlockingApiKit, RequestSpec};
//!
//! let apikit = BlockingApiKit::new("https://api.example.com")?;
//! let response = apikit.request(&RequestSpec::get("/status/ping"))?;
//! if response.is_success {
//!     println!("{:?}", response.data);
//! } else {
//!     eprintln!("{}", response.summary);
//! }
//! # Ok::<(), apikit_core::ConfigurationError>(())
//! ```

pub mod client;
pub mod config;
pub mod diagnostics;
pub mod encode;
pub mod error;
pub mod http;
pub mod retry;
pub mod transport;
pub mod types;

pub use client::{ApiKit, AsyncApiKit, Attempt, BlockingApiKit};
pub use config::{ClientConfig, DEFAULT_TIMEOUT_SECS, TIMEOUT_ENV_VAR};
pub use error::{ConfigurationError, TransportError};
pub use http::{HttpRequest, HttpResponse};
pub use retry::RetryOn;
pub use transport::{AsyncTransport, BlockingTransport, ReqwestTransport, UreqTransport};
pub use types::{
    Encoding, Json, OutputMode, Params, RequestSpec, RequestSpecBuilder, Response,
    STATUS_CONNECTION_ERROR, STATUS_TIMEOUT, STATUS_TRANSPORT_ERROR,
};
