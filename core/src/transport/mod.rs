//! Transport collaborators.
//!
//! # Design
//! The executor never performs I/O itself. It hands a fully built
//! `HttpRequest` to a transport and classifies whatever comes back. The two
//! traits differ only in how they wait: `BlockingTransport` occupies the
//! calling thread, `AsyncTransport` yields to the runtime. Implementations
//! must translate their library errors into `TransportError` so the
//! executor can pick the right sentinel status code.

mod blocking;
mod nonblocking;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{HttpRequest, HttpResponse};

pub use blocking::UreqTransport;
pub use nonblocking::ReqwestTransport;

/// Redirect limit shared by the bundled transports.
pub const MAX_REDIRECTS: u32 = 10;

/// Performs one HTTP round-trip on the calling thread.
pub trait BlockingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Performs one HTTP round-trip, suspending while waiting on the network.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Flatten an error and its sources into one line.
pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// True when any error in the chain is an I/O error of the given kind.
pub(crate) fn has_io_kind(
    err: &(dyn std::error::Error + 'static),
    kind: std::io::ErrorKind,
) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == kind {
                return true;
            }
        }
        current = e.source();
    }
    false
}
