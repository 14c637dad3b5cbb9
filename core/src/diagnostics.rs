//! Human-readable echo of requests and responses.
//!
//! Lines are rendered as an `httpie`-style command so a failing call can be
//! replayed by hand. Failed calls (status >= 400) redact header values; debug
//! echoes of successful calls show them.

use tracing::{debug, warn};

use crate::types::Params;

const TARGET: &str = "apikit::diagnostics";

pub fn request_line(
    method: &str,
    path: &str,
    params: Option<&Params>,
    headers: &[(String, String)],
    redact: bool,
) -> String {
    let params_str = params
        .map(|p| {
            p.iter()
                .map(|(k, v)| format!("{k}:={v}"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let headers_str = headers
        .iter()
        .map(|(k, v)| {
            if redact {
                format!("{k}:?")
            } else {
                format!("{k}:{v:?}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("http --follow --verify=no {method} {path} {params_str} {headers_str}")
}

pub fn response_line(status: u16, text: &str) -> String {
    format!("> {status} {text}")
}

pub fn failure_line(method: &str, path: &str, detail: &str) -> String {
    format!("http --follow --verify=no {method} {path} > {detail}")
}

/// Echo a received response. Always emitted for status >= 400, otherwise
/// only when `debug` is set.
pub fn echo_exchange(
    method: &str,
    path: &str,
    params: Option<&Params>,
    headers: &[(String, String)],
    status: u16,
    text: &str,
    debug: bool,
) {
    if status >= 400 {
        warn!(target: TARGET, "{}", request_line(method, path, params, headers, true));
        warn!(target: TARGET, "{}", response_line(status, text));
    } else if debug {
        debug!(target: TARGET, "{}", request_line(method, path, params, headers, false));
        debug!(target: TARGET, "{}", response_line(status, text));
    }
}

pub fn echo_failure(method: &str, path: &str, detail: &str) {
    warn!(target: TARGET, "{}", failure_line(method, path, detail));
}
