//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! These types describe the upload request and its reply as plain data.
//! `CleverTapClient` builds `HttpRequest` values and classifies
//! `HttpResponse` values without touching the network. `BlockingClient`
//! executes them with ureq, but any HTTP stack can do the same.
//!
//! The upload API only accepts POST, so the request carries no method.

/// Endpoint for both event and profile uploads, resolved against the base URL.
pub const UPLOAD_PATH: &str = "/1/upload";

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const ACCOUNT_ID_HEADER: &str = "X-CleverTap-Account-Id";
pub const PASSCODE_HEADER: &str = "X-CleverTap-Passcode";

pub const APPLICATION_JSON_UTF8: &str = "application/json; charset=utf-8";

/// A POST request described as plain data.
///
/// Built by `CleverTapClient::build_*` methods. Headers are kept in the order
/// they are sent.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpRequest {
    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by whoever executed the `HttpRequest`, then passed to
/// `CleverTapClient::parse_*` methods.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..=299).contains(&self.status)
    }
}
