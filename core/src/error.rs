//! Error types for the upload client.
//!
//! # Design
//! Non-2xx replies land in `HttpError` tagged with the record kind that was
//! rejected. Whether the reply body is attached depends on the kind and on
//! `ClientConfig::with_profile_error_body`: event rejections always carry it,
//! profile rejections only when enabled.

use thiserror::Error;

use crate::types::RecordKind;

/// Errors returned by `CleverTapClient` and `BlockingClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network, DNS, TLS or I/O failure while talking to the service.
    #[error("transport failure: {0}")]
    Transport(#[from] ureq::Error),

    /// The base URL could not be parsed or the endpoint could not be resolved
    /// against it.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The service answered with a status outside 200..=299.
    #[error("{kind} upload rejected with HTTP {status}{}", detail(.body))]
    HttpError {
        kind: RecordKind,
        status: u16,
        body: Option<String>,
    },

    /// The response body could not be deserialized into the requested type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

impl ApiError {
    /// HTTP status of a rejected upload, if that is what this error is.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn detail(body: &Option<String>) -> String {
    match body {
        Some(body) if !body.is_empty() => format!(": {body}"),
        _ => String::new(),
    }
}
