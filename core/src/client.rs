//! Stateless request builder and response classifier for the upload API.
//!
//! # Design
//! `CleverTapClient` holds only configuration and the resolved upload URL.
//! Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Timestamps are passed in rather than read from a clock, so building is
//! deterministic. The caller (usually `BlockingClient`) does the round-trip.
//!
//! Plain `parse_*` methods never look at a successful body. Only the
//! `parse_*_decoded` variants decode it, so empty or non-JSON success replies
//! do not fail uploads whose result nobody reads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{
    HttpRequest, HttpResponse, ACCOUNT_ID_HEADER, APPLICATION_JSON_UTF8, CONTENT_TYPE_HEADER,
    PASSCODE_HEADER, UPLOAD_PATH,
};
use crate::types::{Envelope, EventRecord, ProfileRecord, Properties, RecordKind};

#[derive(Debug, Clone)]
pub struct CleverTapClient {
    config: ClientConfig,
    upload_url: Url,
}

impl CleverTapClient {
    /// # Errors
    /// Returns `ApiError::InvalidUrl` if the upload path cannot be resolved
    /// against the configured base URL.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let upload_url = config
            .base_url()
            .join(UPLOAD_PATH)
            .map_err(|e| ApiError::InvalidUrl(format!("{}{UPLOAD_PATH}: {e}", config.base_url())))?;
        Ok(Self { config, upload_url })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn upload_url(&self) -> &str {
        self.upload_url.as_str()
    }

    pub fn build_send_event(
        &self,
        identity: &str,
        event_name: &str,
        event_data: Properties,
        ts: i64,
    ) -> Result<HttpRequest, ApiError> {
        self.build_upload(&Envelope::new(EventRecord::new(identity, event_name, event_data, ts)))
    }

    pub fn build_send_profile(
        &self,
        identity: &str,
        profile_data: Properties,
        ts: i64,
    ) -> Result<HttpRequest, ApiError> {
        self.build_upload(&Envelope::new(ProfileRecord::new(identity, profile_data, ts)))
    }

    pub fn parse_send_event(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, RecordKind::Event, true)
    }

    pub fn parse_send_profile(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(
            &response,
            RecordKind::Profile,
            self.config.include_profile_error_body(),
        )
    }

    pub fn parse_send_event_decoded<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(&response, RecordKind::Event, true)?;
        decode(&response)
    }

    pub fn parse_send_profile_decoded<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        check_status(
            &response,
            RecordKind::Profile,
            self.config.include_profile_error_body(),
        )?;
        decode(&response)
    }

    fn build_upload<R: Serialize>(&self, envelope: &Envelope<R>) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(envelope).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            url: self.upload_url.to_string(),
            headers: vec![
                (CONTENT_TYPE_HEADER.to_string(), APPLICATION_JSON_UTF8.to_string()),
                (ACCOUNT_ID_HEADER.to_string(), self.config.account_id().to_string()),
                (PASSCODE_HEADER.to_string(), self.config.passcode().to_string()),
            ],
            body,
        })
    }
}

/// Map any status outside 200..=299 to `ApiError::HttpError`.
fn check_status(response: &HttpResponse, kind: RecordKind, include_body: bool) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::HttpError {
        kind,
        status: response.status,
        body: include_body.then(|| response.body.clone()),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
