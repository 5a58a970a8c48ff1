//! Blocking executor that performs the HTTP round-trip with ureq.
//!
//! # Design
//! `BlockingClient` pairs a `CleverTapClient` with a `ureq::Agent`. It
//! stamps the record with the current time, executes the built request, and
//! hands the reply to the matching `parse_*` method. The agent owns
//! connection pooling and the timeout, and is shared by clones of the client.

use chrono::Utc;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use ureq::Agent;

use crate::client::CleverTapClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Properties, RecordKind};

#[derive(Clone)]
pub struct BlockingClient {
    core: CleverTapClient,
    agent: Agent,
}

impl BlockingClient {
    /// Build a client with an agent configured from `config`.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout()))
            .build()
            .new_agent();
        Self::with_agent(config, agent)
    }

    /// Build a client around a caller-supplied agent. The agent's own
    /// timeouts apply and `config.timeout()` is ignored.
    ///
    /// The agent should be built with `http_status_as_error(false)`.
    /// Otherwise rejected uploads are still reported as `HttpError`, but
    /// the reply body is lost and the error message carries only the status.
    pub fn with_agent(config: ClientConfig, agent: Agent) -> Result<Self, ApiError> {
        Ok(Self {
            core: CleverTapClient::new(config)?,
            agent,
        })
    }

    pub fn core(&self) -> &CleverTapClient {
        &self.core
    }

    pub fn send_event(&self, identity: &str, event_name: &str, event_data: Properties) -> Result<(), ApiError> {
        let response = self.send_event_raw(identity, event_name, event_data)?;
        self.core.parse_send_event(response).inspect_err(log_rejection)
    }

    pub fn send_profile(&self, identity: &str, profile_data: Properties) -> Result<(), ApiError> {
        let response = self.send_profile_raw(identity, profile_data)?;
        self.core.parse_send_profile(response).inspect_err(log_rejection)
    }

    /// Like `send_event`, but decodes a successful reply body into `T`.
    pub fn send_event_decoded<T: DeserializeOwned>(
        &self,
        identity: &str,
        event_name: &str,
        event_data: Properties,
    ) -> Result<T, ApiError> {
        let response = self.send_event_raw(identity, event_name, event_data)?;
        self.core.parse_send_event_decoded(response).inspect_err(log_rejection)
    }

    /// Like `send_profile`, but decodes a successful reply body into `T`.
    pub fn send_profile_decoded<T: DeserializeOwned>(
        &self,
        identity: &str,
        profile_data: Properties,
    ) -> Result<T, ApiError> {
        let response = self.send_profile_raw(identity, profile_data)?;
        self.core.parse_send_profile_decoded(response).inspect_err(log_rejection)
    }

    fn send_event_raw(&self, identity: &str, event_name: &str, event_data: Properties) -> Result<HttpResponse, ApiError> {
        let request = self.core.build_send_event(identity, event_name, event_data, now())?;
        self.execute(RecordKind::Event, request)
    }

    fn send_profile_raw(&self, identity: &str, profile_data: Properties) -> Result<HttpResponse, ApiError> {
        let request = self.core.build_send_profile(identity, profile_data, now())?;
        self.execute(RecordKind::Profile, request)
    }

    fn execute(&self, kind: RecordKind, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(url = %request.url, %kind, "uploading record");

        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = match builder.send(request.body.as_bytes()) {
            Ok(response) => response,
            // Agents that treat statuses as errors drop the body.
            Err(ureq::Error::StatusCode(status)) => {
                return Ok(HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: String::new(),
                });
            }
            Err(e) => {
                warn!(url = %request.url, %kind, error = %e, "upload transport failure");
                return Err(ApiError::Transport(e));
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        // Uncapped, and the body need not be UTF-8.
        let bytes = response.body_mut().with_config().limit(u64::MAX).read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        debug!(status, %kind, "upload response received");
        Ok(HttpResponse { status, headers, body })
    }
}

fn now() -> i64 {
    Utc::now().timestamp()
}

fn log_rejection(err: &ApiError) {
    if let ApiError::HttpError { kind, status, .. } = err {
        warn!(%kind, status, "upload rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_resolves_upload_url() {
        let config = ClientConfig::new("https://api.example.com", "ACC1", "PASS1").unwrap();
        let client = BlockingClient::new(config).unwrap();
        assert_eq!(client.core().upload_url(), "https://api.example.com/1/upload");
        assert_eq!(client.core().config().account_id(), "ACC1");
    }

    #[test]
    fn now_is_epoch_seconds() {
        // Sanity bounds: after 2020-01-01 and before 2100-01-01.
        let ts = now();
        assert!(ts > 1_577_836_800);
        assert!(ts < 4_102_444_800);
    }
}
