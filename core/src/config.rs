//! Client configuration.
//!
//! Built once with `ClientConfig::new` and refined with consuming `with_*`
//! setters. Nothing is read from the environment.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ApiError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct ClientConfig {
    base_url: Url,
    account_id: String,
    passcode: String,
    timeout: Duration,
    include_profile_error_body: bool,
}

impl ClientConfig {
    /// # Errors
    /// Returns `ApiError::InvalidUrl` if `base_url` is not an absolute URL
    /// that paths can be resolved against.
    pub fn new(base_url: &str, account_id: &str, passcode: &str) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            account_id: account_id.to_string(),
            passcode: passcode.to_string(),
            timeout: DEFAULT_TIMEOUT,
            include_profile_error_body: false,
        })
    }

    /// Overall deadline for one upload, connect through body read.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attach the reply body to profile rejections as well as event ones.
    pub fn with_profile_error_body(mut self, include: bool) -> Self {
        self.include_profile_error_body = include;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn passcode(&self) -> &str {
        &self.passcode
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn include_profile_error_body(&self) -> bool {
        self.include_profile_error_body
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("account_id", &self.account_id)
            .field("passcode", &"*****")
            .field("timeout", &self.timeout)
            .field("include_profile_error_body", &self.include_profile_error_body)
            .finish()
    }
}
