//! Blocking client for the CleverTap upload API (events and profile updates).
//!
//! # Overview
//! Every call wraps one record in a `{"d": [record]}` envelope, POSTs it to
//! `/1/upload` with the account-id and passcode headers, and classifies the
//! reply by status: 2xx is success, anything else is an `ApiError`.
//!
//! # Design
//! - `CleverTapClient` is sans-IO: `build_*` produces an `HttpRequest`,
//!   `parse_*` consumes an `HttpResponse`. Timestamps are explicit inputs.
//! - `BlockingClient` adds the clock and a `ureq::Agent` to run the
//!   round-trip.
//! - Reply bodies are only decoded by the `*_decoded` operations.
//! - No retries, batching or queuing. One call is one record is one request.
//!
//! ```no_run
//! use clevertap_core::{BlockingClient, ClientConfig, Properties};
//! use serde_json::json;
//!
//! let config = ClientConfig::new("https://api.clevertap.com", "ACC1", "PASS1")?;
//! let client = BlockingClient::new(config)?;
//!
//! let mut data = Properties::new();
//! data.insert("amount".to_string(), json!(9.99));
//! client.send_event("user-42", "purchase", data)?;
//! # Ok::<(), clevertap_core::ApiError>(())
//! ```

pub mod blocking;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod types;

pub use blocking::BlockingClient;
pub use client::CleverTapClient;
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpRequest, HttpResponse};
pub use types::{Envelope, EventRecord, ProfileRecord, Properties, RecordKind, UploadResponse};
