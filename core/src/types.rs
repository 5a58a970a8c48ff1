//! Wire DTOs for the upload API.
//!
//! # Design
//! Every upload carries exactly one record. `Envelope` stores its records as
//! `[R; 1]`, which serializes as a one-element JSON array under `d` and makes
//! a multi-record envelope unrepresentable. Event and profile records are
//! separate structs rather than one tagged enum so each keeps its own field
//! set and the `type` discriminator stays a plain field on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form key/value payload attached to an event or profile.
pub type Properties = Map<String, Value>;

/// Discriminator carried in the `type` field of every record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Event,
    Profile,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Event => write!(f, "event"),
            RecordKind::Profile => write!(f, "profile"),
        }
    }
}

/// A named event attributed to a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventRecord {
    pub identity: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    /// Seconds since the Unix epoch.
    pub ts: i64,
    #[serde(rename = "evtName")]
    pub event_name: String,
    #[serde(rename = "evtData")]
    pub event_data: Properties,
}

impl EventRecord {
    pub fn new(identity: &str, event_name: &str, event_data: Properties, ts: i64) -> Self {
        Self {
            identity: identity.to_string(),
            kind: RecordKind::Event,
            ts,
            event_name: event_name.to_string(),
            event_data,
        }
    }
}

/// An update to a user's profile properties.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileRecord {
    pub identity: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub ts: i64,
    #[serde(rename = "profileData")]
    pub profile_data: Properties,
}

impl ProfileRecord {
    pub fn new(identity: &str, profile_data: Properties, ts: i64) -> Self {
        Self {
            identity: identity.to_string(),
            kind: RecordKind::Profile,
            ts,
            profile_data,
        }
    }
}

/// Top-level upload body: `{"d": [record]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<R> {
    pub d: [R; 1],
}

impl<R> Envelope<R> {
    pub fn new(record: R) -> Self {
        Self { d: [record] }
    }

    pub fn record(&self) -> &R {
        &self.d[0]
    }
}

/// Success body documented for the upload endpoint. Every field defaults so
/// partial replies still decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub processed: u64,
    #[serde(default)]
    pub unprocessed: Vec<Value>,
}
