//! Upload scenarios against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port in a background thread
//! with its own `MockState`, then drives `BlockingClient` over real HTTP and
//! inspects what the server recorded. Replies axum cannot produce come from
//! a one-shot raw TCP responder instead.

use std::io::{Read, Write};
use std::time::Duration;

use clevertap_core::{
    ApiError, BlockingClient, ClientConfig, Envelope, EventRecord, ProfileRecord, Properties,
    RecordKind, UploadResponse,
};
use mock_server::MockState;
use serde_json::{json, Value};

/// Serve `state` on 127.0.0.1 and return the base URL.
fn start_mock_server(state: MockState) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, state).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// Answer one request with a hand-written reply, for bodies axum will not
/// produce (e.g. invalid UTF-8). Returns the base URL.
fn start_raw_server(status_line: &'static str, body: &'static [u8]) -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();

        // Consume the request head and body before replying.
        let mut request = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = stream.read(&mut chunk).unwrap();
            request.extend_from_slice(&chunk[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            assert!(n > 0, "connection closed before request head");
        };
        let head = String::from_utf8_lossy(&request[..head_end]).to_ascii_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while request.len() < head_end + content_length {
            let n = stream.read(&mut chunk).unwrap();
            assert!(n > 0, "connection closed before request body");
            request.extend_from_slice(&chunk[..n]);
        }

        let head = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).unwrap();
        stream.write_all(body).unwrap();
        stream.flush().unwrap();
    });

    format!("http://{addr}")
}

fn client_for(base_url: &str) -> BlockingClient {
    let config = ClientConfig::new(base_url, "ACC1", "PASS1")
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    BlockingClient::new(config).unwrap()
}

fn props(value: Value) -> Properties {
    value.as_object().cloned().unwrap()
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

#[test]
fn send_event_uploads_single_event_record() {
    let state = MockState::new();
    let client = client_for(&start_mock_server(state.clone()));

    let before = unix_now();
    client
        .send_event("user-42", "purchase", props(json!({"amount": 9.99})))
        .unwrap();
    let after = unix_now();

    let uploads = state.blocking_uploads();
    assert_eq!(uploads.len(), 1);
    let upload = &uploads[0];
    assert_eq!(upload.account_id.as_deref(), Some("ACC1"));
    assert_eq!(upload.passcode.as_deref(), Some("PASS1"));
    assert_eq!(
        upload.content_type.as_deref(),
        Some("application/json; charset=utf-8")
    );

    let envelope: Envelope<EventRecord> = serde_json::from_value(upload.body.clone()).unwrap();
    let record = envelope.record();
    assert_eq!(record.kind, RecordKind::Event);
    assert_eq!(record.identity, "user-42");
    assert_eq!(record.event_name, "purchase");
    assert_eq!(record.event_data["amount"], 9.99);
    assert!(record.ts >= before && record.ts <= after, "ts {} outside [{before}, {after}]", record.ts);

    assert_eq!(
        upload.body,
        json!({"d":[{"identity":"user-42","type":"event","ts":record.ts,"evtName":"purchase","evtData":{"amount":9.99}}]})
    );
}

#[test]
fn send_profile_uploads_single_profile_record() {
    let state = MockState::new();
    let client = client_for(&start_mock_server(state.clone()));

    client
        .send_profile("user-42", props(json!({"plan": "gold", "age": 31})))
        .unwrap();

    let uploads = state.blocking_uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].passcode.as_deref(), Some("PASS1"));

    let record = &uploads[0].body["d"][0];
    assert_eq!(record["type"], "profile");
    assert_eq!(record["identity"], "user-42");
    assert_eq!(record["profileData"], json!({"plan": "gold", "age": 31}));
    assert!(record.get("evtName").is_none());

    let envelope: Envelope<ProfileRecord> = serde_json::from_value(uploads[0].body.clone()).unwrap();
    assert!((envelope.record().ts - unix_now()).abs() <= 5);
}

#[test]
fn each_call_is_its_own_upload() {
    let state = MockState::new();
    let client = client_for(&start_mock_server(state.clone()));

    client.send_event("a", "login", Properties::new()).unwrap();
    client.send_event("b", "logout", Properties::new()).unwrap();
    client.send_profile("a", Properties::new()).unwrap();

    let uploads = state.blocking_uploads();
    assert_eq!(uploads.len(), 3);
    for upload in &uploads {
        assert_eq!(upload.body["d"].as_array().unwrap().len(), 1);
    }
    assert_eq!(uploads[1].body["d"][0]["evtName"], "logout");
    assert_eq!(uploads[2].body["d"][0]["type"], "profile");
}

#[test]
fn rejection_body_is_reported_for_events_only() {
    let state = MockState::with_reply(403, "invalid account");
    let client = client_for(&start_mock_server(state));

    let event_err = client
        .send_event("user-42", "purchase", props(json!({"amount": 9.99})))
        .unwrap_err();
    assert!(matches!(
        event_err,
        ApiError::HttpError { kind: RecordKind::Event, status: 403, .. }
    ));
    assert!(event_err.to_string().contains("invalid account"));

    let profile_err = client
        .send_profile("user-42", props(json!({"plan": "gold"})))
        .unwrap_err();
    assert_eq!(profile_err.status(), Some(403));
    assert!(!profile_err.to_string().contains("invalid account"));
}

#[test]
fn profile_rejection_body_when_enabled() {
    let base_url = start_mock_server(MockState::with_reply(403, "invalid account"));
    let config = ClientConfig::new(&base_url, "ACC1", "PASS1")
        .unwrap()
        .with_profile_error_body(true);
    let client = BlockingClient::new(config).unwrap();

    let err = client.send_profile("user-42", Properties::new()).unwrap_err();
    assert!(err.to_string().contains("invalid account"));
}

#[test]
fn empty_success_body_is_not_an_error() {
    let client = client_for(&start_mock_server(MockState::with_reply(200, "")));

    client.send_event("user-42", "purchase", Properties::new()).unwrap();
    client.send_profile("user-42", Properties::new()).unwrap();
}

#[test]
fn decoded_send_returns_upload_response() {
    let client = client_for(&start_mock_server(MockState::new()));

    let response: UploadResponse = client
        .send_event_decoded("user-42", "purchase", Properties::new())
        .unwrap();
    assert_eq!(response.status, "success");
    assert_eq!(response.processed, 1);
    assert!(response.unprocessed.is_empty());

    let response: UploadResponse = client.send_profile_decoded("user-42", Properties::new()).unwrap();
    assert_eq!(response.processed, 1);
}

#[test]
fn decoded_send_with_empty_body_fails() {
    let client = client_for(&start_mock_server(MockState::with_reply(200, "")));

    let err = client
        .send_event_decoded::<UploadResponse>("user-42", "purchase", Properties::new())
        .unwrap_err();
    assert!(matches!(err, ApiError::DeserializationError(_)));
}

#[test]
fn agent_treating_status_as_error_still_yields_http_error() {
    let base_url = start_mock_server(MockState::with_reply(401, "bad passcode"));
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(true)
        .build()
        .new_agent();
    let config = ClientConfig::new(&base_url, "ACC1", "PASS1").unwrap();
    let client = BlockingClient::with_agent(config, agent).unwrap();

    let err = client.send_event("user-42", "purchase", Properties::new()).unwrap_err();
    assert!(matches!(
        err,
        ApiError::HttpError { status: 401, body: Some(ref b), .. } if b.is_empty()
    ));
    assert_eq!(err.to_string(), "event upload rejected with HTTP 401");
}

#[test]
fn non_utf8_success_body_is_not_an_error() {
    let client = client_for(&start_raw_server("200 OK", b"\xff\xfe ok"));

    client.send_event("user-42", "purchase", Properties::new()).unwrap();
}

#[test]
fn non_utf8_rejection_body_is_reported_lossily() {
    let client = client_for(&start_raw_server("403 Forbidden", b"invalid account \xff"));

    let err = client.send_event("user-42", "purchase", Properties::new()).unwrap_err();
    assert!(matches!(
        err,
        ApiError::HttpError { kind: RecordKind::Event, status: 403, .. }
    ));
    assert!(err.to_string().contains("invalid account \u{fffd}"));
}

#[test]
fn non_utf8_profile_rejection_is_http_error() {
    let client = client_for(&start_raw_server("500 Internal Server Error", b"\xc3\x28"));

    let err = client.send_profile("user-42", Properties::new()).unwrap_err();
    assert_eq!(err.status(), Some(500));
}

#[test]
fn connection_refused_is_transport_failure() {
    // Bind then drop to get a port nothing listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = client_for(&format!("http://{addr}"));

    let err = client.send_profile("user-42", Properties::new()).unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}
