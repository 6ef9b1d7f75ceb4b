//! SSE Stream Integration Tests
//!
//! Exercises the long-lived GET event stream against a mock server:
//! delivery, `last_event_id` tracking, resumption with `Last-Event-ID`,
//! and the legacy endpoint event.

use std::time::Duration;

use wiremock::matchers::{header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use tether_mcp::protocol::JsonRpcMessage;
use tether_mcp::transport::{HttpConfig, HttpTransport, TransportEvent};

fn quick_config(server: &MockServer) -> HttpConfig {
    let mut config = HttpConfig::new(format!("{}/mcp", server.uri())).unwrap();
    config.retry_delay = Duration::from_millis(50);
    config.min_request_interval = Duration::from_millis(0);
    config
}

/// Matches requests that carry no `Last-Event-ID` header
struct NoLastEventId;

impl Match for NoLastEventId {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("last-event-id")
    }
}

#[tokio::test]
async fn events_are_delivered_and_cursor_advances() {
    let server = MockServer::start().await;

    let first_connect = concat!(
        "id: 101\n",
        "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/tools/list_changed\"}\n",
        "\n",
        "id: 102\n",
        "data: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/prompts/list_changed\"}\n",
        "\n",
    );

    // Initial connection: no resumption header yet.
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .and(NoLastEventId)
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(first_connect, "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;
    // After the stream drops, the reconnect must resume after 102.
    Mock::given(method("GET"))
        .and(path("/mcp"))
        .and(header("Last-Event-ID", "102"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
        .expect(1..)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let mut events = transport.take_events().unwrap();
    transport.start_sse().await;

    let mut methods = Vec::new();
    for _ in 0..2 {
        match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Some(TransportEvent::Message(JsonRpcMessage::Notification(notification)))) => {
                methods.push(notification.method);
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }
    assert_eq!(
        methods,
        vec![
            "notifications/tools/list_changed".to_string(),
            "notifications/prompts/list_changed".to_string()
        ]
    );
    assert_eq!(transport.last_event_id().await.as_deref(), Some("102"));

    // Give the listener time to reconnect with the resumption header;
    // wiremock verifies the expectation on drop.
    tokio::time::sleep(Duration::from_millis(400)).await;

    transport.close().await.unwrap();
}

#[tokio::test]
async fn replayed_events_after_reconnect_are_delivered() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(NoLastEventId)
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "id: 100\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",\"params\":{\"progressToken\":\"t\",\"progress\":1.0}}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    // The server replays everything after the presented id.
    Mock::given(method("GET"))
        .and(header("Last-Event-ID", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            concat!(
                "id: 101\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",\"params\":{\"progressToken\":\"t\",\"progress\":2.0}}\n\n",
                "id: 102\ndata: {\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",\"params\":{\"progressToken\":\"t\",\"progress\":3.0}}\n\n",
            ),
            "text/event-stream",
        ))
        .mount(&server)
        .await;
    // Subsequent reconnects resume after the replayed events.
    Mock::given(method("GET"))
        .and(header("Last-Event-ID", "102"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("", "text/event-stream"))
        .mount(&server)
        .await;

    let mut transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let mut events = transport.take_events().unwrap();
    transport.start_sse().await;

    let mut progress = Vec::new();
    for _ in 0..3 {
        match tokio::time::timeout(Duration::from_secs(5), events.recv()).await {
            Ok(Some(TransportEvent::Message(JsonRpcMessage::Notification(notification)))) => {
                let value = notification.params.unwrap()["progress"].as_f64().unwrap();
                progress.push(value);
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    assert_eq!(progress, vec![1.0, 2.0, 3.0]);
    assert_eq!(transport.last_event_id().await.as_deref(), Some("102"));

    transport.close().await.unwrap();
}

#[tokio::test]
async fn legacy_endpoint_event_redirects_posts() {
    let server = MockServer::start().await;

    let endpoint_event =
        "event: endpoint\ndata: {\"uri\": \"/mcp/post?session_id=legacy-7\"}\n\n";
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(endpoint_event, "text/event-stream"))
        .mount(&server)
        .await;

    let transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    transport.start_sse().await;
    transport
        .wait_for_endpoint(Duration::from_secs(5))
        .await
        .unwrap();

    let post_url = transport.post_url().await;
    assert_eq!(post_url.path(), "/mcp/post");
    assert_eq!(transport.session_id().await.as_deref(), Some("legacy-7"));

    transport.close().await.unwrap();
}

#[tokio::test]
async fn method_not_allowed_disables_the_stream_quietly() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let mut events = transport.take_events().unwrap();
    transport.start_sse().await;

    // No error events and no reconnect storm.
    let outcome = tokio::time::timeout(Duration::from_millis(400), events.recv()).await;
    assert!(outcome.is_err(), "expected silence, got {outcome:?}");

    transport.close().await.unwrap();
}
