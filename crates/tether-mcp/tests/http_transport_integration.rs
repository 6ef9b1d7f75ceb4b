//! HTTP Transport Integration Tests
//!
//! Exercises the POST send path against a mock server: retry policy,
//! authentication, header composition, and session header capture.

use std::time::{Duration, Instant};

use bytes::Bytes;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tether_mcp::protocol::{codec, JsonRpcMessage, RequestId};
use tether_mcp::transport::{HttpConfig, HttpTransport, TransportError, TransportEvent};
use tokio_test::assert_ok;

fn quick_config(server: &MockServer) -> HttpConfig {
    let mut config = HttpConfig::new(format!("{}/mcp", server.uri())).unwrap();
    config.retry_delay = Duration::from_millis(50);
    config.min_request_interval = Duration::from_millis(0);
    config
}

fn encoded_request(method_name: &str, id: i64) -> Bytes {
    codec::encode_request(method_name, None, RequestId::new_number(id)).unwrap()
}

#[tokio::test]
async fn retry_on_503_then_success() {
    let server = MockServer::start().await;

    // Two transient failures, then the real response.
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/mcp"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"jsonrpc":"2.0","id":7,"result":{"tools":[]}}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let config = quick_config(&server);
    let retry_delay = config.retry_delay;
    let mut transport = HttpTransport::connect(config, None).unwrap();
    let mut events = transport.take_events().unwrap();

    let started = Instant::now();
    transport.send(encoded_request("tools/list", 7)).await.unwrap();
    let elapsed = started.elapsed();

    match events.recv().await {
        Some(TransportEvent::Message(JsonRpcMessage::Response(response))) => {
            assert_eq!(response.id, Some(RequestId::new_number(7)));
            assert_eq!(response.result.unwrap()["tools"], serde_json::json!([]));
        }
        other => panic!("expected decoded response, got {other:?}"),
    }

    // Two retries happened, with backoff of roughly delay + 2*delay.
    assert_eq!(transport.stats().retries, 2);
    assert!(
        elapsed >= retry_delay + retry_delay,
        "elapsed {elapsed:?} shorter than the backoff sequence"
    );

    transport.close().await.unwrap();
}

#[tokio::test]
async fn retries_exhausted_surfaces_last_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // initial attempt + 2 retries
        .mount(&server)
        .await;

    let mut config = quick_config(&server);
    config.max_retries = 2;
    config.retry_delay = Duration::from_millis(10);
    let transport = HttpTransport::connect(config, None).unwrap();

    let err = transport.send(encoded_request("ping", 1)).await.unwrap_err();
    match err {
        TransportError::RetriesExhausted { attempts, last_error } => {
            assert_eq!(attempts, 3);
            assert!(last_error.contains("503"), "last error: {last_error}");
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn auth_rejection_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let err = transport.send(encoded_request("ping", 1)).await.unwrap_err();

    assert!(matches!(err, TransportError::Auth { status: 401 }));
    assert_eq!(transport.stats().retries, 0);
}

#[tokio::test]
async fn non_retriable_status_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let err = transport.send(encoded_request("ping", 1)).await.unwrap_err();

    assert!(matches!(err, TransportError::HttpStatus { status: 404 }));
}

#[tokio::test]
async fn bearer_auth_and_user_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer tok-123"))
        .and(header("X-Tenant", "acme"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let config = quick_config(&server)
        .bearer_auth("tok-123")
        .header("X-Tenant", "acme");
    let transport = HttpTransport::connect(config, None).unwrap();

    assert_ok!(transport.send(encoded_request("ping", 1)).await);
}

#[tokio::test]
async fn json_response_mode_narrows_the_accept_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = quick_config(&server);
    config.json_response_mode = true;
    let transport = HttpTransport::connect(config, None).unwrap();

    assert_ok!(transport.send(encoded_request("ping", 1)).await);
}

#[tokio::test]
async fn session_header_is_captured_and_echoed() {
    let server = MockServer::start().await;

    // First POST returns the session header.
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"id": 1})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Mcp-Session-Id", "sess-42")
                .set_body_raw(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;
    // Later POSTs must echo it.
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({"id": 2})))
        .and(header("Mcp-Session-Id", "sess-42"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let mut events = transport.take_events().unwrap();

    transport.send(encoded_request("initialize", 1)).await.unwrap();
    assert!(matches!(
        events.recv().await,
        Some(TransportEvent::Message(_))
    ));
    assert_eq!(transport.session_id().await.as_deref(), Some("sess-42"));

    transport.send(encoded_request("ping", 2)).await.unwrap();
    transport.close().await.unwrap();
}

#[tokio::test]
async fn post_response_as_sse_stream_is_decoded() {
    let server = MockServer::start().await;
    let sse_body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{\"ok\":true}}\n\n";
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let mut transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let mut events = transport.take_events().unwrap();

    transport.send(encoded_request("slow/op", 3)).await.unwrap();

    match events.recv().await {
        Some(TransportEvent::Message(JsonRpcMessage::Response(response))) => {
            assert_eq!(response.id, Some(RequestId::new_number(3)));
        }
        other => panic!("expected SSE-delivered response, got {other:?}"),
    }

    transport.close().await.unwrap();
}

#[tokio::test]
async fn undecodable_json_body_surfaces_as_invalid_event() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
        .mount(&server)
        .await;

    let mut transport = HttpTransport::connect(quick_config(&server), None).unwrap();
    let mut events = transport.take_events().unwrap();

    transport.send(encoded_request("ping", 1)).await.unwrap();
    assert!(matches!(
        events.recv().await,
        Some(TransportEvent::Invalid(_))
    ));

    transport.close().await.unwrap();
}
