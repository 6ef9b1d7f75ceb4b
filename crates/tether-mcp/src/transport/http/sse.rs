//! SSE Stream Parsing
//!
//! Incremental parser for the WHATWG `text/event-stream` format, plus the
//! endpoint-URL resolution used by the legacy 2024-11-05 flow.
//!
//! The parser keeps an append-then-scan byte buffer: network chunks are
//! appended as they arrive and complete lines are scanned out, so event
//! delimiters (and multi-byte UTF-8 sequences) may span read boundaries
//! freely. One `feed` never assumes one event per read.

// Layer 1: Standard library imports
use std::mem;

// Layer 2: Third-party crate imports
use url::Url;

// Layer 3: Internal module imports
use crate::transport::error::{TransportError, TransportResult};

/// One parsed SSE event
///
/// `data` is the concatenation of all `data:` lines in the block, joined
/// with `\n`. `id` is present only when the block carried an `id:` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type from the `event:` field (`None` means the default type)
    pub event: Option<String>,
    /// Event payload
    pub data: String,
    /// Event id for resumption bookkeeping
    pub id: Option<String>,
    /// Server-suggested reconnect delay in milliseconds
    pub retry: Option<u64>,
}

impl SseEvent {
    /// Whether this is the legacy `endpoint` event
    pub fn is_endpoint(&self) -> bool {
        self.event.as_deref() == Some("endpoint")
    }
}

/// Incremental SSE parser with a persistent line buffer
///
/// # Examples
///
/// ```rust
/// use tether_mcp::transport::sse::SseParser;
///
/// let mut parser = SseParser::new();
/// // An event split across two reads:
/// assert!(parser.feed(b"data: {\"jsonrpc\"").is_empty());
/// let events = parser.feed(b":\"2.0\"}\n\n");
/// assert_eq!(events.len(), 1);
/// assert_eq!(events[0].data, "{\"jsonrpc\":\"2.0\"}");
/// ```
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event_type: Option<String>,
    data: String,
    id: Option<String>,
    retry: Option<u64>,
}

impl SseParser {
    /// Create an empty parser
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a network chunk and return any events it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        // Scan out complete lines; the remainder stays buffered.
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            let line = line.trim_end_matches(['\n', '\r']);

            if let Some(event) = self.process_line(line) {
                events.push(event);
            }
        }

        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            // Comment line
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event_type = Some(value.to_string()),
            "data" => {
                if !self.data.is_empty() {
                    self.data.push('\n');
                }
                self.data.push_str(value);
            }
            "id" => {
                // Ids containing NUL are ignored per the SSE specification.
                if !value.contains('\0') {
                    self.id = Some(value.to_string());
                }
            }
            "retry" => {
                if let Ok(retry) = value.parse::<u64>() {
                    self.retry = Some(retry);
                }
            }
            _ => {} // Unknown fields are ignored
        }

        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event_type = self.event_type.take();
        let id = self.id.take();
        let retry = self.retry.take();

        if self.data.is_empty() {
            // Blank line with no data: reset state, dispatch nothing.
            return None;
        }

        Some(SseEvent {
            event: event_type,
            data: mem::take(&mut self.data),
            id,
            retry,
        })
    }
}

/// Resolve a legacy `endpoint` event URI against the base URL
///
/// Handles absolute, protocol-relative, host-relative, and path-relative
/// forms, per RFC 3986 reference resolution.
///
/// # Examples
///
/// ```rust
/// use url::Url;
/// use tether_mcp::transport::sse::resolve_endpoint;
///
/// let base = Url::parse("https://srv/api/").unwrap();
/// let resolved = resolve_endpoint(&base, "/mcp/post").unwrap();
/// assert_eq!(resolved.as_str(), "https://srv/mcp/post");
/// ```
pub fn resolve_endpoint(base: &Url, uri: &str) -> TransportResult<Url> {
    base.join(uri)
        .map_err(|e| TransportError::format(format!("unresolvable endpoint URI '{uri}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_simple_event() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: message\ndata: hello\nid: 7\n\n");

        assert_eq!(
            events,
            vec![SseEvent {
                event: Some("message".to_string()),
                data: "hello".to_string(),
                id: Some("7".to_string()),
                retry: None,
            }]
        );
    }

    #[test]
    fn event_split_across_reads() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"data: par").is_empty());
        assert!(parser.feed(b"tial\nid: 4").is_empty());
        let events = parser.feed(b"2\n\n");

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "partial");
        assert_eq!(events[0].id.as_deref(), Some("42"));
    }

    #[test]
    fn multi_line_data_joined_with_newline() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: first\ndata: second\n\n");
        assert_eq!(events[0].data, "first\nsecond");
    }

    #[test]
    fn comments_and_unknown_fields_are_skipped() {
        let mut parser = SseParser::new();
        let events = parser.feed(b": keep-alive\nwhatever: x\ndata: real\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "real");
    }

    #[test]
    fn data_without_space_after_colon() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data:compact\n\n");
        assert_eq!(events[0].data, "compact");
    }

    #[test]
    fn blank_line_without_data_dispatches_nothing() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: noop\n\ndata: next\n\n");
        assert_eq!(events.len(), 1);
        // The dangling event type was reset by the empty dispatch.
        assert_eq!(events[0].event, None);
        assert_eq!(events[0].data, "next");
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: windows\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "windows");
    }

    #[test]
    fn retry_field_is_parsed_and_bad_values_ignored() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"retry: 2500\ndata: a\n\nretry: soon\ndata: b\n\n");
        assert_eq!(events[0].retry, Some(2500));
        assert_eq!(events[1].retry, None);
    }

    #[test]
    fn multibyte_utf8_split_across_chunks() {
        let mut parser = SseParser::new();
        let payload = "data: caf\u{e9}\n\n".as_bytes();
        // Split inside the two-byte sequence for é.
        let mid = payload.len() - 3;
        assert!(parser.feed(&payload[..mid]).is_empty());
        let events = parser.feed(&payload[mid..]);
        assert_eq!(events[0].data, "caf\u{e9}");
    }

    #[test]
    fn several_events_in_one_chunk() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"data: one\nid: 1\n\ndata: two\nid: 2\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].id.as_deref(), Some("2"));
    }

    #[test]
    fn endpoint_event_detection() {
        let mut parser = SseParser::new();
        let events = parser.feed(b"event: endpoint\ndata: {\"uri\": \"/mcp/post\"}\n\n");
        assert!(events[0].is_endpoint());
    }

    #[test]
    fn endpoint_resolution_forms() {
        let base = Url::parse("https://srv/api/").unwrap();

        // Absolute
        assert_eq!(
            resolve_endpoint(&base, "https://other/x").unwrap().as_str(),
            "https://other/x"
        );
        // Protocol-relative
        assert_eq!(
            resolve_endpoint(&base, "//cdn.srv/x").unwrap().as_str(),
            "https://cdn.srv/x"
        );
        // Host-relative
        assert_eq!(
            resolve_endpoint(&base, "/mcp/post").unwrap().as_str(),
            "https://srv/mcp/post"
        );
        // Path-relative
        assert_eq!(
            resolve_endpoint(&base, "post").unwrap().as_str(),
            "https://srv/api/post"
        );
    }
}
