//! Shared types for the e2e test framework

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A mock response the backend will serve for the next model request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl MockResponse {
    /// A `text/event-stream` body served in one piece
    pub fn sse(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "text/event-stream".to_string(),
        }
    }

    /// Create an error response
    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }
}

/// Shared state for the mock backend server
#[derive(Debug, Default)]
pub struct BackendState {
    /// Queue of responses to serve - tests push responses, backend pops and serves them
    pub response_queue: VecDeque<MockResponse>,
    /// All requests received by the backend (for inspection)
    pub received_requests: Vec<ReceivedRequest>,
}

/// A request received by the mock backend
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct ReceivedRequest {
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: serde_json::Value,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// `(role, content)` pairs of the forwarded conversation
    pub fn messages(&self) -> Vec<(String, String)> {
        self.body
            .get("messages")
            .and_then(|m| m.as_array())
            .map(|messages| {
                messages
                    .iter()
                    .map(|m| {
                        (
                            m.get("role").and_then(|r| r.as_str()).unwrap_or("").to_string(),
                            m.get("content").and_then(|c| c.as_str()).unwrap_or("").to_string(),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub type SharedBackendState = Arc<Mutex<BackendState>>;

/// A parsed SSE event from the graph service
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    pub fn parse_json(&self) -> anyhow::Result<serde_json::Value> {
        serde_json::from_str(&self.data).map_err(|e| anyhow::anyhow!("SSE JSON parse error: {}: {}", e, self.data))
    }

    pub fn is_close(&self) -> bool {
        self.event.as_deref() == Some("close") && self.data == "[DONE]"
    }
}

/// Raw response of a streaming request
#[derive(Debug)]
pub struct StreamedBody {
    pub status: u16,
    pub content_type: String,
    pub data_stream_header: Option<String>,
    pub body: String,
}

/// `GET /stream_chat` response parsed into SSE events
#[derive(Debug)]
pub struct SseResponse {
    pub raw: StreamedBody,
    pub events: Vec<SseEvent>,
}

impl SseResponse {
    /// Check that the stream ends with the close marker
    pub fn has_close_marker(&self) -> bool {
        self.events.last().map(|e| e.is_close()).unwrap_or(false)
    }

    fn payloads(&self) -> Vec<serde_json::Value> {
        self.events
            .iter()
            .filter(|e| !e.is_close())
            .filter_map(|e| e.parse_json().ok())
            .collect()
    }

    /// Accumulate all token contents
    pub fn accumulated_content(&self) -> String {
        self.payloads()
            .iter()
            .filter(|p| p.get("type").and_then(|t| t.as_str()) == Some("token"))
            .filter_map(|p| p.get("content").and_then(|c| c.as_str()).map(str::to_string))
            .collect()
    }

    pub fn error_message(&self) -> Option<String> {
        self.payloads()
            .iter()
            .find(|p| p.get("type").and_then(|t| t.as_str()) == Some("error"))
            .and_then(|p| p.get("message").and_then(|m| m.as_str()).map(str::to_string))
    }
}

/// `POST /api/chat` response split into data stream lines
#[derive(Debug)]
pub struct DataStreamResponse {
    pub raw: StreamedBody,
    pub lines: Vec<String>,
}

impl DataStreamResponse {
    /// Concatenated `0:` text parts
    pub fn accumulated_content(&self) -> String {
        self.lines
            .iter()
            .filter_map(|l| l.strip_prefix("0:"))
            .filter_map(|json| serde_json::from_str::<String>(json).ok())
            .collect()
    }

    /// Parsed `e:` finish payload, if any
    pub fn finish(&self) -> Option<serde_json::Value> {
        self.lines
            .iter()
            .find_map(|l| l.strip_prefix("e:"))
            .and_then(|json| serde_json::from_str(json).ok())
    }

    pub fn error_message(&self) -> Option<String> {
        self.lines
            .iter()
            .find_map(|l| l.strip_prefix("data: "))
            .and_then(|json| serde_json::from_str::<serde_json::Value>(json).ok())
            .filter(|v| v.get("type").and_then(|t| t.as_str()) == Some("error"))
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
    }

    /// Error line followed by `event: close` / `data: [DONE]`
    pub fn ends_with_error_close(&self) -> bool {
        let n = self.lines.len();
        n >= 3
            && self.lines[n - 3].starts_with("data: {\"type\":\"error\"")
            && self.lines[n - 2] == "event: close"
            && self.lines[n - 1] == "data: [DONE]"
    }
}

/// Result of a single test case
#[derive(Debug)]
#[allow(dead_code)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
