//! HTTP client that talks to the relay the way the chat front ends do

use bytes::Bytes;
use futures::StreamExt;
use reqwest::Client;

use crate::types::{DataStreamResponse, SseEvent, SseResponse, StreamedBody};

/// Build an HTTP client (no connection pooling for test isolation)
pub fn build_client() -> Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .pool_max_idle_per_host(0)
        .build()
        .expect("Failed to build reqwest client")
}

/// `GET /stream_chat` and collect the SSE events
pub async fn send_stream_chat(
    client: &Client,
    proxy_addr: &str,
    question: &str,
    thread_id: Option<&str>,
) -> anyhow::Result<SseResponse> {
    let url = format!("http://{proxy_addr}/stream_chat");
    let mut query = vec![("question", question)];
    if let Some(thread_id) = thread_id {
        query.push(("thread_id", thread_id));
    }

    let request = client.get(&url).query(&query);
    let raw = collect_body(request).await?;
    let events = parse_sse(&raw.body);

    Ok(SseResponse { raw, events })
}

/// `POST /api/chat` and split the data stream into lines
pub async fn send_api_chat(
    client: &Client,
    proxy_addr: &str,
    request_body: serde_json::Value,
) -> anyhow::Result<DataStreamResponse> {
    let url = format!("http://{proxy_addr}/api/chat");

    let request = client
        .post(&url)
        .header("Content-Type", "application/json")
        .json(&request_body);
    let raw = collect_body(request).await?;
    let lines = raw.body.lines().map(str::to_string).collect();

    Ok(DataStreamResponse { raw, lines })
}

/// Send a request and read the whole (streamed) body
async fn collect_body(request: reqwest::RequestBuilder) -> anyhow::Result<StreamedBody> {
    let resp = request
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send request to proxy: {}", e))?;

    let status = resp.status().as_u16();
    let content_type = header_value(&resp, "content-type").unwrap_or_default();
    let data_stream_header = header_value(&resp, "x-vercel-ai-data-stream");

    let mut stream = resp.bytes_stream();
    let mut all_bytes: Vec<u8> = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk: Bytes = chunk.map_err(|e| anyhow::anyhow!("Stream read error: {}", e))?;
        all_bytes.extend_from_slice(&chunk);
    }

    Ok(StreamedBody {
        status,
        content_type,
        data_stream_header,
        body: String::from_utf8_lossy(&all_bytes).into_owned(),
    })
}

fn header_value(resp: &reqwest::Response, name: &str) -> Option<String> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Parse SSE body text into events
///
/// Events are separated by a blank line; each may carry an `event:` line.
fn parse_sse(text: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();

    for raw_event in text.split("\n\n") {
        let raw_event = raw_event.trim();
        if raw_event.is_empty() {
            continue;
        }

        let mut event_type: Option<String> = None;
        let mut data_line: Option<&str> = None;
        for line in raw_event.lines() {
            if let Some(stripped) = line.strip_prefix("event: ") {
                event_type = Some(stripped.to_string());
            } else if let Some(stripped) = line.strip_prefix("data: ") {
                data_line = Some(stripped);
            }
        }

        if let Some(data) = data_line {
            events.push(SseEvent {
                event: event_type,
                data: data.to_string(),
            });
        }
    }

    events
}

/// Send a GET request and return status and body
pub async fn send_get(client: &Client, proxy_addr: &str, path: &str) -> anyhow::Result<(u16, String)> {
    let url = format!("http://{proxy_addr}{path}");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to GET {}: {}", url, e))?;

    let status = resp.status().as_u16();
    let body_text = resp.text().await.unwrap_or_default();

    Ok((status, body_text))
}
