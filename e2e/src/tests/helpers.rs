//! Common test helpers and stream builders

use serde_json::{json, Value};

// ─── Request builders ────────────────────────────────────────────────────────

/// Build an `/api/chat` body from `(role, content)` pairs
pub fn chat_request(messages: &[(&str, &str)]) -> Value {
    let messages: Vec<Value> = messages
        .iter()
        .map(|(role, content)| json!({"role": role, "content": content}))
        .collect();
    json!({ "messages": messages })
}

/// Thread id that no earlier run has used
pub fn unique_thread(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{}-{}", prefix, nanos)
}

// ─── Upstream stream builders ────────────────────────────────────────────────

/// Anthropic Messages stream producing `tokens` and stopping with `stop_reason`
pub fn anthropic_sse(tokens: &[&str], stop_reason: &str) -> String {
    let mut out = String::new();
    push_event(
        &mut out,
        "message_start",
        json!({"type": "message_start", "message": {"id": "msg_e2e", "model": "claude-test", "usage": {"input_tokens": 12, "output_tokens": 1}}}),
    );
    push_event(
        &mut out,
        "content_block_start",
        json!({"type": "content_block_start", "index": 0, "content_block": {"type": "text", "text": ""}}),
    );
    push_event(&mut out, "ping", json!({"type": "ping"}));
    for token in tokens {
        push_event(
            &mut out,
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": token}}),
        );
    }
    push_event(
        &mut out,
        "content_block_stop",
        json!({"type": "content_block_stop", "index": 0}),
    );
    push_event(
        &mut out,
        "message_delta",
        json!({"type": "message_delta", "delta": {"stop_reason": stop_reason}, "usage": {"output_tokens": tokens.len()}}),
    );
    push_event(&mut out, "message_stop", json!({"type": "message_stop"}));
    out
}

/// Anthropic stream that reports an in-band error after `tokens`
pub fn anthropic_error_sse(tokens: &[&str], message: &str) -> String {
    let mut out = String::new();
    push_event(
        &mut out,
        "message_start",
        json!({"type": "message_start", "message": {"id": "msg_e2e", "model": "claude-test", "usage": {"input_tokens": 3}}}),
    );
    for token in tokens {
        push_event(
            &mut out,
            "content_block_delta",
            json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": token}}),
        );
    }
    push_event(
        &mut out,
        "error",
        json!({"type": "error", "error": {"type": "overloaded_error", "message": message}}),
    );
    out
}

/// OpenAI chat completion stream with usage and `[DONE]`
pub fn openai_sse(tokens: &[&str], finish_reason: &str) -> String {
    let mut out = openai_sse_body(tokens);
    push_data(
        &mut out,
        &json!({"id": "chatcmpl-e2e", "model": "gpt-test", "choices": [{"index": 0, "delta": {}, "finish_reason": finish_reason}]}).to_string(),
    );
    push_data(
        &mut out,
        &json!({"id": "chatcmpl-e2e", "model": "gpt-test", "choices": [], "usage": {"prompt_tokens": 9, "completion_tokens": tokens.len(), "total_tokens": 9 + tokens.len()}}).to_string(),
    );
    push_data(&mut out, "[DONE]");
    out
}

/// OpenAI stream cut off after the tokens (no finish, no `[DONE]`)
pub fn openai_sse_truncated(tokens: &[&str]) -> String {
    openai_sse_body(tokens)
}

fn openai_sse_body(tokens: &[&str]) -> String {
    let mut out = String::new();
    push_data(
        &mut out,
        &json!({"id": "chatcmpl-e2e", "model": "gpt-test", "choices": [{"index": 0, "delta": {"role": "assistant", "content": ""}, "finish_reason": null}]}).to_string(),
    );
    for token in tokens {
        push_data(
            &mut out,
            &json!({"id": "chatcmpl-e2e", "model": "gpt-test", "choices": [{"index": 0, "delta": {"content": token}, "finish_reason": null}]}).to_string(),
        );
    }
    out
}

/// Provider error body as both APIs return it
pub fn provider_error_body(message: &str) -> String {
    json!({"error": {"type": "server_error", "message": message}}).to_string()
}

fn push_event(out: &mut String, event: &str, data: Value) {
    out.push_str(&format!("event: {}\ndata: {}\n\n", event, data));
}

fn push_data(out: &mut String, data: &str) {
    out.push_str(&format!("data: {}\n\n", data));
}

// ─── Assertion helpers ────────────────────────────────────────────────────────

/// Assert two strings are equal, with context on failure
pub fn assert_eq_str(actual: &str, expected: &str, label: &str) -> anyhow::Result<()> {
    if actual != expected {
        Err(anyhow::anyhow!("{label}: expected {:?} but got {:?}", expected, actual))
    } else {
        Ok(())
    }
}

/// Assert condition is true, with message
pub fn assert_true(cond: bool, msg: &str) -> anyhow::Result<()> {
    if !cond {
        Err(anyhow::anyhow!("{}", msg))
    } else {
        Ok(())
    }
}
