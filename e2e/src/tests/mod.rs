//! Test registry - all test cases are registered here

pub mod helpers;

use crate::runner::TestCase;

/// Build and return all test cases
///
/// Tests are grouped by service mode. Each test:
/// 1. Queues a mock provider stream (what Anthropic or OpenAI would send)
/// 2. Sends a request to the REAL relay
/// 3. Validates the wire output and what reached the provider
pub fn all_tests() -> Vec<TestCase> {
    macro_rules! test {
        ($name:expr, $desc:expr, $func:path) => {
            TestCase {
                name: $name,
                description: $desc,
                run: Box::new(|ctx| Box::pin($func(ctx))),
            }
        };
    }

    vec![
        // ── Graph service (SSE) ───────────────────────────────────────────────
        test!(
            "graph/health",
            "/health returns the graph service identity",
            graph::test_health
        ),
        test!(
            "graph/streams_tokens",
            "Anthropic deltas become token events followed by the close marker",
            graph::test_streams_tokens
        ),
        test!(
            "graph/upstream_request_shape",
            "Model request carries api key, version header and the question",
            graph::test_upstream_request_shape
        ),
        test!(
            "graph/thread_history",
            "Second turn on a thread sends user, assistant and new user messages",
            graph::test_thread_history
        ),
        test!(
            "graph/threads_isolated",
            "Different thread ids do not share history",
            graph::test_threads_are_isolated
        ),
        test!(
            "graph/upstream_error",
            "Provider 5xx becomes an error event and the close marker",
            graph::test_upstream_error
        ),
        test!(
            "graph/in_band_error",
            "Provider error event after tokens is relayed then closed",
            graph::test_in_band_error
        ),
        test!(
            "graph/default_thread",
            "thread_id may be omitted",
            graph::test_default_thread
        ),
        test!(
            "graph/missing_question",
            "Missing question is a 400 with a JSON error body",
            graph::test_missing_question
        ),

        // ── Direct service (data stream) ──────────────────────────────────────
        test!(
            "direct/health",
            "/health returns a bare healthy status",
            direct::test_health
        ),
        test!(
            "direct/data_stream",
            "OpenAI chunks become 0: text parts and an e: finish part",
            direct::test_data_stream
        ),
        test!(
            "direct/upstream_request_shape",
            "Whole conversation is forwarded with bearer auth and include_usage",
            direct::test_upstream_request_shape
        ),
        test!(
            "direct/finish_reason_length",
            "finish_reason=length maps to finishReason=length",
            direct::test_finish_reason_length
        ),
        test!(
            "direct/upstream_error",
            "Provider 5xx becomes the error line and the close marker",
            direct::test_upstream_error
        ),
        test!(
            "direct/truncated_stream",
            "Stream without [DONE] is terminated with an error",
            direct::test_truncated_stream
        ),
        test!(
            "direct/empty_messages",
            "Empty messages list is rejected with 400",
            direct::test_empty_messages
        ),
        test!(
            "direct/invalid_role",
            "Unknown message role is rejected with a 4xx",
            direct::test_invalid_role
        ),

        // ── Bridge service (graph service relayed as data stream) ─────────────
        test!(
            "bridge/health",
            "/health returns a bare healthy status",
            bridge::test_health
        ),
        test!(
            "bridge/relay",
            "Graph tokens are relayed as data stream parts; only the last message travels",
            bridge::test_relay
        ),
        test!(
            "bridge/relayed_error",
            "Graph service error events surface as the data stream error tail",
            bridge::test_relayed_error
        ),
    ]
}
