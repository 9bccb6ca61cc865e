#![allow(dead_code)]

use responses_dsl::{Client, ClientOptions};
use serde_json::{json, Value};

pub fn client(base_url: &str, api_key: Option<&str>) -> Client {
    Client::new(ClientOptions {
        base_url: base_url.to_string(),
        api_key: api_key.map(str::to_string),
        http_client: None,
    })
    .unwrap()
}

pub fn response_json(id: &str, text: &str) -> Value {
    json!({
        "id": id,
        "object": "response",
        "created_at": 1_741_476_777,
        "status": "completed",
        "model": "gpt-4o-2024-08-06",
        "output": [{
            "type": "message",
            "id": "msg_1",
            "status": "completed",
            "role": "assistant",
            "content": [{ "type": "output_text", "text": text, "annotations": [] }]
        }],
        "usage": {
            "input_tokens": 12,
            "input_tokens_details": { "cached_tokens": 0 },
            "output_tokens": 4,
            "output_tokens_details": { "reasoning_tokens": 0 },
            "total_tokens": 16
        }
    })
}

/// One SSE block with an `event:` line.
pub fn sse_block(event_type: &str, data: &Value) -> String {
    format!("event: {event_type}\ndata: {data}\n\n")
}

/// A well-formed stream: created, output item added, one delta per entry
/// of `deltas`, text done, completed.
pub fn text_stream(deltas: &[&str]) -> String {
    let text: String = deltas.concat();
    let mut in_progress = response_json("resp_1", "");
    in_progress["status"] = json!("in_progress");
    in_progress["output"] = json!([]);

    let mut body = sse_block(
        "response.created",
        &json!({ "type": "response.created", "sequence_number": 0, "response": in_progress }),
    );
    body.push_str(&sse_block(
        "response.output_item.added",
        &json!({
            "type": "response.output_item.added",
            "sequence_number": 1,
            "output_index": 0,
            "item": {
                "type": "message",
                "id": "msg_1",
                "status": "in_progress",
                "role": "assistant",
                "content": []
            }
        }),
    ));
    for (i, delta) in deltas.iter().enumerate() {
        body.push_str(&sse_block(
            "response.output_text.delta",
            &json!({
                "type": "response.output_text.delta",
                "sequence_number": i + 2,
                "item_id": "msg_1",
                "output_index": 0,
                "content_index": 0,
                "delta": delta
            }),
        ));
    }
    body.push_str(&sse_block(
        "response.output_text.done",
        &json!({
            "type": "response.output_text.done",
            "sequence_number": deltas.len() + 2,
            "item_id": "msg_1",
            "output_index": 0,
            "content_index": 0,
            "text": text
        }),
    ));
    body.push_str(&sse_block(
        "response.completed",
        &json!({
            "type": "response.completed",
            "sequence_number": deltas.len() + 3,
            "response": response_json("resp_1", &text)
        }),
    ));
    body
}
