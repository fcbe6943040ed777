use serde_json::Value;

// Prune meta fields according to include_rate and has_more.
// - When has_more is false/missing: drop has_more and next_page.
// - When include_rate is false: drop rate.
// - Drop meta entirely if it becomes empty.
fn prune_meta(structured: &mut Value, include_rate: bool) {
    let Some(obj) = structured.as_object_mut() else {
        return;
    };
    let Some(meta_val) = obj.get_mut("meta") else {
        return;
    };
    let Some(meta_obj) = meta_val.as_object_mut() else {
        return;
    };

    let has_more = meta_obj
        .get("has_more")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    if !has_more {
        meta_obj.remove("has_more");
        meta_obj.remove("next_page");
    }
    if !include_rate || meta_obj.get("rate").is_some_and(Value::is_null) {
        meta_obj.remove("rate");
    }

    if meta_obj.is_empty() {
        obj.remove("meta");
    }
}

// Build an MCP-compliant result envelope for tools/call outputs.
// - content: always a single text block so clients can render something.
// - structuredContent: the same payload as a JSON object.
// - isError: included only when true to keep payloads small.
pub fn mcp_wrap(
    mut structured: Value,
    text_opt: Option<String>,
    is_error: bool,
    include_rate: bool,
) -> Value {
    prune_meta(&mut structured, include_rate);
    let text = match text_opt {
        Some(s) => s,
        None => serde_json::to_string(&structured).unwrap_or_else(|_| "{}".to_string()),
    };
    let mut obj = serde_json::json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": structured,
    });
    if is_error {
        if let Some(map) = obj.as_object_mut() {
            map.insert("isError".to_string(), Value::Bool(true));
        }
    }
    obj
}
