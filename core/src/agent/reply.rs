//! Classification of raw model replies into CALL / FINAL / malformed.
//!
//! A reply matches only when the whole trimmed text is a single marker:
//!
//! ```text
//! ### CALL {"server_id": "fs", "name": "read_file", "arguments": {...}} ###
//! ### FINAL {"text": "..."} ###
//! ```

use serde_json::{Map, Value};

const MARKER_FENCE: &str = "###";
const CALL_KEYWORD: &str = "CALL";
const FINAL_KEYWORD: &str = "FINAL";

#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub server_id: String,
    pub name: String,
    pub arguments: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Final(String),
    Call(CallRequest),
    /// A CALL marker whose payload is unusable; carries the reason.
    InvalidCall(String),
    Malformed,
}

#[derive(Clone, Copy)]
enum Marker {
    Call,
    Final,
}

/// Split a reply into its marker and raw payload, if the whole reply is one marker.
fn match_marker(text: &str) -> Option<(Marker, &str)> {
    let inner = text.strip_prefix(MARKER_FENCE)?.strip_suffix(MARKER_FENCE)?;
    let inner = inner.trim_start();

    let (marker, rest) = if let Some(rest) = inner.strip_prefix(CALL_KEYWORD) {
        (Marker::Call, rest)
    } else if let Some(rest) = inner.strip_prefix(FINAL_KEYWORD) {
        (Marker::Final, rest)
    } else {
        return None;
    };

    let payload = rest.trim();
    if !(payload.starts_with('{') && payload.ends_with('}')) {
        return None;
    }
    Some((marker, payload))
}

/// True when `text` contains another `### CALL` / `### FINAL` opener.
fn contains_marker(text: &str) -> bool {
    text.match_indices(MARKER_FENCE).any(|(idx, _)| {
        let after = text[idx + MARKER_FENCE.len()..].trim_start();
        after.starts_with(CALL_KEYWORD) || after.starts_with(FINAL_KEYWORD)
    })
}

pub fn parse_reply(reply: &str) -> Reply {
    let trimmed = reply.trim();

    let Some((marker, payload)) = match_marker(trimmed) else {
        return Reply::Malformed;
    };

    let parsed = serde_json::from_str::<Value>(payload);
    if parsed.is_err() && contains_marker(payload) {
        return Reply::Malformed;
    }

    match marker {
        Marker::Final => {
            let text = parsed
                .ok()
                .and_then(|v| v.get("text").and_then(|t| t.as_str()).map(str::to_string))
                .unwrap_or_else(|| reply.to_string());
            Reply::Final(text)
        }
        Marker::Call => match parsed {
            Ok(value) => parse_call(value),
            Err(e) => Reply::InvalidCall(format!("invalid JSON: {}", e)),
        },
    }
}

fn parse_call(value: Value) -> Reply {
    let Value::Object(mut object) = value else {
        return Reply::InvalidCall("payload must be a JSON object".to_string());
    };

    let Some(server_id) = take_string(&mut object, "server_id") else {
        return Reply::InvalidCall("missing 'server_id'".to_string());
    };
    let Some(name) = take_string(&mut object, "name") else {
        return Reply::InvalidCall("missing 'name'".to_string());
    };

    let arguments = match object.remove("arguments") {
        None | Some(Value::Null) => Value::Object(Map::new()),
        Some(args @ Value::Object(_)) => args,
        Some(_) => return Reply::InvalidCall("'arguments' must be a JSON object".to_string()),
    };

    Reply::Call(CallRequest {
        server_id,
        name,
        arguments,
    })
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    }
}
