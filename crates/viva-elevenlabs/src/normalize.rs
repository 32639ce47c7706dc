// SPDX-FileCopyrightText: 2026 Viva Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion of loose provider JSON into [`ConversationDetail`].
//!
//! Accepted shapes:
//! - `transcript` as a string, with optional turns under `messages`
//! - `transcript` as an array of turn objects (the live API shape)
//! - turn keys `role`/`sender`, `content`/`message`, `timestamp`/`created_at`
//! - `time_in_call_secs` offsets resolved against `metadata.start_time_unix_secs`
//! - duration from `duration_seconds` or `metadata.call_duration_secs`

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use viva_core::{ConversationDetail, ConversationTurn, TurnRole};

/// Normalizes a provider conversation body. `None` when the body is not a JSON object.
pub fn normalize(body: &Value) -> Option<ConversationDetail> {
    let obj = body.as_object()?;
    let metadata = obj.get("metadata").and_then(Value::as_object);
    let start_unix = metadata
        .and_then(|m| m.get("start_time_unix_secs"))
        .and_then(Value::as_i64);

    let raw_turns: &[Value] = match obj.get("transcript") {
        Some(Value::Array(items)) => items,
        _ => obj
            .get("messages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    };

    let mut lines = Vec::with_capacity(raw_turns.len());
    let mut turns = Vec::with_capacity(raw_turns.len());
    for item in raw_turns {
        let Some(turn) = item.as_object() else {
            continue;
        };
        let role = str_field(turn, &["role", "sender"]).unwrap_or("assistant");
        let content = str_field(turn, &["content", "message"]).unwrap_or_default();
        // Tool-call turns carry no text.
        if content.is_empty() {
            continue;
        }
        lines.push(format!("{role}: {content}"));
        turns.push(ConversationTurn {
            role: TurnRole::from_provider(role),
            content: content.to_string(),
            timestamp: turn_timestamp(turn, start_unix),
        });
    }

    let transcript = match obj.get("transcript") {
        Some(Value::String(text)) if !text.is_empty() => text.clone(),
        _ => lines.join("\n"),
    };

    let duration_seconds = obj
        .get("duration_seconds")
        .and_then(as_seconds)
        .or_else(|| metadata.and_then(|m| m.get("call_duration_secs")).and_then(as_seconds));

    let audio_url = str_field(obj, &["audio_url"]).map(str::to_string);

    Some(ConversationDetail {
        transcript,
        audio_url,
        duration_seconds,
        turns,
    })
}

fn str_field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| obj.get(*key).and_then(Value::as_str))
        .filter(|s| !s.is_empty())
}

fn as_seconds(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

fn turn_timestamp(turn: &Map<String, Value>, start_unix: Option<i64>) -> Option<String> {
    for key in ["timestamp", "created_at"] {
        match turn.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(Value::Number(n)) => {
                if let Some(secs) = n.as_i64() {
                    return unix_to_rfc3339(secs);
                }
            }
            _ => {}
        }
    }
    let offset = turn.get("time_in_call_secs").and_then(as_seconds)?;
    unix_to_rfc3339(start_unix?.checked_add(offset)?)
}

fn unix_to_rfc3339(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
}
