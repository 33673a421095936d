//! Audit recorder module
//!
//! Opens a record when a request enters dispatch and closes it at completion
//! with the wall-clock duration and a bounded copy of the response payload.
//! Records are retained in-process for the lifetime of the server; the
//! serialized trail goes to the `audit` log bucket.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use crate::logger;

/// Compact timestamp carried inside audit records
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f%z";

/// Serialized return payloads longer than this are cut off
const RETURN_VALUES_LIMIT: usize = 500;

/// One request's audit trail entry
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    #[serde(rename = "requestKey")]
    pub request_key: String,
    pub function: String,
    pub values: Value,
    pub begin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(rename = "durationMs", skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(rename = "returnValues", skip_serializing_if = "Option::is_none")]
    pub return_values: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<AuditExtra>,
}

/// Response metadata attached when the record is closed
#[derive(Debug, Clone, Serialize)]
pub struct AuditExtra {
    pub status: u16,
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, String>>,
}

/// In-process audit record store
///
/// One insert at dispatch start and one mutation at dispatch finish per
/// request; distinct requests get distinct keys, so there is no cross-request
/// contention on the map beyond the lock itself.
#[derive(Debug, Default)]
pub struct AuditRecorder {
    records: Mutex<HashMap<String, AuditRecord>>,
}

impl AuditRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a record and return its request key
    ///
    /// The key is a hex SHA-256 fingerprint of `{function, values, begin}`.
    /// The begin timestamp is part of the hashed content, so the key is not
    /// purely content-addressed: identical payloads in the same millisecond
    /// collide.
    pub fn start(&self, function_name: &str, values: &Value) -> String {
        let begin = Local::now().format(TIMESTAMP_FORMAT).to_string();

        let fingerprint = json!({
            "function": function_name,
            "values": values,
            "begin": begin,
        });
        let request_key = hex::encode(Sha256::digest(fingerprint.to_string()));

        let record = AuditRecord {
            request_key: request_key.clone(),
            function: function_name.to_string(),
            values: values.clone(),
            begin,
            end: None,
            duration: None,
            return_values: None,
            extra: None,
        };

        match serde_json::to_string(&record) {
            Ok(serialized) => logger::log_to_bucket("audit", "REQUEST_BEGIN", &serialized),
            Err(e) => logger::log_warning(&format!("Failed to serialize audit record: {e}")),
        }

        if let Ok(mut records) = self.records.lock() {
            records.insert(request_key.clone(), record);
        }

        request_key
    }

    /// Close a record with the response payload and metadata
    ///
    /// Computes the duration from the recorded begin timestamp and stores the
    /// serialized return payload, truncated to 500 characters plus `...` when
    /// longer. The record is immutable afterwards.
    pub fn finish(&self, request_key: &str, return_values: &Value, extra: AuditExtra) {
        let Ok(mut records) = self.records.lock() else {
            return;
        };
        let Some(record) = records.get_mut(request_key) else {
            logger::log_warning(&format!("Audit finish for unknown request key {request_key}"));
            return;
        };

        let end = Local::now();
        record.end = Some(end.format(TIMESTAMP_FORMAT).to_string());

        match DateTime::parse_from_str(&record.begin, TIMESTAMP_FORMAT) {
            Ok(begin) => {
                record.duration = Some(duration_components(
                    &begin,
                    &end.with_timezone(end.offset()),
                ));
            }
            Err(e) => {
                logger::log_warning(&format!("Unparseable audit begin timestamp: {e}"));
            }
        }

        record.return_values = Some(bounded_return_values(return_values));
        record.extra = Some(extra);

        let mut envelope = serde_json::Map::new();
        envelope.insert(
            request_key.to_string(),
            serde_json::to_value(&*record).unwrap_or(Value::Null),
        );
        logger::log_to_bucket("audit", "REQUEST-END", &Value::Object(envelope).to_string());
    }

    /// Clone a stored record, if present
    pub fn record(&self, request_key: &str) -> Option<AuditRecord> {
        self.records
            .lock()
            .ok()
            .and_then(|records| records.get(request_key).cloned())
    }
}

/// Render an elapsed interval as `{m}m{s}s{ms}ms` components
fn duration_components(begin: &DateTime<FixedOffset>, end: &DateTime<FixedOffset>) -> String {
    let elapsed_ms = end.signed_duration_since(*begin).num_milliseconds().max(0);
    let minutes = elapsed_ms / 60_000;
    let seconds = elapsed_ms / 1_000 - minutes * 60;
    let millis = elapsed_ms % 1_000;
    format!("{minutes}m{seconds}s{millis}ms")
}

/// Serialize the return payload, cutting it off past the audit limit
fn bounded_return_values(return_values: &Value) -> Value {
    let serialized = match return_values {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if serialized.chars().count() > RETURN_VALUES_LIMIT {
        let truncated: String = serialized.chars().take(RETURN_VALUES_LIMIT).collect();
        Value::String(truncated + "...")
    } else {
        return_values.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn stamp(ms: i64) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .timestamp_millis_opt(ms)
            .unwrap()
    }

    #[test]
    fn test_start_returns_hex_fingerprint() {
        let recorder = AuditRecorder::new();
        let key = recorder.start("test", &json!({"a": 1}));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));

        let record = recorder.record(&key).unwrap();
        assert_eq!(record.function, "test");
        assert!(record.end.is_none());
    }

    #[test]
    fn test_finish_closes_record() {
        let recorder = AuditRecorder::new();
        let key = recorder.start("test", &json!({}));
        recorder.finish(
            &key,
            &json!({"status": "OK"}),
            AuditExtra {
                status: 200,
                content_type: "application/json".to_string(),
                headers: None,
            },
        );

        let record = recorder.record(&key).unwrap();
        assert!(record.end.is_some());
        assert!(record.duration.is_some());
        assert_eq!(record.return_values, Some(json!({"status": "OK"})));
        assert_eq!(record.extra.as_ref().unwrap().status, 200);
    }

    #[test]
    fn test_finish_unknown_key_is_harmless() {
        let recorder = AuditRecorder::new();
        recorder.finish(
            "no-such-key",
            &json!({}),
            AuditExtra {
                status: 200,
                content_type: "application/json".to_string(),
                headers: None,
            },
        );
        assert!(recorder.record("no-such-key").is_none());
    }

    #[test]
    fn test_return_values_truncated_to_limit() {
        let recorder = AuditRecorder::new();
        let key = recorder.start("test", &json!({}));

        // This object serializes to exactly 600 characters
        let payload = json!({"data": "x".repeat(589)});
        assert_eq!(payload.to_string().chars().count(), 600);

        recorder.finish(
            &key,
            &payload,
            AuditExtra {
                status: 200,
                content_type: "application/json".to_string(),
                headers: None,
            },
        );

        let record = recorder.record(&key).unwrap();
        let stored = record.return_values.unwrap();
        let stored = stored.as_str().unwrap();
        assert_eq!(stored.chars().count(), 503);
        assert!(stored.ends_with("..."));
    }

    #[test]
    fn test_short_return_values_kept_as_json() {
        let recorder = AuditRecorder::new();
        let key = recorder.start("test", &json!({}));
        recorder.finish(
            &key,
            &json!({"short": true}),
            AuditExtra {
                status: 200,
                content_type: "application/json".to_string(),
                headers: None,
            },
        );

        let record = recorder.record(&key).unwrap();
        assert_eq!(record.return_values, Some(json!({"short": true})));
    }

    #[test]
    fn test_duration_components() {
        assert_eq!(duration_components(&stamp(0), &stamp(1_500)), "0m1s500ms");
        assert_eq!(duration_components(&stamp(0), &stamp(61_500)), "1m1s500ms");
        assert_eq!(duration_components(&stamp(0), &stamp(0)), "0m0s0ms");
        // Clock skew never yields negative components
        assert_eq!(duration_components(&stamp(1_000), &stamp(0)), "0m0s0ms");
    }
}
