use serde_json::Value;
use tracing::debug;

use crate::constants::{
    DEFAULT_ACTION, DEFAULT_PAGE, DEFAULT_SESSION_ID, DEFAULT_TIMESTAMP, FIELD_ACTION, FIELD_PAGE,
    FIELD_SESSION_ID, FIELD_TIMESTAMP, UNKNOWN_HOUR,
};
use crate::metrics::{CounterSink, JobCounter};
use crate::types::LogEntry;

/// Turns one raw input line into zero or more log entries.
///
/// Parsing never fails the caller: a bad line is skipped and observed
/// through the counters.
pub trait Parser {
    fn parse(&self, line: &str, counters: &dyn CounterSink) -> Vec<LogEntry>;
}

/// Parser for lines holding a JSON object or a JSON array of objects
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLineParser;

impl JsonLineParser {
    pub fn new() -> Self {
        Self
    }
}

impl Parser for JsonLineParser {
    fn parse(&self, line: &str, counters: &dyn CounterSink) -> Vec<LogEntry> {
        let line = line.trim();
        if line.is_empty() {
            return Vec::new();
        }

        let root: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                debug!("JsonLineParser: skipping unparseable line len={} err={}", line.len(), e);
                counters.increment(JobCounter::ParseErrors, 1);
                return Vec::new();
            }
        };

        match root {
            Value::Array(items) => items
                .iter()
                .filter(|item| item.is_object())
                .map(entry_from_record)
                .collect(),
            Value::Object(_) => vec![entry_from_record(&root)],
            other => {
                debug!("JsonLineParser: ignoring non-record JSON value kind={}", value_kind(&other));
                Vec::new()
            }
        }
    }
}

/// Build a `LogEntry` from one JSON object, applying field defaults
pub fn entry_from_record(record: &Value) -> LogEntry {
    let timestamp = get_or(record, FIELD_TIMESTAMP, DEFAULT_TIMESTAMP);
    let hour = derive_hour(&timestamp);
    LogEntry {
        action: get_or(record, FIELD_ACTION, DEFAULT_ACTION),
        page: get_or(record, FIELD_PAGE, DEFAULT_PAGE),
        session_id: get_or(record, FIELD_SESSION_ID, DEFAULT_SESSION_ID),
        timestamp,
        hour,
    }
}

/// Textual value of `field`, or `default` when it is missing or null.
///
/// Strings are taken verbatim, numbers and booleans as their JSON text, and
/// arrays/objects have no textual value so they read as an empty string.
pub fn get_or(record: &Value, field: &str, default: &str) -> String {
    match record.get(field) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        Some(Value::Array(_) | Value::Object(_)) => String::new(),
    }
}

/// Two-character hour bucket taken from after the first `T` of a timestamp.
///
/// Anything that cannot be split that way yields `"unknown"`.
pub fn derive_hour(timestamp: &str) -> String {
    let Some((_, time_part)) = timestamp.split_once('T') else {
        return UNKNOWN_HOUR.to_string();
    };
    let hour: String = time_part.chars().take(2).collect();
    if hour.chars().count() < 2 {
        return UNKNOWN_HOUR.to_string();
    }
    hour
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
