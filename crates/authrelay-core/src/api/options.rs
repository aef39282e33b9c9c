//! Per-request options and the merge rules used to layer caller options
//! over the client's defaults.

use std::time::Duration;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Header name/value pairs. Names compare case-insensitively on merge.
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub json: Option<Value>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name.into(), value.into());
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Layer `overrides` on top of `self`.
    ///
    /// Headers: override wins per name. Query: appended. JSON: deep merged.
    /// Timeout: override wins when set.
    pub fn merge(mut self, overrides: RequestOptions) -> Self {
        for (name, value) in overrides.headers {
            set_header(&mut self.headers, name, value);
        }
        self.query.extend(overrides.query);
        self.json = match (self.json.take(), overrides.json) {
            (Some(base), Some(over)) => Some(merge_json(base, over)),
            (base, over) => over.or(base),
        };
        self.timeout = overrides.timeout.or(self.timeout);
        self
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(&name)) {
        Some(existing) => *existing = (name, value),
        None => headers.push((name, value)),
    }
}

/// Recursive merge: objects merge per key, arrays concatenate, anything
/// else takes the override.
pub fn merge_json(base: Value, over: Value) -> Value {
    match (base, over) {
        (Value::Object(mut base), Value::Object(over)) => {
            for (key, value) in over {
                let merged = match base.remove(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (Value::Array(mut base), Value::Array(over)) => {
            base.extend(over);
            Value::Array(base)
        }
        (_, over) => over,
    }
}
