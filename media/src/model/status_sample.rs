use serde_json::Value;

/// One status poll reply, converted to seconds
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSample {
    /// Remote state string, `None` when absent or empty
    pub state: Option<String>,
    pub position_secs: u64,
    pub duration_secs: u64,
}

impl StatusSample {
    /// Parses a `status` reply, tolerating missing or malformed fields
    pub fn from_payload(payload: &Value) -> Self {
        let state = payload
            .get("state")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Self {
            state,
            position_secs: millis_to_secs(payload.get("currentTime")),
            duration_secs: millis_to_secs(payload.get("duration")),
        }
    }
}

/// Truncates toward zero, so 1999 ms is 1 s. Negative and non-numeric values become 0.
fn millis_to_secs(value: Option<&Value>) -> u64 {
    let millis = value.and_then(Value::as_f64).unwrap_or(0.0);
    // float-to-int `as` saturates and maps NaN to 0
    (millis / 1000.0) as u64
}
