//! Outbound payload encoding.

use serde::{Deserialize, Serialize};

use crate::task::Payload;

/// Wire format for outbound payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Wrap as `{"value": ...}`.
    #[default]
    Json,
    /// Send the payload text unchanged. Any unrecognised format name lands here.
    #[serde(other)]
    Raw,
}

/// Encode a task payload for the wire.
///
/// In JSON format, numeric-looking payloads are embedded verbatim and
/// everything else as a JSON string.
pub fn encode(format: PayloadFormat, payload: &Payload) -> String {
    let text = payload.to_string();
    match format {
        PayloadFormat::Raw => text,
        PayloadFormat::Json if payload.is_number() || looks_numeric(&text) => {
            format!("{{\"value\": {text}}}")
        }
        PayloadFormat::Json => {
            format!("{{\"value\": {}}}", serde_json::Value::String(text))
        }
    }
}

/// True if `s` parses as a floating-point literal (surrounding whitespace
/// allowed) or is a single Unicode numeric character such as `½` or `٣`.
///
/// Digit-group underscores (`1_000`) and multi-digit non-ASCII numbers
/// (`٣٣`) count as text: embedded unquoted they would not be valid JSON.
pub fn looks_numeric(s: &str) -> bool {
    if s.trim().parse::<f64>().is_ok() {
        return true;
    }
    let mut chars = s.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_numeric())
}
