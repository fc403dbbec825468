//! MQTT topic builders and parsers for the gateway topic hierarchy.
//!
//! Topic structure:
//! ```text
//! {prefix}/{topic}                              outbound (topic supplied by the task)
//! {prefix}/{family}/{device_id}/W/{param}       inbound commands
//! ```

/// Direction marker used in the inbound subscription filter.
pub const WRITE_MARKER: &str = "W";

// ─── Outbound ───

pub fn outbound(prefix: &str, topic: &str) -> String {
    format!("{prefix}/{topic}")
}

// ─── Subscription patterns (with MQTT wildcards) ───

/// Filter for every inbound command under the prefix.
pub fn command_filter(prefix: &str) -> String {
    format!("{prefix}/+/+/{WRITE_MARKER}/+")
}

// ─── Topic parsing ───

/// Positional components of an inbound command topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic {
    pub family: String,
    pub device_id: String,
    pub param: String,
}

/// Parse an inbound command topic.
///
/// Strips the leading `{prefix}/` (the whole topic is used if the prefix is
/// absent), splits on `/` and reads segments 0, 1 and 3. Segment 2 is not
/// inspected. Returns `None` when fewer than four segments remain.
pub fn parse_command_topic(prefix: &str, topic: &str) -> Option<ParsedTopic> {
    let rest = topic
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('/'))
        .unwrap_or(topic);

    let parts: Vec<&str> = rest.split('/').collect();
    if parts.len() < 4 {
        return None;
    }

    Some(ParsedTopic {
        family: parts[0].to_string(),
        device_id: parts[1].to_string(),
        param: parts[3].to_string(),
    })
}
