//! Response envelope and status vocabulary.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Outcome of a request as seen by protocol clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Error,
    NotFound,
    InvalidRequest,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Success => "SUCCESS",
            Status::Error => "ERROR",
            Status::NotFound => "NOT_FOUND",
            Status::InvalidRequest => "INVALID_REQUEST",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fixed-shape response wrapper. Exactly one is written per request.
///
/// The server builds `Envelope<Payload>`; clients decode `Envelope<Value>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T = Value> {
    pub status: Status,
    pub data: Option<T>,
    /// Empty on success.
    pub message: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
}

impl<T> Envelope<T> {
    /// Build an envelope stamped with the current time.
    pub fn new(status: Status, data: Option<T>, message: impl Into<String>) -> Self {
        Self {
            status,
            data,
            message: message.into(),
            timestamp: now_rfc3339(),
        }
    }

    pub fn success(data: T) -> Self {
        Self::new(Status::Success, Some(data), "")
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(Status::NotFound, None, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(Status::InvalidRequest, None, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Status::Error, None, message)
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl Envelope<Value> {
    /// Whether this is the greeting a server sends on accept.
    pub fn is_welcome(&self) -> bool {
        self.is_success()
            && self
                .data
                .as_ref()
                .is_some_and(|data| data.get("availableCommands").is_some())
    }
}

fn now_rfc3339() -> String {
    // Formatting only fails for years outside 0..=9999.
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_uses_screaming_snake_case() {
        assert_eq!(serde_json::to_value(Status::InvalidRequest).unwrap(), json!("INVALID_REQUEST"));
        assert_eq!(serde_json::to_value(Status::NotFound).unwrap(), json!("NOT_FOUND"));
    }

    #[test]
    fn error_envelope_has_null_data() {
        let envelope: Envelope<Value> = Envelope::error("db down");
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["status"], "ERROR");
        assert_eq!(value["data"], Value::Null);
        assert_eq!(value["message"], "db down");
        assert!(OffsetDateTime::parse(value["timestamp"].as_str().unwrap(), &Rfc3339).is_ok());
    }

    #[test]
    fn success_message_is_empty() {
        let envelope = Envelope::success(json!({"message": "pong"}));
        assert_eq!(envelope.message, "");
        assert!(!envelope.is_welcome());
    }

    #[test]
    fn detects_welcome() {
        let envelope = Envelope::success(json!({"message": "hi", "availableCommands": ["PING"]}));
        assert!(envelope.is_welcome());
    }
}
