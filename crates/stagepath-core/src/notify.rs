//! Failure normalization and user notifications
//!
//! Collaborators fail with payloads of different shapes. [`normalize`]
//! flattens any mix of them into the plain messages shown to the user.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure reported by a metadata source or record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceError {
    /// Structured payload carrying several messages (read failures)
    #[error("{} read error(s)", .messages.len())]
    Read {
        /// One entry per reported problem
        messages: Vec<Option<String>>,
    },

    /// Payload carrying a single message (write, server and network failures)
    #[error("{}", .message.as_deref().unwrap_or("request failed"))]
    Body {
        /// Reported message
        message: Option<String>,
    },

    /// Message-bearing failure raised locally
    #[error("{}", .message.as_deref().unwrap_or("unknown error"))]
    Plain {
        /// Reported message
        message: Option<String>,
    },

    /// Opaque failure with only a transport status
    #[error("{}", .status_text.as_deref().unwrap_or("unknown status"))]
    Status {
        /// Transport status text
        status_text: Option<String>,
    },
}

impl SourceError {
    /// Multi-message failure
    #[must_use]
    pub fn read<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Read {
            messages: messages.into_iter().map(|m| Some(m.into())).collect(),
        }
    }

    /// Single-message payload failure
    #[inline]
    #[must_use]
    pub fn body(message: impl Into<String>) -> Self {
        Self::Body {
            message: Some(message.into()),
        }
    }

    /// Plain message failure
    #[inline]
    #[must_use]
    pub fn plain(message: impl Into<String>) -> Self {
        Self::Plain {
            message: Some(message.into()),
        }
    }

    /// Status-only failure
    #[inline]
    #[must_use]
    pub fn status(status_text: impl Into<String>) -> Self {
        Self::Status {
            status_text: Some(status_text.into()),
        }
    }

    /// Classify a raw JSON failure payload
    ///
    /// Checked in order: `body` array, `body.message` string, `message`
    /// string, then `statusText`.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        let body = value.get("body");
        if let Some(entries) = body.and_then(Value::as_array) {
            return Self::Read {
                messages: entries
                    .iter()
                    .map(|e| e.get("message").and_then(Value::as_str).map(str::to_string))
                    .collect(),
            };
        }
        if let Some(message) = body.and_then(|b| b.get("message")).and_then(Value::as_str) {
            return Self::body(message);
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return Self::plain(message);
        }
        Self::Status {
            status_text: value
                .get("statusText")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Messages carried by this failure, in order, possibly empty
    fn raw_messages(&self) -> Vec<Option<&str>> {
        match self {
            Self::Read { messages } => messages.iter().map(Option::as_deref).collect(),
            Self::Body { message } | Self::Plain { message } => vec![message.as_deref()],
            Self::Status { status_text } => vec![status_text.as_deref()],
        }
    }
}

/// Flatten failures into user-facing messages
///
/// Absent failures and absent or empty messages are dropped. Order is kept
/// and duplicates are not removed.
pub fn normalize<'a, I>(errors: I) -> Vec<String>
where
    I: IntoIterator<Item = Option<&'a SourceError>>,
{
    errors
        .into_iter()
        .flatten()
        .flat_map(SourceError::raw_messages)
        .flatten()
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize a single failure
#[must_use]
pub fn normalize_one(error: &SourceError) -> Vec<String> {
    normalize([Some(error)])
}

/// Normalize a raw JSON payload holding one failure or an array of them
///
/// Null entries are dropped.
#[must_use]
pub fn normalize_json(value: &Value) -> Vec<String> {
    let errors: Vec<SourceError> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_null())
            .map(SourceError::from_json)
            .collect(),
        other => vec![SourceError::from_json(other)],
    };
    normalize(errors.iter().map(Some))
}

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Operation succeeded
    Success,
    /// Informational
    Info,
    /// Recoverable problem
    Warning,
    /// Operation failed
    Error,
}

/// Message shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Short title
    pub title: String,
    /// Body text
    pub message: String,
    /// Severity
    pub severity: Severity,
}

impl Notification {
    /// Create notification
    #[inline]
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }

    /// Successful stage change
    #[must_use]
    pub fn record_updated() -> Self {
        Self::new("Success", "Record updated", Severity::Success)
    }

    /// Failed stage change
    #[must_use]
    pub fn update_failed(messages: &[String]) -> Self {
        Self::new("Error updating record", messages.join(", "), Severity::Error)
    }
}

/// Receiver of user notifications
///
/// Fire-and-forget: implementations must not block.
pub trait NotificationSink: Send + Sync {
    /// Show a notification
    fn notify(&self, notification: Notification);
}

/// Sink that writes notifications to the tracing subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Success | Severity::Info => {
                tracing::info!(title = %n.title, "{}", n.message);
            }
            Severity::Warning => tracing::warn!(title = %n.title, "{}", n.message),
            Severity::Error => tracing::error!(title = %n.title, "{}", n.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_mixed_shapes_in_order() {
        let read = SourceError::Read {
            messages: vec![
                Some("first".to_string()),
                None,
                Some(String::new()),
                Some("second".to_string()),
            ],
        };
        let plain = SourceError::plain("third");

        let messages = normalize([Some(&read), None, Some(&plain)]);
        assert_eq!(messages, ["first", "second", "third"]);
    }

    #[test]
    fn normalize_keeps_duplicates() {
        let a = SourceError::body("denied");
        let b = SourceError::body("denied");
        assert_eq!(normalize([Some(&a), Some(&b)]), ["denied", "denied"]);
    }

    #[test]
    fn normalize_drops_empty_status() {
        let err = SourceError::Status { status_text: None };
        assert!(normalize_one(&err).is_empty());
        assert_eq!(normalize_one(&SourceError::status("Bad Gateway")), ["Bad Gateway"]);
    }

    #[test]
    fn classify_json_payloads() {
        assert_eq!(
            SourceError::from_json(&json!({"body": [{"message": "a"}, {"errorCode": "X"}]})),
            SourceError::Read {
                messages: vec![Some("a".to_string()), None]
            }
        );
        assert_eq!(
            SourceError::from_json(&json!({"body": {"message": "b"}})),
            SourceError::body("b")
        );
        assert_eq!(
            SourceError::from_json(&json!({"message": "c"})),
            SourceError::plain("c")
        );
        assert_eq!(
            SourceError::from_json(&json!({"statusText": "Not Found"})),
            SourceError::status("Not Found")
        );
        assert_eq!(
            SourceError::from_json(&json!({"body": {"message": 5}})),
            SourceError::Status { status_text: None }
        );
    }

    #[test]
    fn normalize_json_accepts_single_or_array() {
        assert_eq!(normalize_json(&json!({"message": "only"})), ["only"]);
        assert_eq!(
            normalize_json(&json!([
                null,
                {"body": [{"message": "x"}, {"message": "y"}]},
                {"body": {"message": "z"}}
            ])),
            ["x", "y", "z"]
        );
        assert!(normalize_json(&Value::Null).is_empty());
    }

    #[test]
    fn update_failed_joins_messages() {
        let n = Notification::update_failed(&["a".to_string(), "b".to_string()]);
        assert_eq!(n.title, "Error updating record");
        assert_eq!(n.message, "a, b");
        assert_eq!(n.severity, Severity::Error);
    }

    #[test]
    fn source_error_display() {
        assert_eq!(SourceError::body("nope").to_string(), "nope");
        assert_eq!(SourceError::read(["a", "b"]).to_string(), "2 read error(s)");
    }
}
