//! Event records received from the backend stream.
//!
//! Records are kept exactly as received. Typed views (`ActionEvent`,
//! `Observation`) are derived on demand and never replace the raw value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ActionEvent;

/// Who emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    User,
    Agent,
    Environment,
    /// Any source tag this client does not know about.
    #[serde(other)]
    Unknown,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EventSource::User => "user",
            EventSource::Agent => "agent",
            EventSource::Environment => "environment",
            EventSource::Unknown => "unknown",
        }
    }
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable event record, stored verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(Value);

impl EventRecord {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Returns the event id if it is an integer or a string holding one.
    /// Fractional or partially numeric ids yield `None`.
    pub fn id(&self) -> Option<i64> {
        match self.0.get("id")? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn source(&self) -> Option<EventSource> {
        self.0
            .get("source")
            .and_then(|v| EventSource::deserialize(v).ok())
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(Value::as_str)
    }

    pub fn timestamp(&self) -> Option<&str> {
        self.0.get("timestamp").and_then(Value::as_str)
    }

    /// The `action` tag, if this record is an action.
    pub fn action_tag(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    /// True when the record carries the full event envelope
    /// (`id`, `source`, `message`, `timestamp`).
    pub fn has_envelope(&self) -> bool {
        let Some(obj) = self.0.as_object() else {
            return false;
        };
        ["id", "source", "message", "timestamp"]
            .iter()
            .all(|key| obj.contains_key(*key))
    }

    /// True for chat messages from the user or the agent.
    ///
    /// Only these count towards the message rate.
    pub fn is_message_action(&self) -> bool {
        self.has_envelope()
            && matches!(self.source(), Some(EventSource::User | EventSource::Agent))
            && self.action_tag() == Some("message")
    }

    /// Decodes the typed action view. Unknown `(source, action)` pairs and
    /// malformed args yield `None`.
    pub fn action(&self) -> Option<ActionEvent> {
        ActionEvent::from_value(&self.0)
    }

    /// Returns the observation view if this record is an observation.
    pub fn observation(&self) -> Option<Observation<'_>> {
        let tag = self.0.get("observation").and_then(Value::as_str)?;
        Some(Observation {
            tag,
            content: self.0.get("content").and_then(Value::as_str).unwrap_or(""),
            extras: self.0.get("extras"),
        })
    }
}

impl From<Value> for EventRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Borrowed view over an observation record (command output, file content, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<'a> {
    pub tag: &'a str,
    pub content: &'a str,
    pub extras: Option<&'a Value>,
}
