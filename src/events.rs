//! Event log entries and the folded session result.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One entry of the session's event log.
///
/// Lines that parse as JSON are kept as their value; anything else is kept
/// verbatim so the trace still shows what the CLI printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventRecord {
    /// A line that parsed as JSON.
    Json(Value),
    /// A line that did not.
    Raw(String),
}

impl EventRecord {
    /// Returns the JSON value, if this entry parsed.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Raw(_) => None,
        }
    }
}

/// Outcome of one Codex session.
///
/// A successful result always carries a non-empty session id and agent text.
/// A failed one always carries a non-empty error message. The record is built
/// once by the aggregator and is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_events: Option<Vec<EventRecord>>,
}

impl SessionResult {
    pub(crate) const fn success(
        session_id: String,
        agent_text: String,
        all_events: Option<Vec<EventRecord>>,
    ) -> Self {
        Self {
            success: true,
            session_id: Some(session_id),
            agent_text: Some(agent_text),
            error_message: None,
            all_events,
        }
    }

    pub(crate) const fn failure(error_message: String, all_events: Option<Vec<EventRecord>>) -> Self {
        Self {
            success: false,
            session_id: None,
            agent_text: None,
            error_message: Some(error_message),
            all_events,
        }
    }

    /// Whether the session produced a usable reply.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// The session id to resume with. Only set on success.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The concatenated agent reply. Only set on success.
    #[must_use]
    pub fn agent_text(&self) -> Option<&str> {
        self.agent_text.as_deref()
    }

    /// Accumulated diagnostics. Only set on failure.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The full event log, when it was requested.
    #[must_use]
    pub fn all_events(&self) -> Option<&[EventRecord]> {
        self.all_events.as_deref()
    }

    /// Serializes the result into its JSON wire shape.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
