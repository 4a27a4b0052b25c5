//! Field access for Codex CLI `exec --json` events.
//!
//! Codex emits one JSON object per line with a `type` field, for example:
//! - `thread.started`: carries the `thread_id` used to resume the session
//! - `item.completed`: carries an `item`, e.g. `{"type": "agent_message", "text": ...}`
//! - `turn.completed` / `turn.failed`: end of a turn, failures carry `error.message`
//! - `error`: transport or model errors with a top-level `message`
//!
//! Fields are looked up lazily. A missing or `null` field reads as absent; a
//! field of the wrong type is a [`ShapeError`].

use serde_json::{Map, Value};
use std::fmt;

/// Item type of a reply written for the caller.
pub const AGENT_MESSAGE: &str = "agent_message";

/// An event did not have the shape the aggregator relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The line parsed as JSON but not as an object.
    NotAnObject,
    /// A field was present with an unexpected type.
    FieldType {
        /// Dotted path of the field.
        field: &'static str,
        /// The type that was expected.
        expected: &'static str,
    },
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "event is not a JSON object"),
            Self::FieldType { field, expected } => {
                write!(f, "field `{field}` is not {expected}")
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// A borrowed view of one Codex event.
#[derive(Debug, Clone, Copy)]
pub struct CodexEvent<'a> {
    fields: &'a Map<String, Value>,
}

impl<'a> CodexEvent<'a> {
    /// Wraps a parsed line.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::NotAnObject`] for arrays, strings, numbers and the like.
    pub fn new(json: &'a Value) -> Result<Self, ShapeError> {
        json.as_object()
            .map(|fields| Self { fields })
            .ok_or(ShapeError::NotAnObject)
    }

    /// The event `type`, or `""` when absent.
    ///
    /// # Errors
    ///
    /// Fails when `type` is not a string.
    pub fn event_type(&self) -> Result<&'a str, ShapeError> {
        Ok(str_field(self.fields, "type", "type")?.unwrap_or(""))
    }

    /// The `thread_id`, when present and not null.
    ///
    /// # Errors
    ///
    /// Fails when `thread_id` is not a string.
    pub fn thread_id(&self) -> Result<Option<&'a str>, ShapeError> {
        str_field(self.fields, "thread_id", "thread_id")
    }

    /// The reply text when `item.type` is `agent_message`.
    ///
    /// A message without `text` yields `Some("")`.
    ///
    /// # Errors
    ///
    /// Fails when `item` is not an object or `item.text` is not a string.
    pub fn agent_message(&self) -> Result<Option<&'a str>, ShapeError> {
        let Some(item) = object_field(self.fields, "item", "item")? else {
            return Ok(None);
        };
        if item.get("type").and_then(Value::as_str) != Some(AGENT_MESSAGE) {
            return Ok(None);
        }
        Ok(Some(str_field(item, "text", "item.text")?.unwrap_or("")))
    }

    /// `error.message`, or `""` when absent.
    ///
    /// # Errors
    ///
    /// Fails when `error` is not an object or `error.message` is not a string.
    pub fn error_message(&self) -> Result<&'a str, ShapeError> {
        let Some(error) = object_field(self.fields, "error", "error")? else {
            return Ok("");
        };
        Ok(str_field(error, "message", "error.message")?.unwrap_or(""))
    }

    /// The top-level `message`, or `""` when absent.
    ///
    /// # Errors
    ///
    /// Fails when `message` is not a string.
    pub fn message(&self) -> Result<&'a str, ShapeError> {
        Ok(str_field(self.fields, "message", "message")?.unwrap_or(""))
    }
}

fn str_field<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<Option<&'a str>, ShapeError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(ShapeError::FieldType {
            field: path,
            expected: "a string",
        }),
    }
}

fn object_field<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    path: &'static str,
) -> Result<Option<&'a Map<String, Value>>, ShapeError> {
    match fields.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(ShapeError::FieldType {
            field: path,
            expected: "an object",
        }),
    }
}
