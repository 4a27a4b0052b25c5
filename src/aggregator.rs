//! Folds a Codex event stream into a single [`SessionResult`].

use crate::events::{EventRecord, SessionResult};
use crate::parsers::codex::{CodexEvent, ShapeError};
use regex::Regex;
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::LazyLock;
use tracing::{debug, warn};

static RECONNECTING: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^Reconnecting\.\.\.\s+\d+/\d+$").ok());

const MISSING_SESSION_ID: &str = "Failed to get a session id from the codex session.";
const MISSING_AGENT_TEXT: &str = "Failed to get agent messages from the codex session. \
     Request all events to see the full reasoning trace.";

/// Returns true for transient `Reconnecting... n/m` status messages.
#[must_use]
pub fn is_reconnecting(message: &str) -> bool {
    RECONNECTING
        .as_ref()
        .is_some_and(|re| re.is_match(message))
}

/// Accumulates events in arrival order.
///
/// The last `thread_id` seen wins. A failure event only fails the session when
/// no agent text has arrived before it. Lines that are not JSON are noted and
/// skipped; events with an unexpected shape stop the fold.
#[derive(Debug, Default)]
pub struct SessionAggregator {
    include_events: bool,
    events: Vec<EventRecord>,
    agent_text: String,
    session_id: Option<String>,
    failed: bool,
    halted: bool,
    diagnostics: Vec<String>,
}

impl SessionAggregator {
    /// Creates an empty aggregator. `include_events` keeps the event log in the result.
    #[must_use]
    pub fn new(include_events: bool) -> Self {
        Self {
            include_events,
            ..Self::default()
        }
    }

    /// Folds one line.
    ///
    /// Returns [`ControlFlow::Break`] once the stream must not be consumed further.
    pub fn push_line(&mut self, line: &str) -> ControlFlow<()> {
        if self.halted {
            return ControlFlow::Break(());
        }
        let json = match serde_json::from_str::<Value>(line) {
            Ok(json) => json,
            Err(e) => {
                debug!(error = %e, "skipping non-JSON line");
                self.note(format!("[json decode error] {line}"));
                self.record(EventRecord::Raw(line.to_string()));
                return ControlFlow::Continue(());
            }
        };
        let outcome = self.apply(&json);
        self.record(EventRecord::Json(json));
        if let Err(e) = outcome {
            self.note(format!("[unexpected error] Unexpected error: {e}. Line: {line:?}"));
            self.failed = true;
            self.halted = true;
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }

    fn apply(&mut self, json: &Value) -> Result<(), ShapeError> {
        let event = CodexEvent::new(json)?;
        if let Some(text) = event.agent_message()? {
            self.agent_text.push_str(text);
        }
        if let Some(thread_id) = event.thread_id()? {
            self.session_id = Some(thread_id.to_string());
        }
        let event_type = event.event_type()?;
        if event_type.contains("fail") {
            let message = event.error_message()?;
            self.protocol_failure(message);
        }
        if event_type.contains("error") {
            let message = event.message()?;
            if is_reconnecting(message) {
                debug!(%message, "ignoring reconnect notice");
            } else {
                self.protocol_failure(message);
            }
        }
        Ok(())
    }

    fn protocol_failure(&mut self, message: &str) {
        if self.agent_text.is_empty() {
            self.failed = true;
        }
        self.note(format!("[codex error] {message}"));
    }

    fn note(&mut self, diagnostic: String) {
        warn!(%diagnostic, "codex session diagnostic");
        self.diagnostics.push(diagnostic);
    }

    fn record(&mut self, event: EventRecord) {
        if self.include_events {
            self.events.push(event);
        }
    }

    /// Folds every line until the stream ends or the fold halts, then builds the result.
    #[must_use]
    pub fn consume<I>(mut self, lines: I) -> SessionResult
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for line in lines {
            if self.push_line(line.as_ref()).is_break() {
                break;
            }
        }
        self.finish()
    }

    /// Agent text accumulated so far.
    #[must_use]
    pub fn agent_text(&self) -> &str {
        &self.agent_text
    }

    /// Latest session id seen so far.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Diagnostics recorded so far, oldest first.
    #[must_use]
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Whether a fatal or pre-output failure has been recorded.
    #[must_use]
    pub const fn has_failed(&self) -> bool {
        self.failed
    }

    /// Applies the end-of-stream checks and builds the result.
    #[must_use]
    pub fn finish(mut self) -> SessionResult {
        let session_id = self.session_id.take().filter(|id| !id.is_empty());
        if session_id.is_none() {
            self.failed = true;
            self.diagnostics.insert(0, MISSING_SESSION_ID.to_string());
        }
        if self.agent_text.is_empty() {
            self.failed = true;
            self.diagnostics.insert(0, MISSING_AGENT_TEXT.to_string());
        }
        let all_events = self.include_events.then_some(self.events);
        match session_id {
            Some(id) if !self.failed => SessionResult::success(id, self.agent_text, all_events),
            _ => SessionResult::failure(self.diagnostics.join("\n\n"), all_events),
        }
    }
}
