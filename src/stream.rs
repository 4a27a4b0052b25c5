//! Background reader for the CLI's merged output.

use std::io::{BufRead, BufReader, Read};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// A message from the reader thread to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// One trimmed output line.
    Line(String),
    /// The reader has stopped. `terminate` is set when it stopped because the
    /// terminal event was seen and the child should be asked to exit.
    Finished {
        /// Whether the child should be terminated.
        terminate: bool,
    },
}

/// Copies lines from the CLI's output into a channel.
pub struct StreamReader<R: Read> {
    reader: BufReader<R>,
    terminal_event: String,
    grace_delay: Duration,
}

impl<R: Read> StreamReader<R> {
    /// Creates a new stream reader.
    pub fn new(reader: R, terminal_event: impl Into<String>, grace_delay: Duration) -> Self {
        Self {
            reader: BufReader::new(reader),
            terminal_event: terminal_event.into(),
            grace_delay,
        }
    }

    /// Reads until EOF or the terminal event, then sends the end sentinel.
    pub fn read_to_channel(mut self, sender: &Sender<StreamMessage>) {
        let mut buf = Vec::new();
        let mut terminate = false;
        loop {
            buf.clear();
            match self.reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf).trim().to_string();
                    let done = is_terminal_event(&line, &self.terminal_event);
                    if sender.send(StreamMessage::Line(line)).is_err() {
                        return;
                    }
                    if done {
                        info!(event = %self.terminal_event, "terminal event seen, stopping reader");
                        thread::sleep(self.grace_delay);
                        terminate = true;
                        break;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "read error on CLI output");
                    break;
                }
            }
        }
        let _ = sender.send(StreamMessage::Finished { terminate });
    }
}

/// Returns true when `line` is a JSON object whose `type` equals `terminal_event`.
#[must_use]
pub fn is_terminal_event(line: &str, terminal_event: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(line)
        .ok()
        .and_then(|json| {
            json.get("type")
                .and_then(serde_json::Value::as_str)
                .map(|t| t == terminal_event)
        })
        .unwrap_or(false)
}
