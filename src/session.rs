//! Codex session management.

use crate::aggregator::SessionAggregator;
use crate::config::{CodexCommand, Platform, StreamOptions};
use crate::error::{Error, Result};
use crate::events::SessionResult;
use crate::process::{self, SpawnedProcess};
use crate::stream::{StreamMessage, StreamReader};
use std::collections::VecDeque;
use std::process::Child;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use tracing::{debug, info};

/// Live output of one CLI process.
///
/// Iterating yields the child's merged stdout/stderr lines in order. The
/// sequence ends when the child closes its output, when the terminal event is
/// seen, or when the child has exited and the reader is gone. Shutdown then
/// reaps the child (killing it if needed), joins the reader and yields any
/// lines still buffered. Dropping the stream early runs the same shutdown.
pub struct LineStream {
    child: Child,
    receiver: Receiver<StreamMessage>,
    reader: Option<thread::JoinHandle<()>>,
    options: StreamOptions,
    state: StreamState,
    pending: VecDeque<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Streaming,
    Draining,
    Closed,
}

impl LineStream {
    /// Spawns `command` and starts reading its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty, the output pipe cannot be
    /// created, the process fails to spawn, or the reader thread cannot start.
    pub fn spawn(command: &[String], options: StreamOptions) -> Result<Self> {
        let SpawnedProcess { mut child, output } = process::spawn(command)?;
        let (sender, receiver) = mpsc::channel();
        let reader = StreamReader::new(output, options.terminal_event.clone(), options.grace_delay);
        let handle = thread::Builder::new()
            .name("codex-output-reader".to_string())
            .spawn(move || reader.read_to_channel(&sender));
        let handle = match handle {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::ReaderSpawnFailed { source: e });
            }
        };
        Ok(Self {
            child,
            receiver,
            reader: Some(handle),
            options,
            state: StreamState::Streaming,
            pending: VecDeque::new(),
        })
    }

    /// Returns the OS process id of the child.
    #[must_use]
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    fn next_streaming(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv_timeout(self.options.poll_interval) {
                Ok(StreamMessage::Line(line)) => return Some(line),
                Ok(StreamMessage::Finished { terminate }) => {
                    if terminate {
                        process::terminate(&mut self.child);
                    }
                    return None;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let exited = matches!(self.child.try_wait(), Ok(Some(_)));
                    let reader_done = self.reader.as_ref().is_none_or(thread::JoinHandle::is_finished);
                    if exited && reader_done {
                        return None;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn shutdown(&mut self) {
        let exit_code = process::wait_or_kill(&mut self.child, self.options.exit_timeout);
        if let Some(handle) = self.reader.take() {
            process::join_with_timeout(handle, self.options.join_timeout);
        }
        while let Ok(message) = self.receiver.try_recv() {
            if let StreamMessage::Line(line) = message {
                self.pending.push_back(line);
            }
        }
        info!(?exit_code, buffered = self.pending.len(), "CLI process finished");
    }
}

impl Iterator for LineStream {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                StreamState::Streaming => {
                    if let Some(line) = self.next_streaming() {
                        debug!(%line, "CLI output");
                        return Some(line);
                    }
                    self.shutdown();
                    self.state = StreamState::Draining;
                }
                StreamState::Draining => {
                    if let Some(line) = self.pending.pop_front() {
                        return Some(line);
                    }
                    self.state = StreamState::Closed;
                }
                StreamState::Closed => return None,
            }
        }
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        if self.state == StreamState::Streaming {
            self.shutdown();
            self.state = StreamState::Closed;
        }
    }
}

/// Runs `command` to completion and folds its output into a [`SessionResult`].
///
/// # Errors
///
/// Returns an error only when the process cannot be started. Everything that
/// goes wrong inside the event stream is reported through the result.
pub fn run_session(
    command: &[String],
    options: &StreamOptions,
    include_events: bool,
) -> Result<SessionResult> {
    let lines = LineStream::spawn(command, options.clone())?;
    Ok(SessionAggregator::new(include_events).consume(lines))
}

impl CodexCommand {
    /// Runs this invocation on the current platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the Codex CLI cannot be started.
    pub fn run(&self, options: &StreamOptions) -> Result<SessionResult> {
        let command = self.to_command_vector(Platform::current());
        run_session(&command, options, self.return_all_events)
    }
}
