//! Error types for the codex-cli-runner library.

use std::fmt;
use std::io;

/// The result type for codex-cli-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur before a session produces any output.
///
/// Problems inside the event stream (malformed lines, failure events, missing
/// session ids) never surface here; they are folded into a
/// [`SessionResult`](crate::SessionResult) instead.
#[derive(Debug)]
pub enum Error {
    /// The command vector was empty, so there is no program to run.
    EmptyCommand,
    /// Failed to spawn the CLI process.
    SpawnFailed {
        /// The program that could not be started.
        program: String,
        /// The underlying IO error.
        source: io::Error,
    },
    /// Failed to create the pipe that merges stdout and stderr.
    PipeFailed {
        /// The underlying IO error.
        source: io::Error,
    },
    /// Failed to start the background output reader.
    ReaderSpawnFailed {
        /// The underlying IO error.
        source: io::Error,
    },
    /// A sandbox mode string did not name a known policy.
    InvalidSandboxMode {
        /// The rejected value.
        value: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCommand => write!(f, "Cannot spawn process: command vector is empty"),
            Self::SpawnFailed { program, source } => {
                write!(f, "Failed to spawn CLI process {program}: {source}")
            }
            Self::PipeFailed { source } => {
                write!(f, "Failed to create output pipe: {source}")
            }
            Self::ReaderSpawnFailed { source } => {
                write!(f, "Failed to start output reader thread: {source}")
            }
            Self::InvalidSandboxMode { value } => {
                write!(
                    f,
                    "Invalid sandbox mode {value:?}: expected read-only, workspace-write or danger-full-access"
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SpawnFailed { source, .. }
            | Self::PipeFailed { source }
            | Self::ReaderSpawnFailed { source } => Some(source),
            Self::EmptyCommand | Self::InvalidSandboxMode { .. } => None,
        }
    }
}
