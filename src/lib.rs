//! # codex-cli-runner
//!
//! A Rust library for running the Codex CLI in `exec --json` mode, streaming its
//! output on a background thread and folding the event stream into a single
//! [`SessionResult`].
//!
//! ## Features
//!
//! - Merged stdout/stderr streamed line by line with bounded shutdown
//! - Early termination once the turn-completed event is seen
//! - Tolerant event folding: malformed lines and reconnect notices never mask a reply
//! - Command builder for `codex exec`, including Windows prompt escaping
//!
//! ## Example
//!
//! ```no_run
//! use codex_cli_runner::{CodexCommand, SandboxMode, StreamOptions};
//!
//! let result = CodexCommand::new("Summarize the README", ".")
//!     .with_sandbox(SandboxMode::ReadOnly)
//!     .run(&StreamOptions::default())
//!     .unwrap();
//!
//! if result.is_success() {
//!     println!("{}", result.agent_text().unwrap_or_default());
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]

mod aggregator;
mod config;
mod error;
mod events;
mod parsers;
mod process;
mod session;
mod stream;

pub use aggregator::{is_reconnecting, SessionAggregator};
pub use config::{escape_prompt, CodexCommand, Platform, SandboxMode, StreamOptions};
pub use error::{Error, Result};
pub use events::{EventRecord, SessionResult};
pub use parsers::codex::{CodexEvent, ShapeError};
pub use process::resolve_executable;
pub use session::{run_session, LineStream};
pub use stream::is_terminal_event;
