//! Configuration for Codex CLI sessions.

use crate::error::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Sandbox policy passed to `codex exec --sandbox`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SandboxMode {
    /// Model-generated commands may only read the workspace.
    #[default]
    ReadOnly,
    /// Model-generated commands may write inside the workspace.
    WorkspaceWrite,
    /// No sandbox restrictions at all.
    DangerFullAccess,
}

impl SandboxMode {
    /// Returns the flag value understood by the Codex CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::WorkspaceWrite => "workspace-write",
            Self::DangerFullAccess => "danger-full-access",
        }
    }
}

impl fmt::Display for SandboxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SandboxMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "read-only" => Ok(Self::ReadOnly),
            "workspace-write" => Ok(Self::WorkspaceWrite),
            "danger-full-access" => Ok(Self::DangerFullAccess),
            other => Err(Error::InvalidSandboxMode {
                value: other.to_string(),
            }),
        }
    }
}

/// Host platform, used to pick how the prompt argument is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Windows, where `codex` resolves to a `.cmd` shim.
    Windows,
    /// Everything else; arguments are passed through untouched.
    Unix,
}

impl Platform {
    /// Returns the platform this binary was compiled for.
    #[must_use]
    pub const fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else {
            Self::Unix
        }
    }
}

/// Escapes a prompt for the given platform.
///
/// On Windows the `.cmd` shim re-parses its arguments, so quotes, control
/// characters and backslashes are escaped. Other platforms get the prompt back
/// unchanged.
#[must_use]
pub fn escape_prompt(prompt: &str, platform: Platform) -> String {
    match platform {
        Platform::Unix => prompt.to_string(),
        Platform::Windows => {
            let mut escaped = String::with_capacity(prompt.len());
            for c in prompt.chars() {
                match c {
                    '\\' => escaped.push_str("\\\\"),
                    '"' => escaped.push_str("\\\""),
                    '\n' => escaped.push_str("\\n"),
                    '\r' => escaped.push_str("\\r"),
                    '\t' => escaped.push_str("\\t"),
                    '\u{8}' => escaped.push_str("\\b"),
                    '\u{c}' => escaped.push_str("\\f"),
                    '\'' => escaped.push_str("\\'"),
                    other => escaped.push(other),
                }
            }
            escaped
        }
    }
}

/// A `codex exec` invocation.
///
/// Renders into the command vector handed to
/// [`run_session`](crate::run_session). Empty strings passed to the optional
/// setters are treated as unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodexCommand {
    /// Program to launch.
    pub program: String,
    /// Task instruction sent to Codex.
    pub prompt: String,
    /// Workspace root passed via `--cd`.
    pub workspace: PathBuf,
    /// Sandbox policy for model-generated commands.
    pub sandbox: SandboxMode,
    /// Session to resume, if any.
    pub session_id: Option<String>,
    /// Allow running outside a Git repository.
    pub skip_git_repo_check: bool,
    /// Images attached to the initial prompt.
    pub images: Vec<PathBuf>,
    /// Optional model override.
    pub model: Option<String>,
    /// Optional profile from `~/.codex/config.toml`.
    pub profile: Option<String>,
    /// Run every command without approvals or sandboxing.
    pub yolo: bool,
    /// Keep the full event log in the result.
    pub return_all_events: bool,
}

impl CodexCommand {
    /// Creates a new invocation for `prompt` inside `workspace`.
    #[must_use]
    pub fn new(prompt: impl Into<String>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            program: "codex".to_string(),
            prompt: prompt.into(),
            workspace: workspace.into(),
            sandbox: SandboxMode::default(),
            session_id: None,
            skip_git_repo_check: true,
            images: Vec::new(),
            model: None,
            profile: None,
            yolo: false,
            return_all_events: false,
        }
    }

    /// Overrides the program name or path (defaults to `codex`).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the sandbox policy.
    #[must_use]
    pub const fn with_sandbox(mut self, sandbox: SandboxMode) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Resumes an existing session.
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = non_empty(session_id.into());
        self
    }

    /// Controls `--skip-git-repo-check`.
    #[must_use]
    pub const fn with_skip_git_repo_check(mut self, skip: bool) -> Self {
        self.skip_git_repo_check = skip;
        self
    }

    /// Attaches one image to the prompt.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<PathBuf>) -> Self {
        self.images.push(image.into());
        self
    }

    /// Attaches several images to the prompt.
    #[must_use]
    pub fn with_images<I, P>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.images.extend(images.into_iter().map(Into::into));
        self
    }

    /// Sets the model to use for the session.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = non_empty(model.into());
        self
    }

    /// Sets the configuration profile to load.
    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = non_empty(profile.into());
        self
    }

    /// Enables `--yolo`.
    #[must_use]
    pub const fn with_yolo(mut self) -> Self {
        self.yolo = true;
        self
    }

    /// Keeps every parsed event in the session result.
    #[must_use]
    pub const fn with_all_events(mut self) -> Self {
        self.return_all_events = true;
        self
    }

    /// Renders the argument vector for `platform`.
    ///
    /// The prompt always comes last, after `--`, so it can never be mistaken
    /// for a flag.
    #[must_use]
    pub fn to_command_vector(&self, platform: Platform) -> Vec<String> {
        let mut cmd = vec![
            self.program.clone(),
            "exec".to_string(),
            "--sandbox".to_string(),
            self.sandbox.as_str().to_string(),
            "--cd".to_string(),
            self.workspace.display().to_string(),
            "--json".to_string(),
        ];
        if !self.images.is_empty() {
            let joined = self
                .images
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(",");
            cmd.push("--image".to_string());
            cmd.push(joined);
        }
        if let Some(ref model) = self.model {
            cmd.push("--model".to_string());
            cmd.push(model.clone());
        }
        if let Some(ref profile) = self.profile {
            cmd.push("--profile".to_string());
            cmd.push(profile.clone());
        }
        if self.yolo {
            cmd.push("--yolo".to_string());
        }
        if self.skip_git_repo_check {
            cmd.push("--skip-git-repo-check".to_string());
        }
        if let Some(ref session_id) = self.session_id {
            cmd.push("resume".to_string());
            cmd.push(session_id.clone());
        }
        cmd.push("--".to_string());
        cmd.push(escape_prompt(&self.prompt, platform));
        cmd
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Timing and protocol knobs for the output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOptions {
    /// How long the consumer waits on the channel before checking liveness.
    pub poll_interval: Duration,
    /// Pause between seeing the terminal event and terminating the child.
    pub grace_delay: Duration,
    /// How long shutdown waits for the child to exit before killing it.
    pub exit_timeout: Duration,
    /// How long shutdown waits for the reader thread to finish.
    pub join_timeout: Duration,
    /// Event `type` that marks the end of a turn.
    pub terminal_event: String,
}

impl StreamOptions {
    /// Event type Codex emits when a turn has finished.
    pub const TURN_COMPLETED: &str = "turn.completed";

    /// Creates options with the default timings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            grace_delay: Duration::from_millis(300),
            exit_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
            terminal_event: Self::TURN_COMPLETED.to_string(),
        }
    }

    /// Sets the channel poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the grace delay before terminating after the terminal event.
    #[must_use]
    pub const fn with_grace_delay(mut self, delay: Duration) -> Self {
        self.grace_delay = delay;
        self
    }

    /// Sets the bounded wait for child exit during shutdown.
    #[must_use]
    pub const fn with_exit_timeout(mut self, timeout: Duration) -> Self {
        self.exit_timeout = timeout;
        self
    }

    /// Sets the bounded wait for the reader thread during shutdown.
    #[must_use]
    pub const fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Sets the event type that ends the stream early.
    #[must_use]
    pub fn with_terminal_event(mut self, event_type: impl Into<String>) -> Self {
        self.terminal_event = event_type.into();
        self
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::new()
    }
}
