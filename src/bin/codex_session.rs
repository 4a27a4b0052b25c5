//! `codex-session` — run one Codex CLI session and print the folded result.
//!
//! The result is written to stdout as JSON. Logs go to stderr and are
//! filtered with `RUST_LOG` (default `warn`).

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use codex_cli_runner::{CodexCommand, SandboxMode, StreamOptions};
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "codex-session", about = "Run a Codex CLI session and print its result", version, long_about = None)]
struct Cli {
    /// Instruction for the task to send to Codex.
    prompt: String,

    /// Workspace root for Codex.
    #[arg(long = "cd", default_value = ".")]
    workspace: PathBuf,

    /// Sandbox policy for model-generated commands.
    #[arg(long, default_value = "read-only", value_parser = parse_sandbox)]
    sandbox: SandboxMode,

    /// Resume the given session instead of starting a new one.
    #[arg(long)]
    session_id: Option<String>,

    /// Refuse to run outside a Git repository.
    #[arg(long)]
    require_git_repo: bool,

    /// Image to attach to the prompt (repeatable).
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Model override.
    #[arg(long)]
    model: Option<String>,

    /// Profile from `~/.codex/config.toml`.
    #[arg(long)]
    profile: Option<String>,

    /// Run every command without approvals or sandboxing.
    #[arg(long)]
    yolo: bool,

    /// Include every event in the output.
    #[arg(long)]
    all_events: bool,

    /// Codex executable to launch.
    #[arg(long, default_value = "codex")]
    program: String,

    /// Seconds to wait for the process to exit before killing it.
    #[arg(long, default_value_t = 5)]
    exit_timeout: u64,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn parse_sandbox(value: &str) -> Result<SandboxMode, String> {
    value.parse().map_err(|e: codex_cli_runner::Error| e.to_string())
}

impl Cli {
    fn to_command(&self) -> CodexCommand {
        let mut command = CodexCommand::new(self.prompt.clone(), self.workspace.clone())
            .with_program(self.program.clone())
            .with_sandbox(self.sandbox)
            .with_skip_git_repo_check(!self.require_git_repo)
            .with_images(self.images.iter().cloned());
        if let Some(ref id) = self.session_id {
            command = command.with_session_id(id.clone());
        }
        if let Some(ref model) = self.model {
            command = command.with_model(model.clone());
        }
        if let Some(ref profile) = self.profile {
            command = command.with_profile(profile.clone());
        }
        if self.yolo {
            command = command.with_yolo();
        }
        if self.all_events {
            command = command.with_all_events();
        }
        command
    }
}

fn init_tracing(log_format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);
    let installed = match log_format {
        LogFormat::Text => subscriber.try_init(),
        LogFormat::Json => subscriber.json().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("failed to init tracing: {e}");
    }
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.log_format);

    let options = StreamOptions::default().with_exit_timeout(Duration::from_secs(args.exit_timeout));
    let result = match args.to_command().run(&options) {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "failed to start codex");
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };

    let rendered = serde_json::to_string_pretty(&result).unwrap_or_else(|_| "{}".to_string());
    let mut stdout = std::io::stdout().lock();
    if writeln!(stdout, "{rendered}").is_err() {
        return ExitCode::from(2);
    }
    if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
