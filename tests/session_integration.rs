//! Integration tests for command construction and stream options.

use codex_cli_runner::{
    escape_prompt, CodexCommand, Error, Platform, SandboxMode, StreamOptions,
};
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_default_command_vector() {
    let cmd = CodexCommand::new("fix the bug", "/work").to_command_vector(Platform::Unix);
    assert_eq!(
        cmd,
        vec![
            "codex",
            "exec",
            "--sandbox",
            "read-only",
            "--cd",
            "/work",
            "--json",
            "--skip-git-repo-check",
            "--",
            "fix the bug",
        ]
    );
}

#[test]
fn test_full_command_vector() {
    let cmd = CodexCommand::new("go", "/repo")
        .with_sandbox(SandboxMode::WorkspaceWrite)
        .with_images(["a.png", "b.png"])
        .with_model("gpt-5")
        .with_profile("fast")
        .with_yolo()
        .with_skip_git_repo_check(false)
        .with_session_id("abc-123")
        .to_command_vector(Platform::Unix);
    assert_eq!(
        cmd,
        vec![
            "codex",
            "exec",
            "--sandbox",
            "workspace-write",
            "--cd",
            "/repo",
            "--json",
            "--image",
            "a.png,b.png",
            "--model",
            "gpt-5",
            "--profile",
            "fast",
            "--yolo",
            "resume",
            "abc-123",
            "--",
            "go",
        ]
    );
}

#[test]
fn test_empty_optional_values_are_unset() {
    let config = CodexCommand::new("p", "/tmp")
        .with_session_id("")
        .with_model("  ")
        .with_profile("");
    assert_eq!(config.session_id, None);
    assert_eq!(config.model, None);
    assert_eq!(config.profile, None);
}

#[test]
fn test_prompt_that_looks_like_a_flag_stays_after_separator() {
    let cmd = CodexCommand::new("--yolo; rm -rf /", "/tmp").to_command_vector(Platform::Unix);
    let separator = cmd.iter().position(|a| a == "--");
    assert_eq!(separator, Some(cmd.len() - 2));
    assert_eq!(cmd.last().map(String::as_str), Some("--yolo; rm -rf /"));
}

#[test]
fn test_windows_prompt_is_escaped() {
    let cmd = CodexCommand::new("say \"hi\"\n", "C:\\work").to_command_vector(Platform::Windows);
    assert_eq!(cmd.last().map(String::as_str), Some("say \\\"hi\\\"\\n"));
}

#[test]
fn test_escape_prompt_windows() {
    let input = "a\\b\"c\nd\re\tf\u{8}g\u{c}h'i";
    assert_eq!(
        escape_prompt(input, Platform::Windows),
        "a\\\\b\\\"c\\nd\\re\\tf\\bg\\fh\\'i"
    );
}

#[test]
fn test_escape_prompt_unix_is_identity() {
    let input = "quote \" newline \n backslash \\";
    assert_eq!(escape_prompt(input, Platform::Unix), input);
}

#[test]
fn test_sandbox_mode_round_trip() {
    for mode in [
        SandboxMode::ReadOnly,
        SandboxMode::WorkspaceWrite,
        SandboxMode::DangerFullAccess,
    ] {
        assert_eq!(mode.to_string().parse::<SandboxMode>().ok(), Some(mode));
    }
    assert!(matches!(
        "full".parse::<SandboxMode>(),
        Err(Error::InvalidSandboxMode { .. })
    ));
}

#[test]
fn test_config_builder() {
    let config = CodexCommand::new("p", PathBuf::from("/tmp"))
        .with_program("/opt/codex/bin/codex")
        .with_image("shot.png")
        .with_all_events();
    assert_eq!(config.program, "/opt/codex/bin/codex");
    assert_eq!(config.images, vec![PathBuf::from("shot.png")]);
    assert!(config.return_all_events);
    assert!(config.skip_git_repo_check);
    assert!(!config.yolo);
    assert_eq!(config.sandbox, SandboxMode::ReadOnly);
}

#[test]
fn test_stream_options_defaults() {
    let options = StreamOptions::default();
    assert_eq!(options.poll_interval, Duration::from_millis(500));
    assert_eq!(options.grace_delay, Duration::from_millis(300));
    assert_eq!(options.exit_timeout, Duration::from_secs(5));
    assert_eq!(options.join_timeout, Duration::from_secs(5));
    assert_eq!(options.terminal_event, "turn.completed");

    let tuned = StreamOptions::new()
        .with_poll_interval(Duration::from_millis(10))
        .with_terminal_event("done");
    assert_eq!(tuned.poll_interval, Duration::from_millis(10));
    assert_eq!(tuned.terminal_event, "done");
}
