//! Process spawning and management for the Codex CLI.

use crate::error::{Error, Result};
use std::env;
use std::ffi::OsString;
use std::io::PipeReader;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A spawned child whose stdout and stderr share one pipe.
pub struct SpawnedProcess {
    /// The child process handle.
    pub child: Child,
    /// Read end of the merged output pipe.
    pub output: PipeReader,
}

/// Spawns `command` with stdin closed and stdout/stderr merged.
///
/// The first element is resolved against `PATH` and replaced by its canonical
/// path; if that fails the literal value is used. No shell is involved.
pub fn spawn(command: &[String]) -> Result<SpawnedProcess> {
    let (program, args) = command.split_first().ok_or(Error::EmptyCommand)?;
    let resolved = resolve_executable(program).unwrap_or_else(|| PathBuf::from(program));
    let (output, writer) = std::io::pipe().map_err(|e| Error::PipeFailed { source: e })?;
    let stderr_writer = writer
        .try_clone()
        .map_err(|e| Error::PipeFailed { source: e })?;
    // The Command holds the write ends; it must be dropped before reading or
    // the reader never sees EOF.
    let child = {
        let mut cmd = Command::new(&resolved);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);
        cmd.spawn().map_err(|e| Error::SpawnFailed {
            program: program.clone(),
            source: e,
        })?
    };
    info!(program = %resolved.display(), pid = child.id(), "spawned CLI process");
    Ok(SpawnedProcess { child, output })
}

/// Finds `program` on `PATH` and returns its canonical path.
///
/// Names containing a path separator are canonicalized directly.
#[must_use]
pub fn resolve_executable(program: &str) -> Option<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return path.canonicalize().ok();
    }
    let search = env::var_os("PATH")?;
    env::split_paths(&search).find_map(|dir| {
        candidate_names(program)
            .into_iter()
            .map(|name| dir.join(name))
            .find(|candidate| is_executable(candidate))
            .and_then(|candidate| candidate.canonicalize().ok())
    })
}

fn candidate_names(program: &str) -> Vec<OsString> {
    let mut names = vec![OsString::from(program)];
    if cfg!(windows) && Path::new(program).extension().is_none() {
        let exts = env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
        names.extend(
            exts.split(';')
                .filter(|ext| !ext.is_empty())
                .map(|ext| OsString::from(format!("{program}{ext}"))),
        );
    }
    names
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Asks the child to exit.
///
/// Sends `SIGTERM` on Unix so the CLI can flush; elsewhere the process is
/// killed outright.
pub fn terminate(child: &mut Child) {
    if matches!(child.try_wait(), Ok(Some(_))) {
        return;
    }
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;
        let Ok(raw) = i32::try_from(child.id()) else {
            return;
        };
        if let Err(e) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
            debug!(pid = raw, error = %e, "SIGTERM failed");
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = child.kill() {
            debug!(pid = child.id(), error = %e, "terminate failed");
        }
    }
}

/// Waits up to `timeout` for the child to exit, killing it afterwards.
///
/// Returns the exit code when one is available.
pub fn wait_or_kill(child: &mut Child, timeout: Duration) -> Option<i32> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return status.code(),
            Ok(None) if Instant::now() < deadline => thread::sleep(EXIT_POLL_INTERVAL),
            Ok(None) => break,
            Err(e) => {
                warn!(pid = child.id(), error = %e, "failed to poll child status");
                break;
            }
        }
    }
    warn!(pid = child.id(), ?timeout, "child did not exit in time, killing");
    let _ = child.kill();
    child.wait().ok().and_then(|s| s.code())
}

/// Waits up to `timeout` for `handle` to finish.
///
/// Returns `false` and detaches the thread when it is still running.
pub fn join_with_timeout(handle: thread::JoinHandle<()>, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            warn!(?timeout, "output reader did not finish in time, detaching");
            return false;
        }
        thread::sleep(EXIT_POLL_INTERVAL);
    }
    if handle.join().is_err() {
        warn!("output reader panicked");
    }
    true
}
