//! External command helpers

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use autoshutdown_host_api::{HostError, HostResult};

/// Run `argv` to completion and return its stdout.
///
/// The child is killed if it outlives `timeout`. A non-zero exit is an
/// error carrying the trimmed stderr.
pub async fn run_command(argv: &[String], timeout: Duration) -> HostResult<String> {
    let Some((program, args)) = argv.split_first() else {
        return Err(HostError::Internal("Empty argv".into()));
    };
    let command_line = argv.join(" ");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result
            .map_err(|e| HostError::command_failed(&command_line, e.to_string()))?,
        Err(_) => {
            return Err(HostError::Timeout {
                command: command_line,
                timeout,
            });
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = match stderr.trim() {
            "" => output.status.to_string(),
            trimmed => format!("{}: {}", output.status, trimmed),
        };
        return Err(HostError::command_failed(command_line, message));
    }

    debug!(command = %command_line, "Command completed");
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether the daemon runs with an effective UID of 0
pub fn running_as_root() -> bool {
    nix::unistd::geteuid().is_root()
}
