// Shell command execution for RunCommand actions

use super::{ActionError, ActionErrorCode};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[cfg(target_os = "windows")]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[cfg(target_os = "windows")]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd.exe");
    // Passed verbatim so cmd.exe sees the user's own quoting
    cmd.raw_arg("/C").raw_arg(command);
    cmd.creation_flags(CREATE_NO_WINDOW);
    cmd
}

#[cfg(not(target_os = "windows"))]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// Run `command` through the shell and wait up to `timeout` for it to exit.
///
/// Output is discarded. A command still running at the timeout is left
/// running and reported as a timeout.
pub async fn run_command(command: &str, timeout: Duration) -> Result<(), ActionError> {
    if command.trim().is_empty() {
        return Err(ActionError::new(
            ActionErrorCode::InvalidPayload,
            "command is empty",
        ));
    }

    let mut child = shell_command(command)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| {
            ActionError::new(
                ActionErrorCode::LaunchFailed,
                format!("failed to start '{}': {}", command, e),
            )
        })?;

    match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) if status.success() => Ok(()),
        Ok(Ok(status)) => Err(ActionError::new(
            ActionErrorCode::CommandFailed,
            format!("'{}' exited with {}", command, status),
        )),
        Ok(Err(e)) => Err(ActionError::new(
            ActionErrorCode::LaunchFailed,
            format!("failed to wait for '{}': {}", command, e),
        )),
        Err(_) => Err(ActionError::new(
            ActionErrorCode::Timeout,
            format!("'{}' still running after {:?}", command, timeout),
        )),
    }
}
