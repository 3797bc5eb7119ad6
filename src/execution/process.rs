//! Process-group spawning and termination.

use std::io;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, Command};
use tracing::debug;

use super::request::ExecutionRequest;

/// Spawn `shell shell_arg <command>` as the leader of a new process group.
pub fn spawn_in_group(
    shell: &Path,
    shell_arg: &str,
    request: &ExecutionRequest,
    working_dir: Option<&Path>,
) -> io::Result<Child> {
    let mut cmd = Command::new(shell);
    cmd.arg(shell_arg)
        .arg(request.command())
        .envs(request.env_vars())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    #[cfg(unix)]
    cmd.process_group(0);

    cmd.spawn()
}

/// Kills the child's process group unless disarmed.
///
/// The group id equals the leader's pid and stays valid until the leader is
/// reaped, so the guard must be disarmed once `wait` has returned.
pub struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl ProcessGroupGuard {
    pub fn new(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    /// Send SIGKILL to every process in the group.
    ///
    /// Falls back to killing the leader alone where process groups are not
    /// available.
    pub fn terminate(&mut self, child: &mut Child) {
        if let Some(pgid) = self.pgid {
            kill_group(pgid);
        }
        if let Err(e) = child.start_kill() {
            debug!(error = %e, "leader already gone");
        }
    }

    /// Forget the group after the leader has been reaped.
    pub fn disarm(&mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            debug!(pgid, "execution dropped before completion, killing process group");
            kill_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) => debug!(pgid, "sent SIGKILL to process group"),
        Err(e) => debug!(pgid, error = %e, "killpg failed"),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

/// Signal that terminated the process, if any.
#[cfg(unix)]
pub fn termination_signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
pub fn termination_signal(_status: &ExitStatus) -> Option<i32> {
    None
}
