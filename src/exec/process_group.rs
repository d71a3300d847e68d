// src/exec/process_group.rs

//! Process-group ownership for interpreter runs.
//!
//! Each interpreter is started as the leader of a fresh process group, so
//! anything the script spawns (including `cmd &` background jobs) can be
//! killed together with it.

use std::io;

use tokio::process::{Child, Command};
use tracing::debug;

/// Put the child spawned by `cmd` in a new process group of its own.
pub fn isolate(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(not(unix))]
    let _ = cmd;
}

/// The process group led by a spawned interpreter.
///
/// Dropping an armed group kills every process still in it. Call
/// [`ProcessGroup::release`] once the run completed normally.
#[derive(Debug)]
pub struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    /// Group of a child spawned from a command passed through [`isolate`].
    pub fn of(child: &Child) -> Self {
        Self { pgid: child.id() }
    }

    /// SIGKILL every process in the group. Later calls are no-ops.
    pub fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };
        match kill_group(pgid) {
            Ok(()) => debug!(pgid, "killed plugin process group"),
            Err(e) if e.raw_os_error() == Some(ESRCH) => {
                debug!(pgid, "plugin process group already gone");
            }
            Err(e) => debug!(pgid, error = %e, "failed to kill plugin process group"),
        }
    }

    /// Disarm: leave whatever is left of the group alone.
    pub fn release(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
const ESRCH: i32 = libc::ESRCH;
#[cfg(not(unix))]
const ESRCH: i32 = 3;

#[cfg(unix)]
fn kill_group(pgid: u32) -> io::Result<()> {
    let pgid = libc::pid_t::try_from(pgid).map_err(io::Error::other)?;
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) -> io::Result<()> {
    // Only the direct child is killed there, through `kill_on_drop`.
    Ok(())
}
