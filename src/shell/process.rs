// Process lifecycle: fork into a fresh process group, wait, signal.

use log::debug;
use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::{self, ForkResult, Pid, fork, setpgid};
use std::os::fd::RawFd;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};

use crate::shell::ast::CommandRef;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult, sys};
use crate::shell::jobs::JobId;

/// Signals the shell handles itself; children get the default disposition back.
const HANDLED_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTSTP, Signal::SIGALRM];

/// How a foreground wait ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WaitOutcome {
    Exited(i32),
    Stopped,
    /// Collected by a signal handler before the main loop got to it.
    Gone,
}

impl WaitOutcome {
    pub fn status(self) -> i32 {
        match self {
            WaitOutcome::Exited(code) => code,
            WaitOutcome::Stopped => 128 + Signal::SIGTSTP as i32,
            WaitOutcome::Gone => 128 + Signal::SIGKILL as i32,
        }
    }
}

/// Forks a child that runs `body` against a detached copy of the shell state and exits
/// with its return value. Never returns in the child.
///
/// Top-level children lead their own process group; children forked from inside another
/// child stay in that child's group so the whole job can be signalled at once.
pub fn fork_child<F>(ctx: &ShellContext, body: F) -> ShellResult<Pid>
where
    F: FnOnce(&mut ShellContext) -> i32,
{
    let _ = io::stdout().flush();

    // Held across fork so the child never sees a half-applied update from the signal thread.
    let control = ctx.control();

    // SAFETY: the child only touches its own snapshot of the shell state, then exits.
    match unsafe { fork() }.map_err(sys("fork"))? {
        ForkResult::Parent { child } => {
            if !ctx.is_nested() {
                // Also done in the child; whichever runs first wins the race.
                if let Err(err) = setpgid(child, child) {
                    debug!("setpgid({}) from parent: {}", child, err);
                }
            }
            drop(control);
            debug!("forked child {}", child);
            Ok(child)
        }
        ForkResult::Child => {
            let snapshot = control.detach();
            std::mem::forget(control);

            if !ctx.is_nested() {
                let _ = setpgid(Pid::from_raw(0), Pid::from_raw(0));
            }
            restore_default_signals();

            let mut child_ctx = ctx.for_child(snapshot);
            let code = panic::catch_unwind(AssertUnwindSafe(|| body(&mut child_ctx))).unwrap_or(1);
            let _ = io::stdout().flush();
            std::process::exit(code)
        }
    }
}

fn restore_default_signals() {
    let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for sig in HANDLED_SIGNALS {
        // SAFETY: installing SIG_DFL has no handler code to run.
        let _ = unsafe { signal::sigaction(sig, &default) };
    }
}

fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, sig, _) => Some(128 + sig as i32),
        _ => None,
    }
}

/// Blocks until `pid` exits or stops.
pub fn wait_foreground(pid: Pid) -> ShellResult<WaitOutcome> {
    loop {
        match waitpid(pid, Some(WaitPidFlag::WUNTRACED)) {
            Ok(WaitStatus::Stopped(..)) => return Ok(WaitOutcome::Stopped),
            Ok(status) => {
                if let Some(code) = exit_code(status) {
                    return Ok(WaitOutcome::Exited(code));
                }
            }
            Err(Errno::EINTR) => continue,
            Err(Errno::ECHILD) => return Ok(WaitOutcome::Gone),
            Err(source) => return Err(sys("waitpid")(source)),
        }
    }
}

/// Blocks until `pid` exits and returns its shell-style status.
pub fn wait_for_exit(pid: Pid) -> ShellResult<i32> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                if let Some(code) = exit_code(status) {
                    return Ok(code);
                }
            }
            Err(Errno::EINTR) => continue,
            Err(source) => return Err(sys("waitpid")(source)),
        }
    }
}

/// Collects a process that was just killed. A child someone else already collected is fine.
pub fn reap(pid: Pid) -> ShellResult<()> {
    match wait_for_exit(pid) {
        Ok(_) => Ok(()),
        Err(ShellError::System { source: Errno::ECHILD, .. }) => Ok(()),
        Err(err) => Err(err),
    }
}

/// Non-blocking status check: `Some(status)` once the child has exited (and is reaped).
pub fn poll_status(pid: Pid) -> ShellResult<Option<i32>> {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(status) => Ok(exit_code(status)),
        Err(source) => Err(sys("waitpid")(source)),
    }
}

/// Non-blocking: true if `pid` has terminated or is no longer our child.
pub fn has_exited(pid: Pid) -> ShellResult<bool> {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(status) => Ok(exit_code(status).is_some()),
        Err(Errno::ECHILD) => Ok(true),
        Err(source) => Err(sys("waitpid")(source)),
    }
}

/// Child-side plumbing: makes `onto` refer to `fd`, then closes the originals.
pub fn attach_fd(fd: RawFd, onto: RawFd, originals: &[RawFd]) -> ShellResult<()> {
    unistd::dup2(fd, onto).map_err(sys("dup2"))?;
    for &original in originals {
        if original != onto {
            let _ = unistd::close(original);
        }
    }
    Ok(())
}

/// Every job leads its own process group, so this reaches the whole job.
pub fn signal_job(pid: Pid, sig: Signal) -> nix::Result<()> {
    debug!("sending {} to group {}", sig, pid);
    signal::killpg(pid, sig)
}

/// Installs `pid` in the foreground slot and blocks on it.
pub fn run_in_foreground(
    ctx: &ShellContext,
    pid: Pid,
    command: CommandRef,
    job_id: Option<JobId>,
) -> ShellResult<i32> {
    ctx.control().jobs.set_foreground(pid, command, job_id);
    wait_in_foreground(ctx, pid)
}

/// Waits on the process already installed in the foreground slot, then releases the slot.
pub fn wait_in_foreground(ctx: &ShellContext, pid: Pid) -> ShellResult<i32> {
    let outcome = wait_foreground(pid);
    let mut control = ctx.control();
    match outcome {
        Ok(outcome) => {
            control.finish_foreground(pid, outcome)?;
            Ok(outcome.status())
        }
        Err(err) => {
            control.jobs.release_foreground(pid, false)?;
            Err(err)
        }
    }
}
