use log::debug;
use nix::libc::{STDERR_FILENO, STDIN_FILENO, STDOUT_FILENO};
use nix::unistd::{self, Pid};
use std::os::fd::AsRawFd;
use std::thread;
use std::time::Duration;

use crate::shell::ast::{CommandExpr, CommandRef, PipeStream};
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellResult, sys};
use crate::shell::executor::run_to_completion;
use crate::shell::process;
use crate::shell::report_error;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// `source | dest` or `source |& dest`. Returns the destination's status once both stages exit.
///
/// From the prompt, both stages run under one forked leader that sits in the foreground
/// slot, so ctrl-C and ctrl-Z reach the whole pipeline through its process group.
pub fn run_pipeline(
    cmd: &CommandRef,
    source: &CommandExpr,
    dest: &CommandExpr,
    stream: PipeStream,
    ctx: &ShellContext,
) -> ShellResult<i32> {
    if ctx.is_nested() {
        return run_stages(source, dest, stream, ctx);
    }

    let leader = process::fork_child(ctx, |child| match run_stages(source, dest, stream, child) {
        Ok(status) => status,
        Err(err) => {
            report_error(&err);
            1
        }
    })?;
    debug!("pipeline leader {}", leader);
    process::run_in_foreground(ctx, leader, cmd.clone(), None)
}

/// Forks both stages into the current process group and waits for them.
fn run_stages(
    source: &CommandExpr,
    dest: &CommandExpr,
    stream: PipeStream,
    ctx: &ShellContext,
) -> ShellResult<i32> {
    let (read_end, write_end) = unistd::pipe().map_err(sys("pipe"))?;
    let (read_fd, write_fd) = (read_end.as_raw_fd(), write_end.as_raw_fd());
    let feed = match stream {
        PipeStream::Stdout => STDOUT_FILENO,
        PipeStream::Stderr => STDERR_FILENO,
    };

    let source_pid = process::fork_child(ctx, |child| {
        if let Err(err) = process::attach_fd(write_fd, feed, &[read_fd, write_fd]) {
            report_error(&err);
            return 1;
        }
        run_to_completion(source, child)
    })?;

    let dest_pid = process::fork_child(ctx, |child| {
        if let Err(err) = process::attach_fd(read_fd, STDIN_FILENO, &[read_fd, write_fd]) {
            report_error(&err);
            return 1;
        }
        run_to_completion(dest, child)
    });

    // The parent keeps neither end, or dest would never see EOF.
    drop(read_end);
    drop(write_end);

    let dest_pid = match dest_pid {
        Ok(pid) => pid,
        Err(err) => {
            process::reap(source_pid)?;
            return Err(err);
        }
    };
    debug!("pipeline {} -> {}", source_pid, dest_pid);
    wait_both(source_pid, dest_pid)
}

fn wait_both(source: Pid, dest: Pid) -> ShellResult<i32> {
    let mut source_done = false;
    let mut dest_status = None;
    loop {
        if !source_done {
            source_done = process::poll_status(source)?.is_some();
        }
        if dest_status.is_none() {
            dest_status = process::poll_status(dest)?;
        }
        if let (true, Some(status)) = (source_done, dest_status) {
            return Ok(status);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
