use log::debug;
use nix::libc::STDOUT_FILENO;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use crate::shell::ast::{CommandExpr, CommandRef, RedirectMode};
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult};
use crate::shell::executor::run_to_completion;
use crate::shell::process;
use crate::shell::report_error;

/// `cmd > file` / `cmd >> file`. The child sits in the foreground slot while it runs.
pub fn run_redirect(
    cmd: &CommandRef,
    inner: &CommandExpr,
    target: &Path,
    mode: RedirectMode,
    ctx: &ShellContext,
) -> ShellResult<i32> {
    let file = open_target(target, mode)?;
    let fd = file.as_raw_fd();

    let pid = process::fork_child(ctx, |child| {
        if let Err(err) = process::attach_fd(fd, STDOUT_FILENO, &[fd]) {
            report_error(&err);
            return 1;
        }
        run_to_completion(inner, child)
    })?;
    drop(file);

    debug!("redirect {} -> {}", pid, target.display());
    process::run_in_foreground(ctx, pid, cmd.clone(), None)
}

fn open_target(target: &Path, mode: RedirectMode) -> ShellResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).mode(0o666);
    match mode {
        RedirectMode::Overwrite => options.truncate(true),
        RedirectMode::Append => options.append(true),
    };
    options
        .open(target)
        .map_err(|err| ShellError::io(format!("open {}", target.display()), err))
}
