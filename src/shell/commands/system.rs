// External commands: handed to the interpreter as `<interpreter> -c <text>`
use log::debug;
use nix::unistd::{self, Pid};
use std::ffi::CString;

use crate::shell::ERROR_PREFIX;
use crate::shell::ast::CommandDescriptor;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult};
use crate::shell::process;

/// Exit status of a child whose exec failed.
const EXEC_FAILED: i32 = 1;

/// Forks and execs without waiting. The caller decides foreground or background.
pub fn spawn_external(cmd: &CommandDescriptor, ctx: &ShellContext) -> ShellResult<Pid> {
    // Built before fork so the child does no allocation before exec.
    let argv = [ctx.interpreter.as_str(), "-c", cmd.line()]
        .into_iter()
        .map(CString::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ShellError::usage(format!("{}: argument contains a NUL byte", cmd.name())))?;

    debug!("exec {} -c {:?}", ctx.interpreter, cmd.line());
    process::fork_child(ctx, |_| match unistd::execvp(&argv[0], &argv) {
        Ok(never) => match never {},
        Err(err) => {
            eprintln!("{}execvp failed: {}", ERROR_PREFIX, err);
            EXEC_FAILED
        }
    })
}
