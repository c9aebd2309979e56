use log::debug;
use nix::unistd::Pid;

use crate::shell::ast::{CommandDescriptor, CommandExpr};
use crate::shell::commands::system::spawn_external;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult};
use crate::shell::pipeline::run_pipeline;
use crate::shell::process;
use crate::shell::redirect::run_redirect;
use crate::shell::report_error;

/// What executing an expression left behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Launch {
    /// A child is running; the caller waits on it or registers it as a job.
    Spawned(Pid),
    /// Already finished with this status.
    Waited(i32),
}

pub fn execute_expr(expr: &CommandExpr, ctx: &mut ShellContext) -> ShellResult<Launch> {
    match expr {
        CommandExpr::Builtin(cmd) => run_builtin(cmd, ctx).map(Launch::Waited),
        CommandExpr::External(cmd) => spawn_external(cmd, ctx).map(Launch::Spawned),
        CommandExpr::Pipe { cmd, source, dest, stream } => {
            run_pipeline(cmd, source, dest, *stream, ctx).map(Launch::Waited)
        }
        CommandExpr::Redirect { cmd, inner, target, mode } => {
            run_redirect(cmd, inner, target, *mode, ctx).map(Launch::Waited)
        }
        CommandExpr::Timeout { duration, inner, .. } => {
            let pid = match inner.as_ref() {
                CommandExpr::External(cmd) => spawn_external(cmd, ctx)?,
                // Composites get a wrapper process so the whole thing has one pid to kill.
                other => process::fork_child(ctx, |child| run_to_completion(other, child))?,
            };
            ctx.control().schedule_timeout(pid, *duration)?;
            Ok(Launch::Spawned(pid))
        }
    }
}

fn run_builtin(cmd: &CommandDescriptor, ctx: &mut ShellContext) -> ShellResult<i32> {
    let registry = ctx.registry.clone();
    let builtin = registry
        .get(cmd.name())
        .ok_or_else(|| ShellError::usage(format!("{}: not a built-in", cmd.name())))?;
    debug!("builtin {}", cmd.name());
    builtin.execute(cmd.args(), ctx)
}

/// Runs `expr` and waits for whatever it spawned. Used inside forked children,
/// where there is no job table to hand a pid to.
pub fn run_to_completion(expr: &CommandExpr, ctx: &mut ShellContext) -> i32 {
    let result = execute_expr(expr, ctx).and_then(|launch| match launch {
        Launch::Waited(code) => Ok(code),
        Launch::Spawned(pid) => process::wait_for_exit(pid),
    });
    match result {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    }
}
