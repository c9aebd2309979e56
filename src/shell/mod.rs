pub mod ast;
pub mod commands;
pub mod context;
pub mod control;
pub mod error;
pub mod executor;
pub mod jobs;
pub mod parser;
pub mod pipeline;
pub mod process;
pub mod redirect;
pub mod signals;
pub mod timeout;

use colored::*;
use log::debug;

use context::ShellContext;
use error::{ShellError, ShellResult};
use executor::{Launch, execute_expr};

#[cfg(test)]
mod tests;

pub const SHELL_NAME: &str = "jobsh";
pub const MSG_PREFIX: &str = "jobsh: ";
pub const ERROR_PREFIX: &str = "jobsh error: ";

pub fn report_error(err: &ShellError) {
    if !err.is_usage() {
        debug!("{:?}", err);
    }
    eprintln!("{}", format!("{}{}", ERROR_PREFIX, err).red());
}

/// Parses and runs one line. Background jobs are registered; anything else is waited for.
pub fn run_command_line(line: &str, ctx: &mut ShellContext) -> ShellResult<i32> {
    let Some(expr) = parser::parse_command_line(line, ctx)? else {
        return Ok(ctx.exit_code);
    };

    let code = match execute_expr(&expr, ctx)? {
        Launch::Waited(code) => code,
        Launch::Spawned(pid) => {
            let command = expr.descriptor().clone();
            if expr.runs_in_background() {
                let job_id = ctx.control().register_background(pid, command)?;
                debug!("background {} as job {:?}", pid, job_id);
                0
            } else {
                process::run_in_foreground(ctx, pid, command, None)?
            }
        }
    };
    ctx.exit_code = code;
    Ok(code)
}
