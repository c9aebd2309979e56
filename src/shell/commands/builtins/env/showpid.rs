// Showpid command
use crate::shell::SHELL_NAME;
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellResult, stdout_err};
use std::io::{self, Write};

pub struct ShowpidCommand;

impl Executable for ShowpidCommand {
    fn execute(&self, _args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        writeln!(io::stdout(), "{} pid is {}", SHELL_NAME, ctx.shell_pid).map_err(stdout_err)?;
        Ok(0)
    }
}
