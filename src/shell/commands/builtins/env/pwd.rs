// Pwd command
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult, stdout_err};
use std::env;
use std::io::{self, Write};

pub struct PwdCommand;

impl Executable for PwdCommand {
    fn execute(&self, _args: &[String], _ctx: &mut ShellContext) -> ShellResult<i32> {
        let cwd = env::current_dir().map_err(|err| ShellError::io("pwd", err))?;
        writeln!(io::stdout(), "{}", cwd.display()).map_err(stdout_err)?;
        Ok(0)
    }
}
