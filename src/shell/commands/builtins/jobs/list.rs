// Jobs command
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellResult, stdout_err};
use std::io::{self, Write};

pub struct JobsCommand;

impl Executable for JobsCommand {
    fn execute(&self, _args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        let mut control = ctx.control();
        control.reap_finished()?;
        let mut out = io::stdout().lock();
        for record in control.jobs.list() {
            writeln!(out, "{}", record).map_err(stdout_err)?;
        }
        Ok(0)
    }
}
