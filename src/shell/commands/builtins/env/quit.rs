// Quit command
use log::info;
use std::io::{self, Write};

use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellResult, stdout_err};
use crate::shell::jobs::JobRecord;
use crate::shell::MSG_PREFIX;

pub struct QuitCommand;

/// Lists the jobs `quit kill` actually signalled.
pub fn announce_killed(records: &[JobRecord], out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}sending SIGKILL signal to {} jobs:", MSG_PREFIX, records.len())?;
    for record in records {
        writeln!(out, "{}: {}", record.pid, record.command)?;
    }
    Ok(())
}

impl Executable for QuitCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        if args.get(1).is_some_and(|arg| arg == "kill") {
            let killed = ctx.control().jobs.kill_all()?;
            info!("killed {} jobs on quit", killed.len());
            announce_killed(&killed, &mut io::stdout().lock()).map_err(stdout_err)?;
        }
        ctx.quit = true;
        Ok(0)
    }
}
