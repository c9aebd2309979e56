// Fg command: resume a job and wait for it
use log::debug;
use nix::sys::signal::Signal;
use std::io::{self, Write};

use crate::shell::commands::Executable;
use crate::shell::commands::builtins::common::{empty_table, invalid_arguments, job_not_found, parse_job_id};
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellResult, stdout_err, sys};
use crate::shell::process;

pub struct FgCommand;

impl Executable for FgCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        let wording = ctx.config.policy.missing_job;
        let requested = match args {
            [_] => None,
            [_, id] => Some(parse_job_id(id).ok_or_else(|| invalid_arguments("fg"))?),
            _ => return Err(invalid_arguments("fg")),
        };

        let pid = {
            let mut control = ctx.control();
            control.reap_finished()?;
            let record = match requested {
                Some(job_id) => control
                    .jobs
                    .lookup_by_job_id(job_id)
                    .ok_or_else(|| job_not_found("fg", job_id, wording))?,
                None => control.jobs.most_recent().ok_or_else(|| empty_table("fg", wording))?,
            };
            let (job_id, pid) = (record.job_id, record.pid);

            writeln!(io::stdout(), "{} : {}", record.command, pid).map_err(stdout_err)?;
            let Some(record) = control.jobs.remove_by_job_id(job_id) else {
                return Err(job_not_found("fg", job_id, wording));
            };
            control.jobs.set_foreground(pid, record.command, Some(job_id));
            if let Err(source) = process::signal_job(pid, Signal::SIGCONT) {
                control.jobs.clear_foreground();
                return Err(sys("kill")(source));
            }
            debug!("job [{}] ({}) moved to foreground", job_id, pid);
            pid
        };

        process::wait_in_foreground(ctx, pid)
    }
}
