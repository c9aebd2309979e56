// Bg command: resume a stopped job in the background
use nix::sys::signal::Signal;
use std::io::{self, Write};

use crate::shell::commands::Executable;
use crate::shell::commands::builtins::common::{invalid_arguments, job_not_found, parse_job_id};
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult, stdout_err, sys};
use crate::shell::jobs::JobStatus;
use crate::shell::process;

pub struct BgCommand;

impl Executable for BgCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        let wording = ctx.config.policy.missing_job;
        let requested = match args {
            [_] => None,
            [_, id] => Some(parse_job_id(id).ok_or_else(|| invalid_arguments("bg"))?),
            _ => return Err(invalid_arguments("bg")),
        };

        let mut control = ctx.control();
        control.reap_finished()?;
        let record = match requested {
            Some(job_id) => {
                let record = control
                    .jobs
                    .lookup_by_job_id(job_id)
                    .ok_or_else(|| job_not_found("bg", job_id, wording))?;
                if record.status == JobStatus::Running {
                    return Err(ShellError::usage(format!(
                        "bg: job-id {} is already running in the background",
                        job_id
                    )));
                }
                record
            }
            None => control
                .jobs
                .most_recent_stopped()
                .ok_or_else(|| ShellError::usage("bg: there is no stopped jobs to resume"))?,
        };
        let (job_id, pid) = (record.job_id, record.pid);

        writeln!(io::stdout(), "{} : {}", record.command, pid).map_err(stdout_err)?;
        process::signal_job(pid, Signal::SIGCONT).map_err(sys("kill"))?;
        control.jobs.set_status(job_id, JobStatus::Running);
        Ok(0)
    }
}
