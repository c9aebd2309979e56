// Kill command: deliver a signal to a job's process group
use nix::sys::signal::Signal;
use std::io::{self, Write};

use crate::shell::commands::Executable;
use crate::shell::commands::builtins::common::{invalid_arguments, job_not_found, parse_job_id};
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellResult, stdout_err, sys};
use crate::shell::jobs::JobStatus;
use crate::shell::process;

pub struct KillCommand;

/// `-9` -> SIGKILL. Anything that is not a known signal number is rejected.
pub fn parse_signal(arg: &str) -> Option<(i32, Signal)> {
    let number: i32 = arg.strip_prefix('-')?.parse().ok()?;
    Signal::try_from(number).ok().map(|sig| (number, sig))
}

impl Executable for KillCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        let wording = ctx.config.policy.missing_job;
        let [_, sig_arg, id_arg] = args else {
            return Err(invalid_arguments("kill"));
        };
        let (number, signal) = parse_signal(sig_arg).ok_or_else(|| invalid_arguments("kill"))?;
        let job_id = parse_job_id(id_arg).ok_or_else(|| invalid_arguments("kill"))?;

        let mut control = ctx.control();
        control.reap_finished()?;
        let pid = control
            .jobs
            .lookup_by_job_id(job_id)
            .map(|record| record.pid)
            .ok_or_else(|| job_not_found("kill", job_id, wording))?;

        process::signal_job(pid, signal).map_err(sys("kill"))?;
        writeln!(io::stdout(), "signal number {} was sent to pid {}", number, pid).map_err(stdout_err)?;

        match signal {
            Signal::SIGSTOP | Signal::SIGTSTP | Signal::SIGTTIN | Signal::SIGTTOU => {
                control.jobs.set_status(job_id, JobStatus::Stopped);
            }
            Signal::SIGCONT => {
                control.jobs.set_status(job_id, JobStatus::Running);
            }
            _ => {}
        }
        Ok(0)
    }
}
