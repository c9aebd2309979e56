use crate::config::MissingJobWording;
use crate::shell::error::ShellError;
use crate::shell::jobs::JobId;

pub fn parse_job_id(arg: &str) -> Option<JobId> {
    arg.parse().ok()
}

pub fn invalid_arguments(cmd: &str) -> ShellError {
    ShellError::usage(format!("{}: invalid arguments", cmd))
}

pub fn job_not_found(cmd: &str, job_id: JobId, wording: MissingJobWording) -> ShellError {
    match wording {
        MissingJobWording::Specific => {
            ShellError::usage(format!("{}: job-id {} does not exist", cmd, job_id))
        }
        MissingJobWording::Uniform => no_such_job(cmd),
    }
}

pub fn empty_table(cmd: &str, wording: MissingJobWording) -> ShellError {
    match wording {
        MissingJobWording::Specific => ShellError::usage(format!("{}: jobs list is empty", cmd)),
        MissingJobWording::Uniform => no_such_job(cmd),
    }
}

fn no_such_job(cmd: &str) -> ShellError {
    ShellError::usage(format!("{}: no such job", cmd))
}
