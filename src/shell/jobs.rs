use chrono::{DateTime, Local};
use log::debug;
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::shell::ast::CommandRef;
use crate::shell::error::{ShellResult, sys};
use crate::shell::process;

pub type JobId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Stopped,
}

#[derive(Debug, Clone)]
pub struct JobRecord {
    pub job_id: JobId,
    pub pid: Pid,
    pub command: CommandRef,
    pub status: JobStatus,
    pub created_at: DateTime<Local>,
}

impl JobRecord {
    pub fn elapsed_secs(&self) -> i64 {
        (Local::now() - self.created_at).num_seconds().max(0)
    }
}

impl fmt::Display for JobRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} : {} {} secs",
            self.job_id,
            self.command,
            self.pid,
            self.elapsed_secs()
        )?;
        if self.status == JobStatus::Stopped {
            f.write_str(" (stopped)")?;
        }
        Ok(())
    }
}

/// The job currently blocking the main loop. Not listed by `jobs`.
#[derive(Debug, Clone)]
pub struct ForegroundJob {
    pub pid: Pid,
    pub command: CommandRef,
    /// Set when the job came from the table (`fg`), so stopping it again keeps its id.
    pub job_id: Option<JobId>,
}

/// Status lines produced by job-control transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    Killed(Pid),
    Stopped(Pid),
    TimedOut(String),
}

impl fmt::Display for JobEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobEvent::Killed(pid) => write!(f, "process {} was killed", pid),
            JobEvent::Stopped(pid) => write!(f, "process {} was stopped", pid),
            JobEvent::TimedOut(command) => write!(f, "{} timed out!", command),
        }
    }
}

/// Background and stopped jobs, indexed both ways, plus the foreground slot.
#[derive(Debug, Clone)]
pub struct JobTable {
    jobs: BTreeMap<JobId, JobRecord>,
    by_pid: HashMap<Pid, JobId>,
    foreground: Option<ForegroundJob>,
    /// False in a forked child's copy: the jobs belong to the shell, so waitpid
    /// cannot tell whether they finished.
    owns_children: bool,
}

impl Default for JobTable {
    fn default() -> Self {
        Self {
            jobs: BTreeMap::new(),
            by_pid: HashMap::new(),
            foreground: None,
            owns_children: true,
        }
    }
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view for a forked child. Records are kept as they were at fork time.
    pub fn detached(&self) -> Self {
        Self {
            owns_children: false,
            ..self.clone()
        }
    }

    /// Registers `pid` as a job. Returns `None` when the process has already terminated.
    ///
    /// An explicit `job_id` is honoured unless another live job holds it.
    pub fn add(
        &mut self,
        pid: Pid,
        command: CommandRef,
        stopped: bool,
        job_id: Option<JobId>,
    ) -> ShellResult<Option<JobId>> {
        self.reap_finished()?;

        if self.owns_children && process::has_exited(pid)? {
            debug!("not registering {}: already terminated", pid);
            return Ok(None);
        }
        if let Some(&existing) = self.by_pid.get(&pid) {
            return Ok(Some(existing));
        }

        let job_id = match job_id {
            Some(id) if !self.jobs.contains_key(&id) => id,
            _ => self.next_job_id(),
        };
        let status = if stopped { JobStatus::Stopped } else { JobStatus::Running };

        self.jobs.insert(
            job_id,
            JobRecord {
                job_id,
                pid,
                command,
                status,
                created_at: Local::now(),
            },
        );
        self.by_pid.insert(pid, job_id);
        debug!("job [{}] registered for {} ({:?})", job_id, pid, status);
        Ok(Some(job_id))
    }

    fn next_job_id(&self) -> JobId {
        self.jobs.keys().next_back().map_or(1, |max| max + 1)
    }

    pub fn lookup_by_job_id(&self, job_id: JobId) -> Option<&JobRecord> {
        self.jobs.get(&job_id)
    }

    pub fn lookup_by_process_id(&self, pid: Pid) -> Option<&JobRecord> {
        self.by_pid.get(&pid).and_then(|id| self.jobs.get(id))
    }

    pub fn remove_by_job_id(&mut self, job_id: JobId) -> Option<JobRecord> {
        let record = self.jobs.remove(&job_id)?;
        self.by_pid.remove(&record.pid);
        Some(record)
    }

    pub fn remove_by_process_id(&mut self, pid: Pid) -> Option<JobRecord> {
        let job_id = self.by_pid.remove(&pid)?;
        self.jobs.remove(&job_id)
    }

    pub fn set_status(&mut self, job_id: JobId, status: JobStatus) -> bool {
        match self.jobs.get_mut(&job_id) {
            Some(record) => {
                record.status = status;
                true
            }
            None => false,
        }
    }

    pub fn most_recent(&self) -> Option<&JobRecord> {
        self.jobs.values().next_back()
    }

    pub fn most_recent_stopped(&self) -> Option<&JobRecord> {
        self.jobs
            .values()
            .rev()
            .find(|record| record.status == JobStatus::Stopped)
    }

    /// Polls every tracked pid without blocking and drops the ones that exited.
    /// Returns the pids that were removed.
    pub fn reap_finished(&mut self) -> ShellResult<Vec<Pid>> {
        let mut finished = Vec::new();
        if !self.owns_children {
            return Ok(finished);
        }
        for &pid in self.by_pid.keys() {
            if process::has_exited(pid)? {
                finished.push(pid);
            }
        }
        for pid in &finished {
            if let Some(record) = self.remove_by_process_id(*pid) {
                debug!("job [{}] ({}) finished", record.job_id, pid);
            }
        }
        Ok(finished)
    }

    /// Jobs in ascending id order.
    pub fn list(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.values()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Command text for a pid, whether it sits in the table or in the foreground slot.
    pub fn command_for(&self, pid: Pid) -> Option<CommandRef> {
        if let Some(record) = self.lookup_by_process_id(pid) {
            return Some(record.command.clone());
        }
        self.foreground
            .as_ref()
            .filter(|fg| fg.pid == pid)
            .map(|fg| fg.command.clone())
    }

    pub fn foreground(&self) -> Option<&ForegroundJob> {
        self.foreground.as_ref()
    }

    pub fn set_foreground(&mut self, pid: Pid, command: CommandRef, job_id: Option<JobId>) {
        self.foreground = Some(ForegroundJob { pid, command, job_id });
    }

    pub fn clear_foreground(&mut self) {
        self.foreground = None;
    }

    /// Empties the slot if it still holds `pid`. A stopped process is demoted to the table.
    pub fn release_foreground(&mut self, pid: Pid, stopped: bool) -> ShellResult<Option<JobId>> {
        if !self.foreground.as_ref().is_some_and(|fg| fg.pid == pid) {
            return Ok(None);
        }
        let Some(fg) = self.foreground.take() else {
            return Ok(None);
        };
        if stopped {
            return self.add(fg.pid, fg.command, true, fg.job_id);
        }
        Ok(None)
    }

    pub fn kill_current_foreground(&mut self) -> ShellResult<Option<JobEvent>> {
        let Some(fg) = self.foreground.take() else {
            return Ok(None);
        };

        match process::signal_job(fg.pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(source) => {
                self.foreground = Some(fg);
                return Err(sys("kill")(source));
            }
        }
        process::reap(fg.pid)?;
        Ok(Some(JobEvent::Killed(fg.pid)))
    }

    pub fn stop_current_foreground(&mut self) -> ShellResult<Option<JobEvent>> {
        let Some(fg) = self.foreground.take() else {
            return Ok(None);
        };

        match process::signal_job(fg.pid, Signal::SIGSTOP) {
            Ok(()) => {}
            Err(Errno::ESRCH) => return Ok(None),
            Err(source) => {
                self.foreground = Some(fg);
                return Err(sys("kill")(source));
            }
        }
        let pid = fg.pid;
        self.add(pid, fg.command, true, fg.job_id)?;
        Ok(Some(JobEvent::Stopped(pid)))
    }

    /// Kills every remaining job and returns the records that were killed.
    pub fn kill_all(&mut self) -> ShellResult<Vec<JobRecord>> {
        self.reap_finished()?;

        let mut killed = Vec::with_capacity(self.jobs.len());
        while let Some((_, record)) = self.jobs.pop_first() {
            self.by_pid.remove(&record.pid);
            match process::signal_job(record.pid, Signal::SIGKILL) {
                Ok(()) => {
                    process::reap(record.pid)?;
                    killed.push(record);
                }
                Err(Errno::ESRCH) => process::reap(record.pid)?,
                Err(source) => return Err(sys("kill")(source)),
            }
        }
        Ok(killed)
    }
}
