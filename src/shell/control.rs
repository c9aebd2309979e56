use log::debug;
use nix::unistd::Pid;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::shell::ast::CommandRef;
use crate::shell::error::ShellResult;
use crate::shell::jobs::{JobId, JobTable};
use crate::shell::process::WaitOutcome;
use crate::shell::timeout::{AlarmTimer, InertAlarm, TimeoutRegistry};

/// Everything the signal thread and the main loop both touch.
pub struct JobControl {
    pub jobs: JobTable,
    pub timeouts: TimeoutRegistry,
}

pub type SharedControl = Arc<Mutex<JobControl>>;

/// A handler that panicked mid-update leaves the table usable; keep going with it.
pub fn lock(control: &SharedControl) -> MutexGuard<'_, JobControl> {
    control.lock().unwrap_or_else(PoisonError::into_inner)
}

impl JobControl {
    pub fn new(timer: Box<dyn AlarmTimer>) -> Self {
        Self {
            jobs: JobTable::new(),
            timeouts: TimeoutRegistry::new(timer),
        }
    }

    pub fn shared(self) -> SharedControl {
        Arc::new(Mutex::new(self))
    }

    /// Copy for a forked child: same jobs, no pending timeouts, no OS timer.
    pub fn detach(&self) -> Self {
        Self {
            jobs: self.jobs.detached(),
            timeouts: TimeoutRegistry::new(Box::new(InertAlarm)),
        }
    }

    /// Drops finished jobs along with any timeout still pointing at them.
    pub fn reap_finished(&mut self) -> ShellResult<Vec<Pid>> {
        let finished = self.jobs.reap_finished()?;
        for pid in &finished {
            self.timeouts.cancel(*pid);
        }
        Ok(finished)
    }

    pub fn register_background(&mut self, pid: Pid, command: CommandRef) -> ShellResult<Option<JobId>> {
        self.reap_finished()?;
        let added = self.jobs.add(pid, command, false, None)?;
        if added.is_none() {
            self.timeouts.cancel(pid);
        }
        Ok(added)
    }

    pub fn schedule_timeout(&mut self, pid: Pid, duration: Duration) -> ShellResult<()> {
        self.timeouts.schedule(pid, duration)
    }

    /// Settles the foreground slot after a wait on `pid` returned.
    pub fn finish_foreground(&mut self, pid: Pid, outcome: WaitOutcome) -> ShellResult<()> {
        match outcome {
            WaitOutcome::Stopped => {
                // A stop from outside the shell (kill -STOP from another terminal)
                // lands here instead of in the ctrl-Z handler.
                if let Some(job_id) = self.jobs.release_foreground(pid, true)? {
                    debug!("foreground {} stopped, now job [{}]", pid, job_id);
                }
            }
            WaitOutcome::Exited(_) | WaitOutcome::Gone => {
                self.jobs.release_foreground(pid, false)?;
                self.timeouts.cancel(pid);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::ast::CommandDescriptor;
    use crate::shell::process;
    use nix::sys::signal::Signal;
    use std::os::unix::process::CommandExt;
    use std::process::Command;
    use std::thread;

    fn cmd(text: &str) -> CommandRef {
        Arc::new(CommandDescriptor::parse(text).unwrap())
    }

    fn spawn(program: &str, args: &[&str]) -> Pid {
        let child = Command::new(program)
            .args(args)
            .process_group(0)
            .spawn()
            .unwrap();
        Pid::from_raw(child.id() as i32)
    }

    #[test]
    fn test_reap_cancels_stale_timeouts() {
        let mut control = JobControl::new(Box::new(InertAlarm));
        let quick = spawn("sleep", &["0.1"]);
        control.register_background(quick, cmd("sleep 0.1&")).unwrap();
        control.schedule_timeout(quick, Duration::from_secs(30)).unwrap();
        assert_eq!(control.timeouts.len(), 1);

        thread::sleep(Duration::from_millis(400));
        assert_eq!(control.reap_finished().unwrap(), vec![quick]);
        assert!(control.timeouts.is_empty());
        assert!(control.jobs.is_empty());
    }

    #[test]
    fn test_finish_foreground_stopped_demotes_to_table() {
        let mut control = JobControl::new(Box::new(InertAlarm));
        let pid = spawn("sleep", &["30"]);
        control.jobs.set_foreground(pid, cmd("sleep 30"), Some(6));

        control.finish_foreground(pid, WaitOutcome::Stopped).unwrap();
        assert!(control.jobs.foreground().is_none());
        assert_eq!(control.jobs.lookup_by_job_id(6).unwrap().pid, pid);

        control.jobs.kill_all().unwrap();
    }

    #[test]
    fn test_finish_foreground_exit_clears_slot_and_timeout() {
        let mut control = JobControl::new(Box::new(InertAlarm));
        let pid = spawn("sleep", &["30"]);
        control.jobs.set_foreground(pid, cmd("sleep 30"), None);
        control.schedule_timeout(pid, Duration::from_secs(30)).unwrap();

        process::signal_job(pid, Signal::SIGKILL).unwrap();
        process::reap(pid).unwrap();
        control.finish_foreground(pid, WaitOutcome::Exited(137)).unwrap();

        assert!(control.jobs.foreground().is_none());
        assert!(control.jobs.is_empty());
        assert!(control.timeouts.is_empty());
    }

    #[test]
    fn test_detach_keeps_jobs_drops_timeouts() {
        let mut control = JobControl::new(Box::new(InertAlarm));
        let pid = spawn("sleep", &["30"]);
        control.register_background(pid, cmd("sleep 30&")).unwrap();
        control.schedule_timeout(pid, Duration::from_secs(30)).unwrap();

        let snapshot = control.detach();
        assert_eq!(snapshot.jobs.len(), 1);
        assert!(snapshot.timeouts.is_empty());

        control.jobs.kill_all().unwrap();
    }

    #[test]
    fn test_detached_copy_does_not_reap_foreign_jobs() {
        let mut control = JobControl::new(Box::new(InertAlarm));
        let pid = spawn("sleep", &["30"]);
        control.register_background(pid, cmd("sleep 30&")).unwrap();

        // Same view a forked stage gets; its waitpid would fail with ECHILD.
        let mut snapshot = control.detach();
        assert!(snapshot.reap_finished().unwrap().is_empty());
        assert_eq!(snapshot.jobs.lookup_by_job_id(1).unwrap().pid, pid);

        control.jobs.kill_all().unwrap();
    }
}
