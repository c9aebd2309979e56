use log::{debug, warn};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use signal_hook::consts::signal::{SIGALRM, SIGINT, SIGTSTP};
use signal_hook::iterator::Signals;
use std::thread::{self, JoinHandle};

use crate::shell::control::{self, JobControl, SharedControl};
use crate::shell::error::{ShellError, ShellResult, sys};
use crate::shell::jobs::JobEvent;
use crate::shell::process;
use crate::shell::{MSG_PREFIX, report_error};

/// Starts the thread that turns ctrl-Z, ctrl-C and timer expiry into job-control actions.
/// Signals are handled one at a time, each with the job state locked throughout.
pub fn spawn_signal_controller(shared: SharedControl) -> ShellResult<JoinHandle<()>> {
    let mut signals = Signals::new([SIGTSTP, SIGINT, SIGALRM])
        .map_err(|err| ShellError::io("register signal handlers", err))?;

    thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                let mut guard = control::lock(&shared);
                let result = match signal {
                    SIGTSTP => {
                        println!("{}got ctrl-Z", MSG_PREFIX);
                        on_stop(&mut guard)
                    }
                    SIGINT => {
                        println!("{}got ctrl-C", MSG_PREFIX);
                        on_interrupt(&mut guard)
                    }
                    SIGALRM => {
                        println!("{}got an alarm", MSG_PREFIX);
                        on_alarm(&mut guard)
                    }
                    other => {
                        warn!("unexpected signal {}", other);
                        Ok(Vec::new())
                    }
                };
                match result {
                    Ok(events) => {
                        for event in events {
                            println!("{}{}", MSG_PREFIX, event);
                        }
                    }
                    Err(err) => report_error(&err),
                }
            }
        })
        .map_err(|err| ShellError::io("spawn signal thread", err))
}

pub fn on_stop(control: &mut JobControl) -> ShellResult<Vec<JobEvent>> {
    Ok(control.jobs.stop_current_foreground()?.into_iter().collect())
}

pub fn on_interrupt(control: &mut JobControl) -> ShellResult<Vec<JobEvent>> {
    let event = control.jobs.kill_current_foreground()?;
    if let Some(JobEvent::Killed(pid)) = &event {
        control.timeouts.cancel(*pid);
    }
    Ok(event.into_iter().collect())
}

/// Kills every process whose timeout has passed, then re-arms for the next one.
pub fn on_alarm(control: &mut JobControl) -> ShellResult<Vec<JobEvent>> {
    let mut events = Vec::new();
    let fired = kill_expired(control, &mut events);
    control.timeouts.arm_next()?;
    fired.map(|()| events)
}

fn kill_expired(control: &mut JobControl, events: &mut Vec<JobEvent>) -> ShellResult<()> {
    while let Some(pid) = control.timeouts.pop_expired() {
        control.reap_finished()?;
        let command = control
            .jobs
            .command_for(pid)
            .map_or_else(|| pid.to_string(), |cmd| cmd.raw().to_string());

        match process::signal_job(pid, Signal::SIGKILL) {
            Ok(()) => events.push(JobEvent::TimedOut(command)),
            Err(Errno::ESRCH) => debug!("timeout for {}: already gone", pid),
            Err(source) => return Err(sys("kill")(source)),
        }
    }
    Ok(())
}
