use log::debug;
use nix::errno::Errno;
use nix::libc;
use nix::unistd::Pid;
use std::time::{Duration, Instant};

use crate::shell::error::{ShellResult, sys};

/// Alarms fire on whole-microsecond boundaries; anything this close counts as due.
const EXPIRY_SLACK: Duration = Duration::from_millis(5);

/// The OS timer that raises SIGALRM for the earliest deadline.
pub trait AlarmTimer: Send {
    fn arm(&mut self, after: Duration) -> ShellResult<()>;
    fn disarm(&mut self) -> ShellResult<()>;
}

/// `ITIMER_REAL`, one shot.
pub struct SystemAlarm;

impl SystemAlarm {
    fn set(after: Duration) -> ShellResult<()> {
        let value = libc::itimerval {
            it_interval: libc::timeval { tv_sec: 0, tv_usec: 0 },
            it_value: libc::timeval {
                tv_sec: after.as_secs() as libc::time_t,
                tv_usec: after.subsec_micros() as libc::suseconds_t,
            },
        };
        // SAFETY: `value` outlives the call and the previous value is not requested.
        let rc = unsafe { libc::setitimer(libc::ITIMER_REAL, &value, std::ptr::null_mut()) };
        Errno::result(rc).map(drop).map_err(sys("setitimer"))
    }
}

impl AlarmTimer for SystemAlarm {
    fn arm(&mut self, after: Duration) -> ShellResult<()> {
        // A zero it_value would disarm instead.
        let after = after.max(Duration::from_micros(1));
        debug!("alarm armed for {:?}", after);
        Self::set(after)
    }

    fn disarm(&mut self) -> ShellResult<()> {
        debug!("alarm disarmed");
        Self::set(Duration::ZERO)
    }
}

/// For detached copies of the shell state (forked children): never touches the OS timer.
pub struct InertAlarm;

impl AlarmTimer for InertAlarm {
    fn arm(&mut self, _after: Duration) -> ShellResult<()> {
        Ok(())
    }

    fn disarm(&mut self) -> ShellResult<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeoutEntry {
    pub pid: Pid,
    pub registered_at: Instant,
    pub expires_at: Instant,
}

/// Pending timeouts, earliest first.
pub struct TimeoutRegistry {
    entries: Vec<TimeoutEntry>,
    timer: Box<dyn AlarmTimer>,
}

impl TimeoutRegistry {
    pub fn new(timer: Box<dyn AlarmTimer>) -> Self {
        Self {
            entries: Vec::new(),
            timer,
        }
    }

    pub fn schedule(&mut self, pid: Pid, duration: Duration) -> ShellResult<()> {
        let now = Instant::now();
        let entry = TimeoutEntry {
            pid,
            registered_at: now,
            expires_at: now + duration,
        };
        // Equal deadlines keep registration order.
        let index = self
            .entries
            .partition_point(|existing| existing.expires_at <= entry.expires_at);
        self.entries.insert(index, entry);
        debug!("timeout for {} in {:?}", pid, duration);

        if index == 0 {
            self.timer.arm(duration)?;
        }
        Ok(())
    }

    /// Removes and returns the earliest pid whose deadline has passed.
    pub fn pop_expired(&mut self) -> Option<Pid> {
        let first = self.entries.first()?;
        if first.expires_at > Instant::now() + EXPIRY_SLACK {
            return None;
        }
        Some(self.entries.remove(0).pid)
    }

    /// Points the OS timer at the next deadline, or switches it off.
    pub fn arm_next(&mut self) -> ShellResult<()> {
        match self.entries.first() {
            Some(next) => {
                let remaining = next.expires_at.saturating_duration_since(Instant::now());
                self.timer.arm(remaining)
            }
            None => self.timer.disarm(),
        }
    }

    /// Forgets a process that ended on its own. The timer is left alone;
    /// a spurious alarm finds nothing due and re-arms.
    pub fn cancel(&mut self, pid: Pid) {
        self.entries.retain(|entry| entry.pid != pid);
    }

    pub fn entries(&self) -> &[TimeoutEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
