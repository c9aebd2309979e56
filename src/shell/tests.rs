use nix::sys::signal::Signal;
use nix::unistd::Pid;
use std::fs;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::{MissingJobWording, ShellConfig};
use crate::shell::ast::CommandDescriptor;
use crate::shell::context::{ShellContext, test_context, test_context_with};
use crate::shell::control::{self, JobControl};
use crate::shell::error::ShellResult;
use crate::shell::jobs::JobEvent;
use crate::shell::process;
use crate::shell::run_command_line;
use crate::shell::signals::{on_alarm, on_interrupt, on_stop};
use crate::shell::timeout::testing::{RecordingTimer, TimerCall};

fn path_arg(path: &std::path::Path) -> String {
    path.to_string_lossy().into_owned()
}

type Handler = fn(&mut JobControl) -> ShellResult<Vec<JobEvent>>;

/// Runs `line` while another thread applies `handler` to the shared job state, the way
/// the signal thread does. Returns the status, the pid that held the foreground slot,
/// the handler's events and how long the line took.
fn signal_while_running(
    line: &str,
    ctx: &mut ShellContext,
    handler: Handler,
) -> (i32, Option<Pid>, Vec<JobEvent>, Duration) {
    let shared = ctx.shared_control();
    let signaller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        let mut control = control::lock(&shared);
        let pid = control.jobs.foreground().map(|fg| fg.pid);
        (pid, handler(&mut control).unwrap())
    });

    let started = Instant::now();
    let status = run_command_line(line, ctx).unwrap();
    let elapsed = started.elapsed();
    let (pid, events) = signaller.join().unwrap();
    (status, pid, events, elapsed)
}

#[test]
fn test_external_command_status() {
    let mut ctx = test_context();
    assert_eq!(run_command_line("true", &mut ctx).unwrap(), 0);
    assert_eq!(run_command_line("exit 3", &mut ctx).unwrap(), 3);
    assert_eq!(ctx.exit_code, 3);
    // Blank lines keep the last status.
    assert_eq!(run_command_line("   ", &mut ctx).unwrap(), 3);
}

#[test]
fn test_pipeline_into_wc() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("count.txt");
    let mut ctx = test_context();

    let line = format!("printf 'a\\nb\\nc\\n' | wc -l > {}", path_arg(&out));
    assert_eq!(run_command_line(&line, &mut ctx).unwrap(), 0);
    assert_eq!(fs::read_to_string(&out).unwrap().trim(), "3");
    assert!(ctx.control().jobs.foreground().is_none());
}

#[test]
fn test_stderr_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("err.txt");
    let mut ctx = test_context();

    // cat's complaint goes to stderr, which is what `|&` feeds forward.
    let line = format!("cat /nonexistent/jobsh-input |& wc -l > {}", path_arg(&out));
    run_command_line(&line, &mut ctx).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap().trim(), "1");
}

#[test]
fn test_pipeline_status_is_destination_status() {
    let mut ctx = test_context();
    assert_eq!(run_command_line("true | false", &mut ctx).unwrap(), 1);
    assert_eq!(run_command_line("false | true", &mut ctx).unwrap(), 0);
}

#[test]
fn test_truncate_then_append() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("log.txt");
    fs::write(&out, "old content\n").unwrap();
    let mut ctx = test_context();

    run_command_line(&format!("echo first > {}", path_arg(&out)), &mut ctx).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "first\n");

    run_command_line(&format!("echo second >> {}", path_arg(&out)), &mut ctx).unwrap();
    assert_eq!(fs::read_to_string(&out).unwrap(), "first\nsecond\n");
}

#[test]
fn test_redirect_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("missing").join("out.txt");
    let mut ctx = test_context();

    let err = run_command_line(&format!("echo hi > {}", path_arg(&out)), &mut ctx).unwrap_err();
    assert!(!err.is_usage());
}

#[test]
fn test_background_job_is_registered() {
    let mut ctx = test_context();
    assert_eq!(run_command_line("sleep 30 &", &mut ctx).unwrap(), 0);

    {
        let control = ctx.control();
        let record = control.jobs.lookup_by_job_id(1).unwrap();
        assert_eq!(record.command.raw(), "sleep 30 &");
        assert!(control.jobs.foreground().is_none());
    }

    run_command_line("sleep 30&", &mut ctx).unwrap();
    assert_eq!(ctx.control().jobs.most_recent().unwrap().job_id, 2);

    assert_eq!(ctx.control().jobs.kill_all().unwrap().len(), 2);
}

#[test]
fn test_bg_and_kill_move_job_state() {
    let mut ctx = test_context();
    run_command_line("sleep 30&", &mut ctx).unwrap();

    let stop = format!("kill -{} 1", Signal::SIGSTOP as i32);
    run_command_line(&stop, &mut ctx).unwrap();
    assert_eq!(
        ctx.control().jobs.most_recent_stopped().map(|r| r.job_id),
        Some(1)
    );

    let err = run_command_line("bg 2", &mut ctx).unwrap_err();
    assert_eq!(err.to_string(), "bg: job-id 2 does not exist");

    run_command_line("bg", &mut ctx).unwrap();
    assert!(ctx.control().jobs.most_recent_stopped().is_none());

    let err = run_command_line("bg 1", &mut ctx).unwrap_err();
    assert_eq!(err.to_string(), "bg: job-id 1 is already running in the background");

    ctx.control().jobs.kill_all().unwrap();
    let err = run_command_line("bg", &mut ctx).unwrap_err();
    assert_eq!(err.to_string(), "bg: there is no stopped jobs to resume");
}

#[test]
fn test_fg_brings_job_back_and_waits() {
    let mut ctx = test_context();
    run_command_line("sleep 0.3&", &mut ctx).unwrap();

    assert_eq!(run_command_line("fg 1", &mut ctx).unwrap(), 0);
    let control = ctx.control();
    assert!(control.jobs.is_empty());
    assert!(control.jobs.foreground().is_none());
}

#[test]
fn test_job_builtin_usage_errors() {
    let mut ctx = test_context();
    let cases = [
        ("fg", "fg: jobs list is empty"),
        ("fg 4", "fg: job-id 4 does not exist"),
        ("fg x", "fg: invalid arguments"),
        ("fg 1 2", "fg: invalid arguments"),
        ("bg one", "bg: invalid arguments"),
        ("kill 9 1", "kill: invalid arguments"),
        ("kill -9", "kill: invalid arguments"),
        ("kill -9 5", "kill: job-id 5 does not exist"),
    ];
    for (line, message) in cases {
        let err = run_command_line(line, &mut ctx).unwrap_err();
        assert!(err.is_usage(), "{}", line);
        assert_eq!(err.to_string(), message);
    }
}

#[test]
fn test_uniform_missing_job_wording() {
    let mut config = ShellConfig::default();
    config.policy.missing_job = MissingJobWording::Uniform;
    let mut ctx = test_context_with(config);

    assert_eq!(run_command_line("fg", &mut ctx).unwrap_err().to_string(), "fg: no such job");
    assert_eq!(run_command_line("kill -9 3", &mut ctx).unwrap_err().to_string(), "kill: no such job");
}

#[test]
fn test_quit_kill_empties_table() {
    let mut ctx = test_context();
    run_command_line("sleep 30&", &mut ctx).unwrap();
    run_command_line("sleep 30&", &mut ctx).unwrap();

    run_command_line("quit kill", &mut ctx).unwrap();
    assert!(ctx.quit);
    assert!(ctx.control().jobs.is_empty());
}

#[test]
fn test_timeouts_fire_in_order() {
    let timer = RecordingTimer::default();
    let mut config = ShellConfig::default();
    config.interpreter = Some("/bin/sh".to_string());
    let mut ctx = ShellContext::with_control(config, JobControl::new(Box::new(timer.clone())));

    run_command_line("timeout 1 sleep 30&", &mut ctx).unwrap();
    run_command_line("timeout 2 sleep 30&", &mut ctx).unwrap();
    assert_eq!(ctx.control().timeouts.len(), 2);
    assert_eq!(timer.calls(), vec![TimerCall::Arm(Duration::from_secs(1))]);

    thread::sleep(Duration::from_millis(1100));
    let events = on_alarm(&mut ctx.control()).unwrap();
    assert_eq!(events, vec![JobEvent::TimedOut("timeout 1 sleep 30&".to_string())]);
    assert_eq!(ctx.control().timeouts.len(), 1);
    assert!(matches!(timer.last(), Some(TimerCall::Arm(_))));

    thread::sleep(Duration::from_millis(1000));
    let events = on_alarm(&mut ctx.control()).unwrap();
    assert_eq!(events, vec![JobEvent::TimedOut("timeout 2 sleep 30&".to_string())]);

    assert!(ctx.control().timeouts.is_empty());
    assert_eq!(timer.last(), Some(TimerCall::Disarm));

    // Both were killed, so reaping clears the table.
    thread::sleep(Duration::from_millis(100));
    let mut control = ctx.control();
    control.reap_finished().unwrap();
    assert!(control.jobs.is_empty());
}

#[test]
fn test_alarm_for_finished_process_reports_nothing() {
    let timer = RecordingTimer::default();
    let mut control = JobControl::new(Box::new(timer.clone()));
    let ctx = test_context();

    let pid = process::fork_child(&ctx, |_| 0).unwrap();
    process::reap(pid).unwrap();
    control.schedule_timeout(pid, Duration::from_millis(10)).unwrap();

    thread::sleep(Duration::from_millis(50));
    assert!(on_alarm(&mut control).unwrap().is_empty());
    assert!(control.timeouts.is_empty());
    assert_eq!(timer.last(), Some(TimerCall::Disarm));
}

#[test]
fn test_ctrl_c_and_ctrl_z_act_on_foreground_only() {
    let mut control = JobControl::new(Box::new(RecordingTimer::default()));
    assert!(on_interrupt(&mut control).unwrap().is_empty());
    assert!(on_stop(&mut control).unwrap().is_empty());

    let ctx = test_context();
    let pid = process::fork_child(&ctx, |_| {
        thread::sleep(Duration::from_secs(30));
        0
    })
    .unwrap();
    let command = Arc::new(CommandDescriptor::parse("sleep 30").unwrap());

    control.jobs.set_foreground(pid, command, None);
    assert_eq!(on_stop(&mut control).unwrap(), vec![JobEvent::Stopped(pid)]);
    assert_eq!(control.jobs.lookup_by_process_id(pid).unwrap().job_id, 1);

    let record = control.jobs.remove_by_process_id(pid).unwrap();
    control.jobs.set_foreground(pid, record.command, Some(record.job_id));
    process::signal_job(pid, Signal::SIGCONT).unwrap();
    assert_eq!(on_interrupt(&mut control).unwrap(), vec![JobEvent::Killed(pid)]);
    assert!(control.jobs.foreground().is_none());
    assert!(control.jobs.is_empty());
}

#[test]
fn test_job_builtins_in_forked_stages_see_shell_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let mut ctx = test_context();
    run_command_line("sleep 30&", &mut ctx).unwrap();
    let pid = ctx.control().jobs.lookup_by_job_id(1).unwrap().pid;

    let listing = dir.path().join("jobs.txt");
    run_command_line(&format!("jobs > {}", path_arg(&listing)), &mut ctx).unwrap();
    let listed = fs::read_to_string(&listing).unwrap();
    assert!(listed.starts_with(&format!("[1] sleep 30& : {} ", pid)), "{}", listed);

    let count = dir.path().join("count.txt");
    run_command_line(&format!("jobs | wc -l > {}", path_arg(&count)), &mut ctx).unwrap();
    assert_eq!(fs::read_to_string(&count).unwrap().trim(), "1");

    let sent = dir.path().join("sent.txt");
    let line = format!("kill -{} 1 > {}", Signal::SIGCONT as i32, path_arg(&sent));
    assert_eq!(run_command_line(&line, &mut ctx).unwrap(), 0);
    assert_eq!(
        fs::read_to_string(&sent).unwrap(),
        format!("signal number {} was sent to pid {}\n", Signal::SIGCONT as i32, pid)
    );

    // The shell's own table is untouched by what the stages did.
    assert_eq!(ctx.control().jobs.len(), 1);
    ctx.control().jobs.kill_all().unwrap();
}

#[test]
fn test_ctrl_c_kills_every_pipeline_stage() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("late");
    let mut ctx = test_context();

    let line = format!("sleep 1 && touch {} | cat", path_arg(&marker));
    let (status, pid, events, elapsed) = signal_while_running(&line, &mut ctx, on_interrupt);

    let pid = pid.expect("pipeline should hold the foreground slot");
    assert_eq!(events, vec![JobEvent::Killed(pid)]);
    assert_eq!(status, 128 + Signal::SIGKILL as i32);
    assert!(elapsed < Duration::from_secs(1), "{:?}", elapsed);

    // The source stage went down with the group, so it never gets to touch the file.
    thread::sleep(Duration::from_millis(1200));
    assert!(!marker.exists());
    assert!(ctx.control().jobs.foreground().is_none());
}

#[test]
fn test_ctrl_z_stops_pipeline_as_one_job() {
    let mut ctx = test_context();
    let (status, pid, events, elapsed) = signal_while_running("sleep 5 | cat", &mut ctx, on_stop);

    let pid = pid.expect("pipeline should hold the foreground slot");
    assert_eq!(events, vec![JobEvent::Stopped(pid)]);
    assert_eq!(status, 128 + Signal::SIGTSTP as i32);
    assert!(elapsed < Duration::from_secs(3), "{:?}", elapsed);

    {
        let control = ctx.control();
        let record = control.jobs.lookup_by_job_id(1).unwrap();
        assert_eq!(record.pid, pid);
        assert_eq!(record.command.raw(), "sleep 5 | cat");
        assert!(control.jobs.foreground().is_none());
    }
    assert_eq!(ctx.control().jobs.kill_all().unwrap().len(), 1);
}

#[test]
fn test_ctrl_c_kills_redirected_command() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.txt");
    let mut ctx = test_context();

    let line = format!("sleep 5 > {}", path_arg(&out));
    let (status, pid, events, elapsed) = signal_while_running(&line, &mut ctx, on_interrupt);

    let pid = pid.expect("redirect should hold the foreground slot");
    assert_eq!(events, vec![JobEvent::Killed(pid)]);
    assert_eq!(status, 128 + Signal::SIGKILL as i32);
    assert!(elapsed < Duration::from_secs(3), "{:?}", elapsed);
    assert!(ctx.control().jobs.is_empty());
}
