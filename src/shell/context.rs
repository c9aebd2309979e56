use log::warn;
use nix::unistd::{Pid, getpid};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, MutexGuard};

use crate::config::ShellConfig;
use crate::shell::commands::Executable;
use crate::shell::control::{self, JobControl, SharedControl};
use crate::shell::timeout::SystemAlarm;

/// Built once at startup and handed to every component.
pub struct ShellContext {
    pub config: Arc<ShellConfig>,
    pub prompt: String,
    pub interpreter: String,
    /// Target for `cd -`
    pub prev_dir: Option<PathBuf>,
    pub shell_pid: Pid,
    pub exit_code: i32,
    pub quit: bool,
    pub registry: Arc<HashMap<String, Box<dyn Executable>>>,
    control: SharedControl,
    nested: bool,
}

impl ShellContext {
    pub fn new(config: ShellConfig) -> Self {
        Self::with_control(config, JobControl::new(Box::new(SystemAlarm)))
    }

    pub fn with_control(config: ShellConfig, control: JobControl) -> Self {
        let mut ctx = Self {
            prompt: config.prompt.clone(),
            interpreter: config.interpreter(),
            config: Arc::new(config),
            prev_dir: None,
            shell_pid: getpid(),
            exit_code: 0,
            quit: false,
            registry: Arc::new(HashMap::new()),
            control: control.shared(),
            nested: false,
        };
        crate::shell::commands::builtins::register_all_builtins(&mut ctx);
        ctx
    }

    pub fn register_command(&mut self, name: &str, command: Box<dyn Executable>) {
        if let Some(map) = Arc::get_mut(&mut self.registry) {
            map.insert(name.to_string(), command);
        } else {
            warn!("cannot register '{}': registry is already shared", name);
        }
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    pub fn control(&self) -> MutexGuard<'_, JobControl> {
        control::lock(&self.control)
    }

    /// Handle for the signal thread.
    pub fn shared_control(&self) -> SharedControl {
        self.control.clone()
    }

    /// True inside a forked child running a composite stage.
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// Context for a forked child: same settings, its own detached job state.
    pub fn for_child(&self, snapshot: JobControl) -> Self {
        Self {
            config: self.config.clone(),
            prompt: self.prompt.clone(),
            interpreter: self.interpreter.clone(),
            prev_dir: self.prev_dir.clone(),
            shell_pid: self.shell_pid,
            exit_code: self.exit_code,
            quit: false,
            registry: self.registry.clone(),
            control: snapshot.shared(),
            nested: true,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_context() -> ShellContext {
    test_context_with(ShellConfig::default())
}

#[cfg(test)]
pub(crate) fn test_context_with(mut config: ShellConfig) -> ShellContext {
    use crate::shell::timeout::InertAlarm;

    config.interpreter = Some("/bin/sh".to_string());
    ShellContext::with_control(config, JobControl::new(Box::new(InertAlarm)))
}
