use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// One parsed command line. Never mutated once built; job records share it through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandDescriptor {
    args: Vec<String>,
    raw: String,
    line: String,
    background: bool,
}

impl CommandDescriptor {
    /// Returns `None` for blank input.
    pub fn parse(cmd_line: &str) -> Option<Self> {
        let raw = cmd_line.trim();
        if raw.is_empty() {
            return None;
        }

        let (line, background) = match raw.strip_suffix('&') {
            Some(rest) => (rest.trim_end(), true),
            None => (raw, false),
        };

        let args: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if args.is_empty() {
            // A lone "&"
            return None;
        }

        Some(Self {
            args,
            raw: raw.to_string(),
            line: line.to_string(),
            background,
        })
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn name(&self) -> &str {
        &self.args[0]
    }

    /// Text as typed, used for display.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Text without the background sign, handed to the interpreter.
    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn is_background(&self) -> bool {
        self.background
    }
}

impl fmt::Display for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

pub type CommandRef = Arc<CommandDescriptor>;

#[derive(Debug, Clone)]
pub enum CommandExpr {
    // Registered built-in: "jobs", "fg 2"
    Builtin(CommandRef),
    // Anything else, run through the interpreter: "sleep 10 &"
    External(CommandRef),
    // Pipeline: "ls |& grep error"
    Pipe {
        cmd: CommandRef,
        source: Box<CommandExpr>,
        dest: Box<CommandExpr>,
        stream: PipeStream,
    },
    // Redirection: "echo logs >> file.txt"
    Redirect {
        cmd: CommandRef,
        inner: Box<CommandExpr>,
        target: PathBuf,
        mode: RedirectMode,
    },
    // Scheduled kill: "timeout 5 sleep 100"
    Timeout {
        cmd: CommandRef,
        duration: Duration,
        inner: Box<CommandExpr>,
    },
}

impl CommandExpr {
    /// The descriptor for the whole line this expression was parsed from.
    pub fn descriptor(&self) -> &CommandRef {
        match self {
            CommandExpr::Builtin(cmd) | CommandExpr::External(cmd) => cmd,
            CommandExpr::Pipe { cmd, .. }
            | CommandExpr::Redirect { cmd, .. }
            | CommandExpr::Timeout { cmd, .. } => cmd,
        }
    }

    /// Only plain external commands and timed commands may run as background jobs.
    pub fn runs_in_background(&self) -> bool {
        match self {
            CommandExpr::External(cmd) | CommandExpr::Timeout { cmd, .. } => cmd.is_background(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PipeStream {
    Stdout, // |
    Stderr, // |&
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RedirectMode {
    Overwrite, // >
    Append,    // >>
}
