//! Error types for the shell core

use nix::errno::Errno;
use thiserror::Error;

/// Result type alias for shell operations
pub type ShellResult<T> = Result<T, ShellError>;

/// Every failure aborts only the current command; the shell keeps running.
#[derive(Error, Debug)]
pub enum ShellError {
    /// Bad arguments, unknown job, invalid signal number.
    #[error("{0}")]
    Usage(String),

    /// A failed OS call (fork, pipe, dup2, wait, kill, setitimer).
    #[error("{call} failed: {source}")]
    System {
        call: &'static str,
        #[source]
        source: Errno,
    },

    /// File and terminal I/O
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ShellError {
    pub fn usage(msg: impl Into<String>) -> Self {
        ShellError::Usage(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ShellError::Io { context: context.into(), source }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, ShellError::Usage(_))
    }
}

/// Adapter for `map_err` on writes to standard output.
pub fn stdout_err(source: std::io::Error) -> ShellError {
    ShellError::io("stdout", source)
}

/// Adapter for `map_err`: `waitpid(..).map_err(sys("waitpid"))?`
pub fn sys(call: &'static str) -> impl FnOnce(Errno) -> ShellError {
    move |source| ShellError::System { call, source }
}
