pub mod builtins;
pub mod system;

use crate::shell::context::ShellContext;
use crate::shell::error::ShellResult;

/// A built-in runs inside the shell process and returns its exit status.
pub trait Executable: Send + Sync {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32>;
}
