// Chprompt command
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::error::ShellResult;

pub struct ChpromptCommand;

impl Executable for ChpromptCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        // No argument restores the configured prompt.
        ctx.prompt = match args.get(1) {
            Some(name) => name.clone(),
            None => ctx.config.prompt.clone(),
        };
        Ok(0)
    }
}
