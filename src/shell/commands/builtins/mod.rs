pub mod common;
pub mod env;
pub mod fs;
pub mod jobs;

use crate::shell::context::ShellContext;

/// Registers every built-in under its command name.
pub fn register_all_builtins(ctx: &mut ShellContext) {
    // Shell state
    ctx.register_command("chprompt", Box::new(env::chprompt::ChpromptCommand));
    ctx.register_command("showpid", Box::new(env::showpid::ShowpidCommand));
    ctx.register_command("pwd", Box::new(env::pwd::PwdCommand));
    ctx.register_command("cd", Box::new(env::cd::CdCommand));
    ctx.register_command("quit", Box::new(env::quit::QuitCommand));

    // Job control
    ctx.register_command("jobs", Box::new(jobs::list::JobsCommand));
    ctx.register_command("fg", Box::new(jobs::fg::FgCommand));
    ctx.register_command("bg", Box::new(jobs::bg::BgCommand));
    ctx.register_command("kill", Box::new(jobs::kill::KillCommand));

    // Files
    ctx.register_command("touch", Box::new(fs::touch::TouchCommand));
    ctx.register_command("tail", Box::new(fs::tail::TailCommand));
}
