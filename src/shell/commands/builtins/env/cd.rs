// Cd command
use crate::config::CdPolicy;
use crate::shell::commands::Executable;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult};
use std::env;
use std::path::PathBuf;

pub struct CdCommand;

impl Executable for CdCommand {
    fn execute(&self, args: &[String], ctx: &mut ShellContext) -> ShellResult<i32> {
        let target = match args {
            [_] => match ctx.config.policy.cd_without_args {
                CdPolicy::Stay => return Ok(0),
                CdPolicy::Home => env::var_os("HOME")
                    .map(PathBuf::from)
                    .ok_or_else(|| ShellError::usage("cd: HOME not set"))?,
            },
            [_, dir] if dir == "-" => ctx
                .prev_dir
                .clone()
                .ok_or_else(|| ShellError::usage("cd: OLDPWD not set"))?,
            [_, dir] => PathBuf::from(dir),
            _ => return Err(ShellError::usage("cd: too many arguments")),
        };

        let current = env::current_dir().map_err(|err| ShellError::io("cd", err))?;
        env::set_current_dir(&target)
            .map_err(|err| ShellError::io(format!("cd: {}", target.display()), err))?;
        ctx.prev_dir = Some(current);
        Ok(0)
    }
}
