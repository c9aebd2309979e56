use anyhow::{Context, Result};
use log::debug;
use std::io::{self, BufRead, Write};

use crate::shell::context::ShellContext;
use crate::shell::{report_error, run_command_line};

/// Read-eval loop. Ends on `quit` or end of input; returns the last command's status.
pub fn handle_interactive(ctx: &mut ShellContext, show_prompt: bool) -> Result<i32> {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        if show_prompt {
            print!("{}> ", ctx.prompt);
            io::stdout().flush().context("Failed to write prompt")?;
        }

        line.clear();
        let read = stdin.lock().read_line(&mut line).context("Failed to read input")?;
        if read == 0 {
            debug!("end of input");
            break;
        }

        handle_line(&line, ctx);
        if ctx.quit {
            break;
        }
    }
    Ok(ctx.exit_code)
}

/// Runs a single line; errors are reported and only fail that line.
pub fn handle_line(line: &str, ctx: &mut ShellContext) -> i32 {
    match run_command_line(line, ctx) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            ctx.exit_code = 1;
            1
        }
    }
}
