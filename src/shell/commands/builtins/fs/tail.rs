// Tail command
use std::fs;
use std::io::{self, Write};

use crate::shell::commands::Executable;
use crate::shell::commands::builtins::common::invalid_arguments;
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult, stdout_err};

const DEFAULT_LINES: usize = 10;

pub struct TailCommand;

pub fn last_lines(text: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].to_vec()
}

impl Executable for TailCommand {
    fn execute(&self, args: &[String], _ctx: &mut ShellContext) -> ShellResult<i32> {
        let (count, path) = match args {
            [_, path] => (DEFAULT_LINES, path),
            [_, count, path] => {
                let count = count
                    .strip_prefix('-')
                    .and_then(|n| n.parse().ok())
                    .ok_or_else(|| invalid_arguments("tail"))?;
                (count, path)
            }
            _ => return Err(invalid_arguments("tail")),
        };

        let bytes = fs::read(path).map_err(|err| ShellError::io(format!("tail: {}", path), err))?;
        let text = String::from_utf8_lossy(&bytes);
        let mut out = io::stdout().lock();
        for line in last_lines(&text, count) {
            writeln!(out, "{}", line).map_err(stdout_err)?;
        }
        Ok(0)
    }
}
