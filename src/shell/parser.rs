use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::shell::ast::{CommandDescriptor, CommandExpr, CommandRef, PipeStream, RedirectMode};
use crate::shell::context::ShellContext;
use crate::shell::error::{ShellError, ShellResult};

pub const TIMEOUT_KEYWORD: &str = "timeout";

/// Turns one input line into a command expression. `Ok(None)` for a blank line.
pub fn parse_command_line(line: &str, ctx: &ShellContext) -> ShellResult<Option<CommandExpr>> {
    match CommandDescriptor::parse(line) {
        Some(cmd) => parse_expr(Arc::new(cmd), ctx).map(Some),
        None => Ok(None),
    }
}

fn parse_expr(cmd: CommandRef, ctx: &ShellContext) -> ShellResult<CommandExpr> {
    if cmd.name() == TIMEOUT_KEYWORD {
        return parse_timeout(cmd, ctx);
    }
    parse_inner(cmd, ctx)
}

// timeout <secs> <command>
fn parse_timeout(cmd: CommandRef, ctx: &ShellContext) -> ShellResult<CommandExpr> {
    let invalid = || ShellError::usage(format!("{}: invalid arguments", TIMEOUT_KEYWORD));

    let args = cmd.args();
    if args.len() < 3 {
        return Err(invalid());
    }
    let secs: u64 = args[1].parse().map_err(|_| invalid())?;
    if secs == 0 {
        return Err(invalid());
    }

    let rest = skip_words(cmd.line(), 2);
    let inner_cmd = CommandDescriptor::parse(rest).ok_or_else(invalid)?;
    let inner = parse_expr(Arc::new(inner_cmd), ctx)?;

    Ok(CommandExpr::Timeout {
        cmd,
        duration: Duration::from_secs(secs),
        inner: Box::new(inner),
    })
}

fn parse_inner(cmd: CommandRef, ctx: &ShellContext) -> ShellResult<CommandExpr> {
    let line = cmd.line();

    if let Some(pos) = line.find('|') {
        let (stream, op_len) = if line[pos + 1..].starts_with('&') {
            (PipeStream::Stderr, 2)
        } else {
            (PipeStream::Stdout, 1)
        };
        let op = &line[pos..pos + op_len];
        let source = parse_side(&line[..pos], op, ctx)?;
        let dest = parse_side(&line[pos + op_len..], op, ctx)?;
        return Ok(CommandExpr::Pipe {
            cmd,
            source: Box::new(source),
            dest: Box::new(dest),
            stream,
        });
    }

    if let Some(pos) = line.find('>') {
        let (mode, op_len) = if line[pos + 1..].starts_with('>') {
            (RedirectMode::Append, 2)
        } else {
            (RedirectMode::Overwrite, 1)
        };
        let op = &line[pos..pos + op_len];
        let inner = parse_side(&line[..pos], op, ctx)?;

        let mut words = line[pos + op_len..].split_whitespace();
        let target = match (words.next(), words.next()) {
            (Some(target), None) => PathBuf::from(target),
            _ => return Err(ShellError::usage(format!("syntax error near `{}`", op))),
        };
        return Ok(CommandExpr::Redirect {
            cmd,
            inner: Box::new(inner),
            target,
            mode,
        });
    }

    if ctx.is_builtin(cmd.name()) {
        Ok(CommandExpr::Builtin(cmd))
    } else {
        Ok(CommandExpr::External(cmd))
    }
}

/// One operand of `|`, `|&`, `>` or `>>`.
fn parse_side(text: &str, op: &str, ctx: &ShellContext) -> ShellResult<CommandExpr> {
    let side = CommandDescriptor::parse(text)
        .ok_or_else(|| ShellError::usage(format!("syntax error near `{}`", op)))?;
    parse_expr(Arc::new(side), ctx)
}

/// The rest of `line` after its first `count` words, original spacing kept.
fn skip_words(line: &str, count: usize) -> &str {
    let mut rest = line.trim_start();
    for _ in 0..count {
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        rest = rest[end..].trim_start();
    }
    rest
}
