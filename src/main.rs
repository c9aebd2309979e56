mod cli;
mod config;
mod handlers;
mod logger;
mod shell;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use colored::*;
use handlers::shell::{handle_interactive, handle_line};
use log::debug;
use shell::context::ShellContext;
use shell::signals::spawn_signal_controller;

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "jobsh:".red().bold(), err);
            1
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(prompt) = cli.prompt.clone() {
        config.prompt = prompt;
    }
    if let Some(interpreter) = cli.interpreter.clone() {
        config.interpreter = Some(interpreter);
    }

    let mut ctx = ShellContext::new(config);
    debug!("shell pid {}, interpreter {}", ctx.shell_pid, ctx.interpreter);
    spawn_signal_controller(ctx.shared_control()).context("Failed to install signal handlers")?;

    match &cli.command {
        Some(line) => Ok(handle_line(line, &mut ctx)),
        None => handle_interactive(&mut ctx, !cli.no_prompt),
    }
}
