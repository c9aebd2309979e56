use chrono::Local;
use colored::*;
use env_logger::{Builder, Env};
use log::Level;
use std::io::Write;

/// Diagnostics go to stderr. `RUST_LOG` overrides the default level.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };

    Builder::from_env(Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            let level = match record.level() {
                Level::Error => "ERROR".red().bold(),
                Level::Warn => "WARN".yellow().bold(),
                Level::Info => "INFO".green(),
                Level::Debug => "DEBUG".cyan(),
                Level::Trace => "TRACE".dimmed(),
            };
            writeln!(
                buf,
                "{} {} [{}] {}",
                Local::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                level,
                record.target(),
                record.args()
            )
        })
        .init();
}
