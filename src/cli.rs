use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jobsh", version, about = "jobsh: a small job-control shell")]
pub struct Cli {
    /// Config file (default: $JOBSH_CONFIG, then ./jobsh.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Prompt name, overrides the config file
    #[arg(long)]
    pub prompt: Option<String>,

    /// Program that runs external commands as `<interpreter> -c <text>`
    #[arg(long, value_name = "PROGRAM")]
    pub interpreter: Option<String>,

    /// Do not print a prompt (for piped input)
    #[arg(short = 'q', long = "no-prompt")]
    pub no_prompt: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Run one command line and exit with its status
    #[arg(short = 'c', long = "command", value_name = "LINE")]
    pub command: Option<String>,
}
