use std::env;

pub const FALLBACK_SHELL: &str = "/bin/sh";

/// Configured interpreter, else `$SHELL`, else `/bin/sh`.
pub fn detect_shell(config_shell: Option<&String>) -> String {
    config_shell
        .filter(|shell| !shell.trim().is_empty())
        .cloned()
        .or_else(|| env::var("SHELL").ok().filter(|shell| !shell.is_empty()))
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}
