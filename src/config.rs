use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use crate::utils::detect_shell;

pub const CONFIG_FILE: &str = "jobsh.toml";
pub const CONFIG_ENV: &str = "JOBSH_CONFIG";
pub const DEFAULT_PROMPT: &str = "jobsh";

#[derive(Debug, Deserialize, Clone)]
#[serde(default, rename_all = "kebab-case")]
pub struct ShellConfig {
    pub prompt: String,
    /// Program that runs external command text as `<interpreter> -c <text>`
    pub interpreter: Option<String>,
    pub policy: PolicyConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            interpreter: None,
            policy: PolicyConfig::default(),
        }
    }
}

impl ShellConfig {
    pub fn interpreter(&self) -> String {
        detect_shell(self.interpreter.as_ref())
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default, rename_all = "kebab-case")]
pub struct PolicyConfig {
    pub cd_without_args: CdPolicy,
    pub missing_job: MissingJobWording,
}

/// What `cd` with no argument does.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CdPolicy {
    #[default]
    Stay,
    Home,
}

/// How `fg`/`bg`/`kill` word an empty table or an unknown job id.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MissingJobWording {
    /// "jobs list is empty", "job-id 3 does not exist"
    #[default]
    Specific,
    /// "no such job" for both
    Uniform,
}

pub fn parse_config(content: &str) -> Result<ShellConfig> {
    toml::from_str(content).context("Failed to parse shell configuration")
}

/// `--config` first (must exist), then `$JOBSH_CONFIG`, then `./jobsh.toml`, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<ShellConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            Some(path.to_path_buf())
        }
        None => discover_config(),
    };

    let Some(path) = path else {
        debug!("no config file, using defaults");
        return Ok(ShellConfig::default());
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config = parse_config(&content)
        .with_context(|| format!("Invalid config in {}", path.display()))?;
    info!("loaded config from {}", path.display());
    Ok(config)
}

fn discover_config() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let local = PathBuf::from(CONFIG_FILE);
    local.is_file().then_some(local)
}
