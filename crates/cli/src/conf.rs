//! CLI configuration: `[read]` options plus output settings.

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use msbuild_issues::ReadOptions;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "MSBUILD_ISSUES_CONFIG";
pub const REPO_ROOT_ENV: &str = "MSBUILD_ISSUES_REPO_ROOT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One pretty-printed JSON array
    #[default]
    Json,
    /// One JSON object per line
    JsonLines,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub read: ReadOptions,
    pub output: OutputFormat,
}

impl CliConfig {
    /// Load configuration.
    /// Priority: `--config` > `MSBUILD_ISSUES_CONFIG` > defaults
    pub fn load(flag: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        Self::load_from(flag, std::env::var(CONFIG_ENV).ok())
    }

    fn load_from(
        flag: Option<&Path>,
        env_path: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let path = flag
            .map(Path::to_path_buf)
            .or_else(|| env_path.filter(|p| !p.trim().is_empty()).map(PathBuf::from));

        match path {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::from_file(&path)
            }
            None => {
                tracing::debug!("No configuration file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&contents)?;
        config.read.validate()?;
        Ok(config)
    }
}

/// Repository root.
/// Priority: `--repo` > `MSBUILD_ISSUES_REPO_ROOT` > current directory
pub fn repo_root(flag: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    resolve_repo_root(flag, std::env::var(REPO_ROOT_ENV).ok())
}

fn resolve_repo_root(
    flag: Option<&str>,
    env_root: Option<String>,
) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(root) = flag {
        return Ok(root.to_string());
    }
    if let Some(root) = env_root.filter(|r| !r.trim().is_empty()) {
        return Ok(root);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.to_string_lossy().into_owned())
}
