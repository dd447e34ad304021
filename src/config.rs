/// Configuration resolution module
///
/// This module handles:
/// - Building an AppConfig from CLI arguments
/// - Reading CHEMVIZ_* environment overrides
/// - Loading the optional TOML config file
/// - Validating the retention window
///
/// Precedence is CLI flag, then environment, then config file, then defaults.
use crate::cli::{default_config_path, default_data_dir, CliArgs};
use crate::error::{Error, Result};
use crate::store::RetentionPolicy;
use log::debug;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_DB: &str = "CHEMVIZ_DB";
pub const ENV_OWNER: &str = "CHEMVIZ_OWNER";

/// Owner used when none is configured anywhere
pub const DEFAULT_OWNER: &str = "local";

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database: PathBuf,
    pub owner: String,
    pub retention: RetentionPolicy,
    /// Directory PDF reports are written to when no output path is given
    pub report_dir: PathBuf,
    pub use_colors: bool,
}

/// Keys accepted in config.toml
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<PathBuf>,
    pub owner: Option<String>,
    pub retention: Option<usize>,
    pub report_dir: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }
}

/// Build the AppConfig from CLI arguments and the process environment
///
/// This resolves all configuration upfront so the commands receive a
/// validated, immutable configuration.
pub fn build_app_config(args: &CliArgs) -> Result<AppConfig> {
    resolve_with_env(args, |key| std::env::var(key).ok())
}

/// Same as [`build_app_config`] with an injectable environment lookup.
pub fn resolve_with_env<F>(args: &CliArgs, env: F) -> Result<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = load_file_config(args)?;

    let database = args
        .db
        .clone()
        .or_else(|| env(ENV_DB).filter(|v| !v.is_empty()).map(PathBuf::from))
        .or(file.database)
        .unwrap_or_else(|| default_data_dir().join("chemviz.db"));
    debug!("Database: {}", database.display());

    let owner = args
        .owner
        .clone()
        .or_else(|| env(ENV_OWNER).filter(|v| !v.is_empty()))
        .or(file.owner)
        .unwrap_or_else(|| DEFAULT_OWNER.to_string());
    if owner.trim().is_empty() {
        return Err(Error::Config("owner must not be blank".to_string()));
    }

    let retention = match args.retention.or(file.retention) {
        Some(limit) => RetentionPolicy::new(limit)?,
        None => RetentionPolicy::default(),
    };
    debug!("Owner {} with retention {}", owner, retention.limit());

    let report_dir = file.report_dir.unwrap_or_else(|| PathBuf::from("."));

    Ok(AppConfig { database, owner, retention, report_dir, use_colors: !args.no_color })
}

/// An explicit --config must exist; the default location is optional.
fn load_file_config(args: &CliArgs) -> Result<FileConfig> {
    match &args.config {
        Some(path) => {
            if !path.is_file() {
                return Err(Error::Config(format!("config file not found: {}", path.display())));
            }
            debug!("Loading config from {}", path.display());
            FileConfig::load(path)
        }
        None => match default_config_path() {
            Some(path) if path.is_file() => {
                debug!("Loading config from {}", path.display());
                FileConfig::load(&path)
            }
            _ => Ok(FileConfig::default()),
        },
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
