use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use lessonforge_store::SeedMode;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "lessonforge.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Optional settings from `lessonforge.toml`. Command-line flags win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LessonforgeConfig {
    pub database_url: Option<String>,
    pub run_dir: Option<PathBuf>,
    pub default_mode: Option<SeedMode>,
    pub log_filter: Option<String>,
}

impl LessonforgeConfig {
    pub fn run_dir(&self) -> PathBuf {
        self.run_dir.clone().unwrap_or_else(|| PathBuf::from("runs"))
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or("info")
    }
}

/// Load an explicit config file, or `lessonforge.toml` when it exists.
pub fn load_config(explicit: Option<&Path>) -> Result<LessonforgeConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(LessonforgeConfig::default());
            }
            default
        }
    };

    let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    parse_config(&contents).map_err(|source| ConfigError::Parse { path, source })
}

fn parse_config(contents: &str) -> Result<LessonforgeConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Connection string precedence: flag, config file, then `DATABASE_URL`.
pub fn resolve_database_url(flag: Option<String>, config: &LessonforgeConfig) -> Option<String> {
    flag.or_else(|| config.database_url.clone())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .filter(|url| !url.trim().is_empty())
}
