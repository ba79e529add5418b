//! Runtime configuration for the maintenance binary.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI arguments that participate in config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub store_dir: Option<PathBuf>,
    pub index_db_dir: Option<PathBuf>,
    pub drain_timeout_sec: u64,
}

/// Optional TOML file config. Values here override the CLI.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    pub store_dir: Option<String>,
    pub index_db_dir: Option<String>,
    pub drain_timeout_sec: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {path:?}"))
    }
}

/// Resolved settings for one maintenance run.
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    pub store_dir: PathBuf,
    pub index_db_dir: PathBuf,
    pub drain_timeout_sec: u64,
}

impl MaintenanceConfig {
    /// Resolve configuration from CLI arguments and an optional file config.
    /// File values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let Some(store_dir) = file
            .store_dir
            .map(PathBuf::from)
            .or_else(|| cli.store_dir.clone())
        else {
            bail!("store_dir must be given on the command line or in the config file");
        };

        if !store_dir.exists() {
            bail!("Page store directory does not exist: {store_dir:?}");
        }
        if !store_dir.is_dir() {
            bail!("Page store path is not a directory: {store_dir:?}");
        }

        let index_db_dir = file
            .index_db_dir
            .map(PathBuf::from)
            .or_else(|| cli.index_db_dir.clone())
            .unwrap_or_else(|| store_dir.join(".index"));

        let drain_timeout_sec = file.drain_timeout_sec.unwrap_or(cli.drain_timeout_sec);

        Ok(Self {
            store_dir,
            index_db_dir,
            drain_timeout_sec,
        })
    }

    pub fn frontmatter_db_path(&self) -> PathBuf {
        self.index_db_dir.join("frontmatter.db")
    }

    pub fn fulltext_db_path(&self) -> PathBuf {
        self.index_db_dir.join("fulltext.db")
    }
}
