// ⚙️ Configuration - where to fetch from and where to log
// Defaults < JSON file < environment < command-line flags

use crate::source::{CsvSource, DataSource, HttpSource};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ENV_API_URL: &str = "ECON_DASHBOARD_API_URL";
pub const ENV_DATA_DIR: &str = "ECON_DASHBOARD_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend root; `/api/countries/` and `/api/data/` are appended
    pub api_base_url: String,

    /// When set, read CSV files from here instead of calling the backend
    pub data_dir: Option<PathBuf>,

    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: "http://localhost:8000".to_string(),
            data_dir: None,
            log_file: PathBuf::from("econ-dashboard.log"),
        }
    }
}

/// Which mode the binary runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Dashboard,
    Report,
}

impl Config {
    /// Load from a JSON file; missing keys keep their defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;

        Ok(config)
    }

    /// Apply environment overrides through a lookup function
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Build the full configuration from process arguments (without argv[0])
    /// and an environment lookup
    pub fn from_args<F>(args: &[String], lookup: F) -> Result<(Mode, Self)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut mode = Mode::Dashboard;
        let mut config_path: Option<PathBuf> = None;
        let mut api: Option<String> = None;
        let mut data: Option<PathBuf> = None;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "report" => mode = Mode::Report,
                "--config" => {
                    let value = iter.next().context("--config needs a path")?;
                    config_path = Some(PathBuf::from(value));
                }
                "--api" => {
                    let value = iter.next().context("--api needs a URL")?;
                    api = Some(value.clone());
                }
                "--data" => {
                    let value = iter.next().context("--data needs a directory")?;
                    data = Some(PathBuf::from(value));
                }
                other => bail!("Unknown argument: {}", other),
            }
        }

        let mut config = match config_path {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        config.apply_env(lookup);

        if let Some(url) = api {
            config.api_base_url = url;
            config.data_dir = None;
        }
        if let Some(dir) = data {
            config.data_dir = Some(dir);
        }

        Ok((mode, config))
    }

    pub fn source(&self) -> Arc<dyn DataSource> {
        match &self.data_dir {
            Some(dir) => Arc::new(CsvSource::new(dir.clone())),
            None => Arc::new(HttpSource::new(self.api_base_url.clone())),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
