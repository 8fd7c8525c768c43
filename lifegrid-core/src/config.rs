//! Global lifegrid configuration.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{LifeGridError, LifeGridResult};
use crate::grid::{DEFAULT_SPAN_YEARS, MAX_SPAN_YEARS};

static DEFAULT_DATA_PATH: &str = "~/lifegrid";
const DEFAULT_CANONICAL_DAY: u32 = 15;

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_PATH)
}

fn default_canonical_day() -> u32 {
    DEFAULT_CANONICAL_DAY
}

fn default_span_years() -> u32 {
    DEFAULT_SPAN_YEARS
}

/// Global configuration at ~/.config/lifegrid/config.toml
///
/// Every key can be overridden with a `LIFEGRID_` environment variable,
/// e.g. `LIFEGRID_DATA_DIR`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LifeGridConfig {
    #[serde(default = "default_data_path")]
    pub data_dir: PathBuf,

    /// Day of month a relocated event lands on.
    #[serde(default = "default_canonical_day")]
    pub canonical_day: u32,

    /// Years covered by the grid, starting at the birth month.
    #[serde(default = "default_span_years")]
    pub span_years: u32,
}

impl Default for LifeGridConfig {
    fn default() -> Self {
        LifeGridConfig {
            data_dir: default_data_path(),
            canonical_day: DEFAULT_CANONICAL_DAY,
            span_years: DEFAULT_SPAN_YEARS,
        }
    }
}

/// The part of the configuration the grid and relocation logic need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSettings {
    pub canonical_day: u32,
    pub span_years: u32,
}

impl Default for GridSettings {
    fn default() -> Self {
        GridSettings {
            canonical_day: DEFAULT_CANONICAL_DAY,
            span_years: DEFAULT_SPAN_YEARS,
        }
    }
}

impl LifeGridConfig {
    pub fn config_path() -> LifeGridResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LifeGridError::Config("Could not determine config directory".into()))?
            .join("lifegrid");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented default file on first run.
    pub fn load() -> LifeGridResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        let config = Config::builder()
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix("LIFEGRID").try_parsing(true))
            .build()
            .map_err(|e| LifeGridError::Config(e.to_string()))?;

        Self::from_config(config)
    }

    /// Load from an explicit file, without environment overrides.
    pub fn load_from(path: &Path) -> LifeGridResult<Self> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| LifeGridError::Config(e.to_string()))?;

        Self::from_config(config)
    }

    fn from_config(config: Config) -> LifeGridResult<Self> {
        let config: LifeGridConfig = config
            .try_deserialize()
            .map_err(|e| LifeGridError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> LifeGridResult<()> {
        if !(1..=28).contains(&self.canonical_day) {
            return Err(LifeGridError::Config(format!(
                "canonical_day must be between 1 and 28, got {}",
                self.canonical_day
            )));
        }
        if !(1..=MAX_SPAN_YEARS).contains(&self.span_years) {
            return Err(LifeGridError::Config(format!(
                "span_years must be between 1 and {MAX_SPAN_YEARS}, got {}",
                self.span_years
            )));
        }
        Ok(())
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    /// Data directory as configured, keeping `~` for display.
    pub fn display_path(&self) -> &Path {
        &self.data_dir
    }

    pub fn grid_settings(&self) -> GridSettings {
        GridSettings {
            canonical_day: self.canonical_day,
            span_years: self.span_years,
        }
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> LifeGridResult<()> {
        let contents = format!(
            "\
# lifegrid configuration

# Where events, images and profiles are stored:
# data_dir = \"{DEFAULT_DATA_PATH}\"

# Day of month a moved event is placed on (1-28):
# canonical_day = {DEFAULT_CANONICAL_DAY}

# Number of years shown in the grid (1-{MAX_SPAN_YEARS}):
# span_years = {DEFAULT_SPAN_YEARS}
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                LifeGridError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| LifeGridError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
