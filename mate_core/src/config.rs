//! Configuration file support for the Mate tracker.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/mate/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub intake: IntakeConfig,
}

/// Dose and decay parameters used by every ledger calculation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct IntakeConfig {
    /// Caffeine per drink (one 0.5 L bottle at 20 mg/100 ml)
    #[serde(default = "default_dose_mg")]
    pub dose_mg: f64,

    /// Recommended daily maximum for healthy adults
    #[serde(default = "default_max_daily_mg")]
    pub max_daily_mg: f64,

    #[serde(default = "default_half_life_hours")]
    pub half_life_hours: f64,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            dose_mg: default_dose_mg(),
            max_daily_mg: default_max_daily_mg(),
            half_life_hours: default_half_life_hours(),
        }
    }
}

impl IntakeConfig {
    /// Reject values the decay and threshold math cannot work with
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("dose_mg", self.dose_mg),
            ("max_daily_mg", self.max_daily_mg),
            ("half_life_hours", self.half_life_hours),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "intake.{} must be a positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_dose_mg() -> f64 {
    100.0
}

fn default_max_daily_mg() -> f64 {
    400.0
}

fn default_half_life_hours() -> f64 {
    5.0
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let base = match dirs::config_dir() {
            Some(dir) => dir,
            None => {
                let home = std::env::var("HOME").map_err(|_| {
                    Error::Config("HOME environment variable not set".into())
                })?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(base.join("mate").join("config.toml"))
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.intake.validate()
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
