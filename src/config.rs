use crate::engine::FusionEngine;
use crate::errors::ConfigError;
use crate::labels::ClassTable;
use crate::policy::{DEFAULT_SPECTRAL_WEIGHT, DEFAULT_VISION_WEIGHT, FusionPolicy, FusionWeights};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub scanner: ScannerConfig,
    #[serde(default)]
    pub classes: ClassesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FusionConfig {
    pub vision_weight: f32,
    pub spectral_weight: f32,
    pub policy: FusionPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScannerConfig {
    pub enabled: bool,
    pub mock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ClassesConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_yaml: Option<PathBuf>,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            vision_weight: DEFAULT_VISION_WEIGHT,
            spectral_weight: DEFAULT_SPECTRAL_WEIGHT,
            policy: FusionPolicy::default(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mock: true,
            device_id: None,
            api_url: None,
            seed: None,
        }
    }
}

impl FusionConfig {
    pub fn weights(&self) -> Result<FusionWeights, ConfigError> {
        Ok(FusionWeights::new(self.vision_weight, self.spectral_weight)?)
    }
}

impl Config {
    /// Load the user config file, falling back to defaults.
    pub fn load() -> Self {
        if let Some(config_path) = Self::config_file_path()
            && config_path.exists()
        {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => warn!("ignoring config file: {}", e),
            }
        }
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `NIR_ENABLED`, `NIR_MOCK_MODE`, `NIR_DEVICE_ID` and `NIR_API_URL`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(enabled) = env_flag("NIR_ENABLED") {
            self.scanner.enabled = enabled;
        }
        if let Some(mock) = env_flag("NIR_MOCK_MODE") {
            self.scanner.mock = mock;
        }
        if let Some(device_id) = env_value("NIR_DEVICE_ID") {
            self.scanner.device_id = Some(device_id);
        }
        if let Some(api_url) = env_value("NIR_API_URL") {
            self.scanner.api_url = Some(api_url);
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(config_path) = Self::config_file_path() {
            self.save_to(&config_path)?;
        }
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io_error)
    }

    /// Engine with the configured weights and policy.
    pub fn build_engine(&self) -> Result<FusionEngine, ConfigError> {
        let weights = self.fusion.weights()?;
        Ok(FusionEngine::with_weights(weights).with_policy(self.fusion.policy.clone()))
    }

    pub fn class_table(&self) -> ClassTable {
        match &self.classes.data_yaml {
            Some(path) => ClassTable::load(path),
            None => ClassTable::builtin(),
        }
    }

    fn config_file_path() -> Option<PathBuf> {
        Self::config_dir().map(|mut path| {
            path.push("config.toml");
            path
        })
    }

    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("ripesense");
            path
        })
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str) -> Option<bool> {
    env_value(key).map(|v| v.trim().eq_ignore_ascii_case("true"))
}
