use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum FusionError {
    #[error("fusion weights must sum to 1.0 (got vision={vision}, spectral={spectral})")]
    InvalidWeights { vision: f32, spectral: f32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid class table: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Fusion(#[from] FusionError),
}
