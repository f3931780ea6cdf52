use crate::config::ScannerConfig;
use crate::ripeness::Ripeness;
use log::warn;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod device;
pub mod mock;
pub mod replay;

pub use device::DeviceScanner;
pub use mock::MockScanner;
pub use replay::ReplayScanner;

/// Per-region ripeness and quality estimate from reflectance data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SpectralAnalysis {
    pub ripeness_score: f32,
    pub ripeness_category: Ripeness,
    pub quality_score: f32,
    pub confidence: f32,
}

impl SpectralAnalysis {
    /// Stand-in reading used when a scan fails.
    pub fn neutral() -> Self {
        Self {
            ripeness_score: 0.5,
            ripeness_category: Ripeness::Unknown,
            quality_score: 0.5,
            confidence: 0.5,
        }
    }
}

/// Secondary measurements reported alongside an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralMetrics {
    pub sugar_content: f32,
    pub moisture_content: f32,
    pub mean_reflectance: f32,
    pub std_reflectance: f32,
}

/// Integer pixel region handed to the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRegion {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralScan {
    pub spectral_data: Vec<f32>,
    pub wavelengths: Vec<f32>,
    pub analysis: SpectralAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SpectralMetrics>,
    pub region: Option<ScanRegion>,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScanError {
    #[error("spectral scanner not connected")]
    NotConnected,
    #[error("spectral scanner unavailable: {0}")]
    Unavailable(String),
    #[error("{0} is not implemented for this scanner")]
    NotImplemented(&'static str),
    #[error("no spectral data available, run a scan first")]
    NoData,
}

/// Anything that can take a spectral reading of an image region.
pub trait SpectralScanner {
    fn name(&self) -> &'static str;
    fn connect(&mut self) -> Result<(), ScanError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn scan(&mut self, region: Option<ScanRegion>) -> Result<SpectralScan, ScanError>;

    /// Raw reflectance values of the most recent scan.
    fn spectral_data(&self) -> Result<Vec<f32>, ScanError>;

    /// Derive ripeness and quality from a reflectance spectrum.
    fn analyze(
        &mut self,
        spectrum: &[f32],
    ) -> Result<(SpectralAnalysis, SpectralMetrics), ScanError>;
}

/// Pick the scanner implementation named by configuration.
pub fn create_scanner(config: &ScannerConfig) -> Box<dyn SpectralScanner> {
    let mock = || match config.seed {
        Some(seed) => MockScanner::seeded(seed),
        None => MockScanner::new(),
    };

    if !config.enabled {
        warn!("spectral scanner disabled in configuration, falling back to mock scanner");
        return Box::new(mock());
    }

    if config.mock {
        Box::new(mock())
    } else {
        Box::new(DeviceScanner::new(
            config.device_id.clone(),
            config.api_url.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_analysis() {
        let analysis = SpectralAnalysis::neutral();
        assert_eq!(analysis.ripeness_score, 0.5);
        assert_eq!(analysis.ripeness_category, Ripeness::Unknown);
        assert_eq!(analysis.quality_score, 0.5);
        assert_eq!(analysis.confidence, 0.5);
    }

    #[test]
    fn factory_defaults_to_mock() {
        let scanner = create_scanner(&ScannerConfig::default());
        assert_eq!(scanner.name(), "mock");
    }

    #[test]
    fn factory_uses_mock_when_disabled() {
        let config = ScannerConfig {
            enabled: false,
            mock: false,
            ..ScannerConfig::default()
        };
        assert_eq!(create_scanner(&config).name(), "mock");
    }

    #[test]
    fn factory_builds_device_scanner() {
        let config = ScannerConfig {
            mock: false,
            device_id: Some("NIR-01".into()),
            ..ScannerConfig::default()
        };
        let mut scanner = create_scanner(&config);
        assert_eq!(scanner.name(), "device");
        assert_eq!(scanner.scan(None), Err(ScanError::NotConnected));
    }

    #[test]
    fn analysis_deserializes_from_json() {
        let analysis: SpectralAnalysis = serde_json::from_str(
            r#"{"ripeness_score":0.7,"ripeness_category":"Half-Ripe","quality_score":0.6,"confidence":0.8}"#,
        )
        .unwrap();
        assert_eq!(analysis.ripeness_category, Ripeness::HalfRipe);
        assert_eq!(analysis.confidence, 0.8);
    }
}
