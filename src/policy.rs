//! Tunable constants of the fusion rules.
//!
//! The weight pair is validated on construction; everything else is a plain
//! named value with the historical default, overridable from configuration.

use crate::errors::FusionError;
use crate::quality::{PartialThresholds, QualityThresholds, VisionBaseScores};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_VISION_WEIGHT: f32 = 0.6;
pub const DEFAULT_SPECTRAL_WEIGHT: f32 = 0.4;

/// Allowed deviation of `vision + spectral` from 1.0.
pub const WEIGHT_SUM_TOLERANCE: f32 = 0.01;

/// Confidence lead one sensor needs to win a ripeness disagreement outright.
pub const AGREEMENT_MARGIN: f32 = 0.2;

/// Added to the mean confidence when both sensors agree on ripeness.
pub const AGREEMENT_BONUS: f32 = 0.1;

/// Vision/spectral weight pair, always summing to 1.0 within tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FusionWeights {
    vision: f32,
    spectral: f32,
}

impl FusionWeights {
    pub fn new(vision: f32, spectral: f32) -> Result<Self, FusionError> {
        if (vision + spectral - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            Ok(Self { vision, spectral })
        } else {
            Err(FusionError::InvalidWeights { vision, spectral })
        }
    }

    pub fn vision(&self) -> f32 {
        self.vision
    }

    pub fn spectral(&self) -> f32 {
        self.spectral
    }

    // Packed so the engine can swap both halves in one atomic store.
    pub(crate) fn to_bits(self) -> u64 {
        (u64::from(self.vision.to_bits()) << 32) | u64::from(self.spectral.to_bits())
    }

    pub(crate) fn from_bits(bits: u64) -> Self {
        Self {
            vision: f32::from_bits((bits >> 32) as u32),
            spectral: f32::from_bits(bits as u32),
        }
    }
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            vision: DEFAULT_VISION_WEIGHT,
            spectral: DEFAULT_SPECTRAL_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionPolicy {
    pub agreement_margin: f32,
    pub agreement_bonus: f32,
    #[serde(deserialize_with = "spectral_thresholds")]
    pub spectral_quality_thresholds: QualityThresholds,
    #[serde(deserialize_with = "blended_thresholds")]
    pub blended_quality_thresholds: QualityThresholds,
    pub vision_base_scores: VisionBaseScores,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            agreement_margin: AGREEMENT_MARGIN,
            agreement_bonus: AGREEMENT_BONUS,
            spectral_quality_thresholds: QualityThresholds::SPECTRAL,
            blended_quality_thresholds: QualityThresholds::BLENDED,
            vision_base_scores: VisionBaseScores::default(),
        }
    }
}

fn spectral_thresholds<'de, D>(deserializer: D) -> Result<QualityThresholds, D::Error>
where
    D: Deserializer<'de>,
{
    PartialThresholds::deserialize(deserializer).map(|t| t.over(QualityThresholds::SPECTRAL))
}

fn blended_thresholds<'de, D>(deserializer: D) -> Result<QualityThresholds, D::Error>
where
    D: Deserializer<'de>,
{
    PartialThresholds::deserialize(deserializer).map(|t| t.over(QualityThresholds::BLENDED))
}
