use crate::policy::{FusionPolicy, FusionWeights};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete freshness verdict, distinct from the maturity label.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityStatus {
    Fresh,
    Ripe,
    Unripe,
    Overripe,
    Rotten,
    #[default]
    Unknown,
}

impl QualityStatus {
    pub const ALL: [QualityStatus; 6] = [
        QualityStatus::Fresh,
        QualityStatus::Ripe,
        QualityStatus::Unripe,
        QualityStatus::Overripe,
        QualityStatus::Rotten,
        QualityStatus::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityStatus::Fresh => "fresh",
            QualityStatus::Ripe => "ripe",
            QualityStatus::Unripe => "unripe",
            QualityStatus::Overripe => "overripe",
            QualityStatus::Rotten => "rotten",
            QualityStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for QualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lower bounds for mapping a continuous score onto a status.
///
/// A score at or above `fresh` is fresh, at or above `ripe` is ripe, at or
/// above `unripe` is unripe; anything lower is overripe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    pub fresh: f32,
    pub ripe: f32,
    pub unripe: f32,
}

impl QualityThresholds {
    /// Bounds applied to the raw spectral quality score.
    pub const SPECTRAL: Self = Self {
        fresh: 0.8,
        ripe: 0.6,
        unripe: 0.4,
    };

    /// Bounds applied to the blended score after a disagreement.
    pub const BLENDED: Self = Self {
        fresh: 0.75,
        ripe: 0.55,
        unripe: 0.35,
    };

    pub fn classify(&self, score: f32) -> QualityStatus {
        if score >= self.fresh {
            QualityStatus::Fresh
        } else if score >= self.ripe {
            QualityStatus::Ripe
        } else if score >= self.unripe {
            QualityStatus::Unripe
        } else {
            QualityStatus::Overripe
        }
    }
}

/// Threshold table as written in a config file. Missing bounds keep the
/// value of the table it is laid over.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PartialThresholds {
    fresh: Option<f32>,
    ripe: Option<f32>,
    unripe: Option<f32>,
}

impl PartialThresholds {
    pub(crate) fn over(self, base: QualityThresholds) -> QualityThresholds {
        QualityThresholds {
            fresh: self.fresh.unwrap_or(base.fresh),
            ripe: self.ripe.unwrap_or(base.ripe),
            unripe: self.unripe.unwrap_or(base.unripe),
        }
    }
}

/// Numeric stand-ins for the vision status when blending.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionBaseScores {
    pub fresh: f32,
    pub ripe: f32,
    pub other: f32,
}

impl VisionBaseScores {
    pub fn score_for(&self, status: QualityStatus) -> f32 {
        match status {
            QualityStatus::Fresh => self.fresh,
            QualityStatus::Ripe => self.ripe,
            _ => self.other,
        }
    }
}

impl Default for VisionBaseScores {
    fn default() -> Self {
        Self {
            fresh: 0.8,
            ripe: 0.6,
            other: 0.4,
        }
    }
}

/// Reconcile the vision status with the spectral quality score.
///
/// The spectral score is first bucketed on its own. When that bucket matches
/// the vision status it is returned as is; otherwise both signals are blended
/// with the fusion weights and the blend is bucketed again.
pub fn fuse_quality_status(
    vision: QualityStatus,
    spectral_score: f32,
    weights: FusionWeights,
    policy: &FusionPolicy,
) -> QualityStatus {
    let spectral = policy.spectral_quality_thresholds.classify(spectral_score);
    if spectral == vision {
        return vision;
    }

    let combined = spectral_score * weights.spectral()
        + policy.vision_base_scores.score_for(vision) * weights.vision();
    policy.blended_quality_thresholds.classify(combined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spectral_thresholds_bucket_scores() {
        let t = QualityThresholds::SPECTRAL;
        assert_eq!(t.classify(0.95), QualityStatus::Fresh);
        assert_eq!(t.classify(0.8), QualityStatus::Fresh);
        assert_eq!(t.classify(0.6), QualityStatus::Ripe);
        assert_eq!(t.classify(0.45), QualityStatus::Unripe);
        assert_eq!(t.classify(0.39), QualityStatus::Overripe);
        assert_eq!(t.classify(0.0), QualityStatus::Overripe);
    }

    #[test]
    fn blended_thresholds_bucket_scores() {
        let t = QualityThresholds::BLENDED;
        assert_eq!(t.classify(0.75), QualityStatus::Fresh);
        assert_eq!(t.classify(0.70), QualityStatus::Ripe);
        assert_eq!(t.classify(0.55), QualityStatus::Ripe);
        assert_eq!(t.classify(0.36), QualityStatus::Unripe);
        assert_eq!(t.classify(0.2), QualityStatus::Overripe);
    }

    #[test]
    fn matching_statuses_pass_through() {
        let policy = FusionPolicy::default();
        let status = fuse_quality_status(
            QualityStatus::Fresh,
            0.9,
            FusionWeights::default(),
            &policy,
        );
        assert_eq!(status, QualityStatus::Fresh);
    }

    #[test]
    fn disagreement_blends_scores() {
        // 0.85 buckets as fresh; blended 0.85 * 0.4 + 0.6 * 0.6 = 0.70 -> ripe
        let policy = FusionPolicy::default();
        let status = fuse_quality_status(
            QualityStatus::Ripe,
            0.85,
            FusionWeights::default(),
            &policy,
        );
        assert_eq!(status, QualityStatus::Ripe);
    }

    #[test]
    fn rotten_vision_status_uses_other_base_score() {
        // 0.3 * 0.4 + 0.4 * 0.6 = 0.36 -> unripe
        let policy = FusionPolicy::default();
        let status = fuse_quality_status(
            QualityStatus::Rotten,
            0.3,
            FusionWeights::default(),
            &policy,
        );
        assert_eq!(status, QualityStatus::Unripe);
    }

    #[test]
    fn base_scores() {
        let base = VisionBaseScores::default();
        assert_eq!(base.score_for(QualityStatus::Fresh), 0.8);
        assert_eq!(base.score_for(QualityStatus::Ripe), 0.6);
        assert_eq!(base.score_for(QualityStatus::Unripe), 0.4);
        assert_eq!(base.score_for(QualityStatus::Unknown), 0.4);
    }

    #[test]
    fn every_status_has_a_base_score() {
        let base = VisionBaseScores::default();
        for status in QualityStatus::ALL {
            let expected = match status {
                QualityStatus::Fresh => 0.8,
                QualityStatus::Ripe => 0.6,
                _ => 0.4,
            };
            assert_eq!(base.score_for(status), expected, "{status}");
        }
    }

    #[test]
    fn every_status_round_trips_through_its_name() {
        for status in QualityStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: QualityStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn partial_thresholds_keep_base_values() {
        let partial: PartialThresholds = toml::from_str("ripe = 0.5").unwrap();
        let spectral = partial.over(QualityThresholds::SPECTRAL);
        assert_eq!(
            spectral,
            QualityThresholds {
                fresh: 0.8,
                ripe: 0.5,
                unripe: 0.4
            }
        );

        let empty: PartialThresholds = toml::from_str("").unwrap();
        assert_eq!(empty.over(QualityThresholds::BLENDED), QualityThresholds::BLENDED);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&QualityStatus::Overripe).unwrap(),
            "\"overripe\""
        );
    }
}
