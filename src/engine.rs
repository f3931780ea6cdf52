use crate::detection::Detection;
use crate::errors::FusionError;
use crate::policy::{FusionPolicy, FusionWeights};
use crate::quality::fuse_quality_status;
use crate::result::{Agreement, FusedResult, FusionMethod};
use crate::ripeness::{Ripeness, stages_agree};
use crate::spectral::{SpectralAnalysis, SpectralScanner};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};

/// Combines vision detections with spectral readings of the same regions.
///
/// The weight pair is the only mutable state. It may be replaced through a
/// shared reference while other threads fuse; each detection works from one
/// snapshot of the pair.
pub struct FusionEngine {
    weights: AtomicU64,
    policy: FusionPolicy,
}

/// Outcome of the ripeness resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RipenessVerdict {
    pub ripeness: Ripeness,
    pub confidence: f32,
    pub agreement: Agreement,
}

impl FusionEngine {
    pub fn new() -> Self {
        Self::with_weights(FusionWeights::default())
    }

    pub fn with_weights(weights: FusionWeights) -> Self {
        Self {
            weights: AtomicU64::new(weights.to_bits()),
            policy: FusionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FusionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn weights(&self) -> FusionWeights {
        FusionWeights::from_bits(self.weights.load(Ordering::Acquire))
    }

    /// Replace the weight pair. On error the previous weights stay in effect.
    pub fn set_fusion_weights(&self, vision: f32, spectral: f32) -> Result<(), FusionError> {
        let weights = FusionWeights::new(vision, spectral)?;
        self.weights.store(weights.to_bits(), Ordering::Release);
        info!(
            "fusion weights updated: vision={}, spectral={}",
            vision, spectral
        );
        Ok(())
    }

    /// Fuse every detection with a spectral reading of its region.
    ///
    /// Output order matches input order. A failed reading is replaced by the
    /// neutral analysis for that detection only.
    pub fn fuse_detections(
        &self,
        detections: &[Detection],
        scanner: &mut dyn SpectralScanner,
    ) -> Vec<FusedResult> {
        detections
            .iter()
            .map(|detection| {
                let analysis = read_spectrum(detection, scanner);
                self.fuse_single(detection, &analysis)
            })
            .collect()
    }

    pub fn fuse_single(&self, detection: &Detection, analysis: &SpectralAnalysis) -> FusedResult {
        let weights = self.weights();
        let vision_confidence = detection.confidence;
        let spectral_confidence = analysis.confidence;

        let verdict = resolve_ripeness(
            detection.ripeness,
            analysis.ripeness_category,
            vision_confidence,
            spectral_confidence,
            &self.policy,
        );
        let quality_status = fuse_quality_status(
            detection.quality_status,
            analysis.quality_score,
            weights,
            &self.policy,
        );
        let confidence = combine_confidence(vision_confidence, spectral_confidence, weights);

        debug!(
            "fused {} at {:?}: {} / {} (confidence {:.3}, agreement {:?})",
            detection.class_name,
            detection.bbox,
            verdict.ripeness,
            quality_status,
            confidence,
            verdict.agreement
        );

        FusedResult {
            bbox: detection.bbox,
            class_id: detection.class_id,
            class_name: detection.class_name.clone(),
            fruit_type: detection.fruit_type.clone(),
            confidence,
            yolo_confidence: vision_confidence,
            nir_confidence: Some(spectral_confidence),
            quality_status,
            ripeness: verdict.ripeness,
            yolo_ripeness: detection.ripeness,
            nir_ripeness: Some(analysis.ripeness_category),
            ripeness_confidence: verdict.confidence,
            nir_quality_score: Some(analysis.quality_score),
            fusion_method: FusionMethod::WeightedAverage,
            agreement: Some(verdict.agreement),
        }
    }

    /// Results for callers running without a spectral scanner.
    pub fn vision_only(&self, detections: &[Detection]) -> Vec<FusedResult> {
        detections.iter().map(FusedResult::vision_only).collect()
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn read_spectrum(detection: &Detection, scanner: &mut dyn SpectralScanner) -> SpectralAnalysis {
    match scanner.scan(Some(detection.bbox.to_region())) {
        Ok(scan) => scan.analysis,
        Err(e) => {
            warn!(
                "spectral scan failed for region {:?}: {}, using neutral analysis",
                detection.bbox, e
            );
            SpectralAnalysis::neutral()
        }
    }
}

/// Weighted overall confidence, clamped to [0, 1].
pub fn combine_confidence(vision: f32, spectral: f32, weights: FusionWeights) -> f32 {
    (vision * weights.vision() + spectral * weights.spectral()).clamp(0.0, 1.0)
}

/// Pick the final ripeness label and its confidence.
///
/// On agreement the vision label wins and the mean confidence gets the
/// agreement bonus. On disagreement a sensor must lead by more than the
/// margin to win; otherwise the spectral label is used. The confidence is
/// clamped to [0, 1] in both branches, like `combine_confidence`.
pub fn resolve_ripeness(
    vision: Ripeness,
    spectral: Ripeness,
    vision_confidence: f32,
    spectral_confidence: f32,
    policy: &FusionPolicy,
) -> RipenessVerdict {
    let mean = (vision_confidence + spectral_confidence) / 2.0;

    if stages_agree(vision.stage(), spectral.stage()) {
        return RipenessVerdict {
            ripeness: vision,
            confidence: (mean + policy.agreement_bonus).clamp(0.0, 1.0),
            agreement: Agreement::High,
        };
    }

    let ripeness = if vision_confidence > spectral_confidence + policy.agreement_margin {
        vision
    } else {
        spectral
    };

    RipenessVerdict {
        ripeness,
        confidence: mean.clamp(0.0, 1.0),
        agreement: Agreement::Moderate,
    }
}
