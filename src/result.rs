use crate::detection::{BoundingBox, Detection};
use crate::quality::QualityStatus;
use crate::ripeness::Ripeness;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifies the algorithm that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FusionMethod {
    WeightedAverage,
    VisionOnly,
}

/// Whether vision and spectral ripeness agreed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Agreement {
    High,
    Moderate,
}

/// Final verdict for one detected object.
///
/// Field names are consumed by persistence and presentation layers; the
/// `nir_*` fields and `agreement` are absent on vision-only results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FusedResult {
    #[schemars(with = "[f32; 4]")]
    pub bbox: BoundingBox,
    pub class_id: u32,
    pub class_name: String,
    pub fruit_type: String,
    pub confidence: f32,
    pub yolo_confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nir_confidence: Option<f32>,
    pub quality_status: QualityStatus,
    pub ripeness: Ripeness,
    pub yolo_ripeness: Ripeness,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nir_ripeness: Option<Ripeness>,
    pub ripeness_confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nir_quality_score: Option<f32>,
    pub fusion_method: FusionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agreement: Option<Agreement>,
}

impl FusedResult {
    /// Pass a vision detection through untouched by spectral data.
    pub fn vision_only(detection: &Detection) -> Self {
        Self {
            bbox: detection.bbox,
            class_id: detection.class_id,
            class_name: detection.class_name.clone(),
            fruit_type: detection.fruit_type.clone(),
            confidence: detection.confidence,
            yolo_confidence: detection.confidence,
            nir_confidence: None,
            quality_status: detection.quality_status,
            ripeness: detection.ripeness,
            yolo_ripeness: detection.ripeness,
            nir_ripeness: None,
            ripeness_confidence: detection.confidence,
            nir_quality_score: None,
            fusion_method: FusionMethod::VisionOnly,
            agreement: None,
        }
    }

    pub fn is_fused(&self) -> bool {
        self.fusion_method == FusionMethod::WeightedAverage
    }
}
