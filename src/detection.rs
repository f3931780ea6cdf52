use crate::labels::{ClassTable, parse_class_name};
use crate::quality::QualityStatus;
use crate::ripeness::Ripeness;
use crate::spectral::ScanRegion;
use log::warn;
use serde::{Deserialize, Serialize};

/// Pixel-space box `(x1, y1, x2, y2)`, serialized as a 4-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_valid(&self) -> bool {
        self.x1 < self.x2 && self.y1 < self.y2
    }

    /// Integer region for the scanner; coordinates truncate toward zero.
    pub fn to_region(&self) -> ScanRegion {
        ScanRegion {
            x1: self.x1 as i32,
            y1: self.y1 as i32,
            x2: self.x2 as i32,
            y2: self.y2 as i32,
        }
    }
}

impl From<[f32; 4]> for BoundingBox {
    fn from([x1, y1, x2, y2]: [f32; 4]) -> Self {
        Self { x1, y1, x2, y2 }
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// One object as reported by the image detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub bbox: BoundingBox,
    pub class_id: u32,
    pub confidence: f32,
    /// Overrides the class table lookup when the detector already named it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DetectionInput {
    List(Vec<RawDetection>),
    Wrapped { detections: Vec<RawDetection> },
}

/// Parse detector output: either a bare array or `{"detections": [...]}`.
pub fn parse_raw_detections(json: &str) -> Result<Vec<RawDetection>, serde_json::Error> {
    let input: DetectionInput = serde_json::from_str(json)?;
    Ok(match input {
        DetectionInput::List(detections) => detections,
        DetectionInput::Wrapped { detections } => detections,
    })
}

/// Vision record with fruit type, ripeness and quality derived from its label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub class_id: u32,
    pub class_name: String,
    pub fruit_type: String,
    pub confidence: f32,
    pub quality_status: QualityStatus,
    pub ripeness: Ripeness,
}

impl Detection {
    pub fn new(
        bbox: BoundingBox,
        class_id: u32,
        class_name: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let class_name = class_name.into();
        let parsed = parse_class_name(&class_name);
        Self {
            bbox,
            class_id,
            class_name,
            fruit_type: parsed.fruit_type,
            confidence,
            quality_status: parsed.quality_status,
            ripeness: parsed.ripeness,
        }
    }

    /// Build a detection from detector output.
    ///
    /// Confidences outside [0, 1] are clamped (NaN becomes 0) with a warning;
    /// degenerate boxes are kept but logged.
    pub fn from_raw(raw: RawDetection, classes: &ClassTable) -> Self {
        let class_name = raw
            .class_name
            .unwrap_or_else(|| classes.name_for(raw.class_id));

        if !raw.bbox.is_valid() {
            warn!("degenerate bounding box {:?} for {}", raw.bbox, class_name);
        }
        let confidence = if (0.0..=1.0).contains(&raw.confidence) {
            raw.confidence
        } else {
            warn!(
                "confidence {} for {} is outside [0, 1], clamping",
                raw.confidence, class_name
            );
            if raw.confidence.is_nan() {
                0.0
            } else {
                raw.confidence.clamp(0.0, 1.0)
            }
        };

        Self::new(raw.bbox, raw.class_id, class_name, confidence)
    }
}

pub fn prepare_detections(raw: Vec<RawDetection>, classes: &ClassTable) -> Vec<Detection> {
    raw.into_iter()
        .map(|r| Detection::from_raw(r, classes))
        .collect()
}
