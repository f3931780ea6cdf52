pub mod config;
pub mod detection;
pub mod engine;
pub mod errors;
pub mod labels;
pub mod policy;
pub mod quality;
pub mod result;
pub mod ripeness;
pub mod spectral;
pub mod summary;

pub use config::Config;
pub use detection::{BoundingBox, Detection, RawDetection};
pub use engine::{FusionEngine, combine_confidence, resolve_ripeness};
pub use errors::{ConfigError, FusionError};
pub use policy::{FusionPolicy, FusionWeights};
pub use quality::QualityStatus;
pub use result::{Agreement, FusedResult, FusionMethod};
pub use ripeness::{Ripeness, RipenessStage};
pub use spectral::{ScanError, SpectralAnalysis, SpectralScanner};
pub use summary::ScanSummary;
