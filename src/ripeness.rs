use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maturity label reported by either sensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
pub enum Ripeness {
    Unripe,
    #[serde(rename = "Half-Ripe")]
    HalfRipe,
    Ripe,
    Overripe,
    #[default]
    Unknown,
}

impl Ripeness {
    pub fn label(&self) -> &'static str {
        match self {
            Ripeness::Unripe => "Unripe",
            Ripeness::HalfRipe => "Half-Ripe",
            Ripeness::Ripe => "Ripe",
            Ripeness::Overripe => "Overripe",
            Ripeness::Unknown => "Unknown",
        }
    }

    /// Position of this label on the ordered maturity scale, if it has one.
    pub fn stage(&self) -> Option<RipenessStage> {
        normalize_stage(self.label())
    }
}

impl fmt::Display for Ripeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ordered maturity scale used for agreement checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RipenessStage {
    Unripe,
    HalfRipe,
    Ripe,
    Overripe,
}

impl RipenessStage {
    pub const ORDER: [RipenessStage; 4] = [
        RipenessStage::Unripe,
        RipenessStage::HalfRipe,
        RipenessStage::Ripe,
        RipenessStage::Overripe,
    ];

    pub fn position(&self) -> usize {
        *self as usize
    }
}

const UNRIPE_KEYWORDS: &[&str] = &["unripe", "underripe"];
const HALF_RIPE_KEYWORDS: &[&str] = &["half-ripe", "half ripe"];
const OVERRIPE_KEYWORDS: &[&str] = &["overripe", "over-ripe"];

/// Map a free-text ripeness label onto the ordered scale.
///
/// Matching is case-insensitive and the first rule that fires wins:
/// unripe, then half-ripe, then plain "ripe" (only when no overripe keyword
/// is present), then overripe. Quality words such as "rotten" or "fresh"
/// have no stage and yield `None`.
pub fn normalize_stage(text: &str) -> Option<RipenessStage> {
    let text = text.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|kw| text.contains(kw));

    if has_any(UNRIPE_KEYWORDS) {
        Some(RipenessStage::Unripe)
    } else if has_any(HALF_RIPE_KEYWORDS) {
        Some(RipenessStage::HalfRipe)
    } else if text.contains("ripe") && !has_any(OVERRIPE_KEYWORDS) {
        Some(RipenessStage::Ripe)
    } else if has_any(OVERRIPE_KEYWORDS) {
        Some(RipenessStage::Overripe)
    } else {
        None
    }
}

/// Whether two stages agree: identical, or adjacent on the scale.
///
/// Two missing stages count as identical. One missing stage never agrees.
pub fn stages_agree(a: Option<RipenessStage>, b: Option<RipenessStage>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.position().abs_diff(b.position()) <= 1,
        (None, None) => true,
        _ => false,
    }
}

/// Agreement check over two free-text labels.
pub fn labels_agree(a: &str, b: &str) -> bool {
    stages_agree(normalize_stage(a), normalize_stage(b))
}
