//! Compound class labels such as `"Mango Overripe"`.
//!
//! Detector class tables name each class `"{FruitType} {RipenessWord}"`, but
//! upstream tables are not always consistent about it. Parsing here is
//! best-effort and never fails: an unrecognised label still yields a fruit
//! type and an `Unknown` ripeness.

use crate::errors::ConfigError;
use crate::quality::QualityStatus;
use crate::ripeness::Ripeness;
use log::warn;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

/// Ripeness words that may appear in a class name, most specific first.
pub const RIPENESS_KEYWORDS: &[&str] = &[
    "overripe",
    "over-ripe",
    "half-ripe",
    "half ripe",
    "underripe",
    "unripe",
    "ripe",
    "rotten",
    "fresh",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLabel {
    pub class_name: String,
    pub fruit_type: String,
    pub ripeness: Ripeness,
    pub quality_status: QualityStatus,
}

pub fn parse_class_name(class_name: &str) -> ParsedLabel {
    let (quality_status, ripeness) = classify_label(class_name);
    ParsedLabel {
        class_name: class_name.to_string(),
        fruit_type: extract_fruit_type(class_name),
        ripeness,
        quality_status,
    }
}

/// Derive the vision quality status and ripeness from a class name.
pub fn classify_label(class_name: &str) -> (QualityStatus, Ripeness) {
    let lower = class_name.to_lowercase();

    if lower.contains("unripe") {
        (QualityStatus::Unripe, Ripeness::Unripe)
    } else if lower.contains("overripe") || lower.contains("over-ripe") {
        (QualityStatus::Overripe, Ripeness::Overripe)
    } else if lower.contains("ripe") {
        if lower.contains("half-ripe") || lower.contains("half ripe") {
            (QualityStatus::Ripe, Ripeness::HalfRipe)
        } else {
            (QualityStatus::Ripe, Ripeness::Ripe)
        }
    } else if lower.contains("rotten") {
        (QualityStatus::Rotten, Ripeness::Overripe)
    } else if lower.contains("fresh") {
        (QualityStatus::Fresh, Ripeness::Ripe)
    } else {
        (QualityStatus::Unknown, Ripeness::Unknown)
    }
}

/// Strip the ripeness word from a class name, leaving the fruit type.
pub fn extract_fruit_type(class_name: &str) -> String {
    let parts: Vec<&str> = class_name.split_whitespace().collect();
    if parts.len() < 2 {
        return class_name.to_string();
    }

    let last = parts[parts.len() - 1].to_lowercase();
    if RIPENESS_KEYWORDS.iter().any(|kw| last.contains(kw)) {
        return parts[..parts.len() - 1].join(" ");
    }

    if let Some(stripped) = strip_keyword_anywhere(class_name) {
        return stripped;
    }

    parts[..parts.len() - 1].join(" ")
}

/// End, start and middle patterns for each ripeness keyword, with the text
/// that replaces a match.
static KEYWORD_PATTERNS: LazyLock<Vec<(&'static str, [(Regex, &'static str); 3])>> =
    LazyLock::new(|| {
        RIPENESS_KEYWORDS
            .iter()
            .map(|keyword| {
                let kw = regex::escape(keyword);
                let compile = |pattern: String| Regex::new(&pattern).expect("keyword regex");
                (
                    *keyword,
                    [
                        (compile(format!(r"(?i)\s+{kw}\s*$")), ""),
                        (compile(format!(r"(?i)^\s*{kw}\s+")), ""),
                        (compile(format!(r"(?i)\s+{kw}\s+")), " "),
                    ],
                )
            })
            .collect()
    });

fn strip_keyword_anywhere(class_name: &str) -> Option<String> {
    let lower = class_name.to_lowercase();

    for (_, patterns) in KEYWORD_PATTERNS
        .iter()
        .filter(|(keyword, _)| lower.contains(*keyword))
    {
        for (re, replacement) in patterns {
            let stripped = re.replace_all(class_name, *replacement);
            if stripped != class_name {
                return Some(stripped.trim().to_string());
            }
        }
    }

    None
}

/// Mapping from detector class id to compound class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassTable {
    names: BTreeMap<u32, String>,
}

const BUILTIN_FRUITS: [&str; 5] = ["Banana", "Mango", "Cashew", "Cacao", "Pineapple"];
const BUILTIN_STAGES: [&str; 3] = ["Unripe", "Ripe", "Overripe"];

impl ClassTable {
    pub fn new(names: impl IntoIterator<Item = (u32, String)>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|(id, name)| (id, name.trim().to_string()))
                .collect(),
        }
    }

    /// The 15-class fruit ripeness table the detector ships with.
    pub fn builtin() -> Self {
        let names = BUILTIN_FRUITS
            .iter()
            .flat_map(|fruit| {
                BUILTIN_STAGES
                    .iter()
                    .map(move |stage| format!("{fruit} {stage}"))
            })
            .enumerate()
            .map(|(id, name)| (id as u32, name));
        Self::new(names)
    }

    /// Parse the `names` section of a YOLO `data.yaml`.
    ///
    /// Accepts either an id → name map or a plain list. Entries whose id is
    /// not a non-negative integer are skipped.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let doc: serde_yaml::Value = serde_yaml::from_str(yaml)?;
        let mut names = BTreeMap::new();

        match doc.get("names") {
            Some(serde_yaml::Value::Mapping(map)) => {
                for (key, value) in map {
                    let id = match key {
                        serde_yaml::Value::Number(n) => n.as_u64(),
                        serde_yaml::Value::String(s) => s.trim().parse().ok(),
                        _ => None,
                    };
                    match (id.and_then(|id| u32::try_from(id).ok()), yaml_scalar(value)) {
                        (Some(id), Some(name)) => {
                            names.insert(id, name);
                        }
                        _ => warn!("skipping invalid class entry {:?}: {:?}", key, value),
                    }
                }
            }
            Some(serde_yaml::Value::Sequence(list)) => {
                for (id, value) in list.iter().enumerate() {
                    match yaml_scalar(value) {
                        Some(name) => {
                            names.insert(id as u32, name);
                        }
                        None => warn!("skipping invalid class entry {}: {:?}", id, value),
                    }
                }
            }
            _ => {}
        }

        Ok(Self::new(names))
    }

    /// Load a class table from disk, falling back to the built-in table.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "could not read class table {}: {}, using built-in classes",
                    path.display(),
                    e
                );
                return Self::builtin();
            }
        };

        match Self::from_yaml_str(&content) {
            Ok(table) if !table.is_empty() => table,
            Ok(_) => {
                warn!(
                    "no class names found in {}, using built-in classes",
                    path.display()
                );
                Self::builtin()
            }
            Err(e) => {
                warn!("{} in {}, using built-in classes", e, path.display());
                Self::builtin()
            }
        }
    }

    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    /// Class name for an id, with a synthetic name for unknown ids.
    pub fn name_for(&self, class_id: u32) -> String {
        match self.get(class_id) {
            Some(name) => name.to_string(),
            None => {
                let name = format!("Class_{class_id}");
                warn!("class id {} not in class table, using {}", class_id, name);
                name
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }
}

impl Default for ClassTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
