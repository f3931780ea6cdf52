use crate::result::FusedResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-scan tallies of what was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScanSummary {
    pub total_fruits: usize,
    pub fruit_counts: BTreeMap<String, usize>,
    pub quality_counts: BTreeMap<String, usize>,
}

impl ScanSummary {
    pub fn from_results(results: &[FusedResult]) -> Self {
        let mut summary = Self {
            total_fruits: results.len(),
            ..Self::default()
        };

        for result in results {
            let fruit = if result.fruit_type.is_empty() {
                &result.class_name
            } else {
                &result.fruit_type
            };
            *summary.fruit_counts.entry(fruit.clone()).or_default() += 1;
            *summary
                .quality_counts
                .entry(result.quality_status.to_string())
                .or_default() += 1;
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{BoundingBox, Detection};

    fn result(class_name: &str) -> FusedResult {
        FusedResult::vision_only(&Detection::new(
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
            0,
            class_name,
            0.8,
        ))
    }

    #[test]
    fn counts_by_fruit_and_quality() {
        let summary = ScanSummary::from_results(&[
            result("Banana Ripe"),
            result("Banana Unripe"),
            result("Mango Ripe"),
        ]);

        assert_eq!(summary.total_fruits, 3);
        assert_eq!(summary.fruit_counts.get("Banana"), Some(&2));
        assert_eq!(summary.fruit_counts.get("Mango"), Some(&1));
        assert_eq!(summary.quality_counts.get("ripe"), Some(&2));
        assert_eq!(summary.quality_counts.get("unripe"), Some(&1));
    }

    #[test]
    fn empty_fruit_type_falls_back_to_class_name() {
        let mut r = result("Kiwi");
        r.fruit_type.clear();
        let summary = ScanSummary::from_results(&[r]);
        assert_eq!(summary.fruit_counts.get("Kiwi"), Some(&1));
    }

    #[test]
    fn empty_scan() {
        let summary = ScanSummary::from_results(&[]);
        assert_eq!(summary, ScanSummary::default());
    }
}
