use super::{ScanError, ScanRegion, SpectralAnalysis, SpectralMetrics, SpectralScan, SpectralScanner};
use std::collections::VecDeque;

/// Plays back previously recorded analyses, one per scan call.
///
/// A `None` entry stands for a reading that failed when it was recorded and
/// is reported as `Unavailable`. Scans past the end of the recording fail the
/// same way.
pub struct ReplayScanner {
    readings: VecDeque<Option<SpectralAnalysis>>,
    connected: bool,
}

impl ReplayScanner {
    pub fn new(readings: impl IntoIterator<Item = Option<SpectralAnalysis>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            connected: false,
        }
    }

    /// Parse a JSON array of analyses, where `null` marks a failed reading.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let readings: Vec<Option<SpectralAnalysis>> = serde_json::from_str(json)?;
        Ok(Self::new(readings))
    }

    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

impl SpectralScanner for ReplayScanner {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn connect(&mut self) -> Result<(), ScanError> {
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn scan(&mut self, region: Option<ScanRegion>) -> Result<SpectralScan, ScanError> {
        match self.readings.pop_front() {
            Some(Some(analysis)) => Ok(SpectralScan {
                spectral_data: Vec::new(),
                wavelengths: Vec::new(),
                analysis,
                metrics: None,
                region,
            }),
            Some(None) => Err(ScanError::Unavailable("no reading recorded".into())),
            None => Err(ScanError::Unavailable("recording exhausted".into())),
        }
    }

    fn spectral_data(&self) -> Result<Vec<f32>, ScanError> {
        Err(ScanError::NoData)
    }

    fn analyze(
        &mut self,
        _spectrum: &[f32],
    ) -> Result<(SpectralAnalysis, SpectralMetrics), ScanError> {
        Err(ScanError::NotImplemented("replay ripeness analysis"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ripeness::Ripeness;

    fn reading(category: Ripeness) -> SpectralAnalysis {
        SpectralAnalysis {
            ripeness_score: 0.7,
            ripeness_category: category,
            quality_score: 0.85,
            confidence: 0.8,
        }
    }

    #[test]
    fn replays_in_order() {
        let mut scanner =
            ReplayScanner::new(vec![Some(reading(Ripeness::Ripe)), Some(reading(Ripeness::Unripe))]);
        assert_eq!(
            scanner.scan(None).unwrap().analysis.ripeness_category,
            Ripeness::Ripe
        );
        assert_eq!(
            scanner.scan(None).unwrap().analysis.ripeness_category,
            Ripeness::Unripe
        );
        assert_eq!(scanner.remaining(), 0);
    }

    #[test]
    fn missing_readings_fail() {
        let mut scanner = ReplayScanner::new(vec![None]);
        assert!(matches!(scanner.scan(None), Err(ScanError::Unavailable(_))));
        assert!(matches!(scanner.scan(None), Err(ScanError::Unavailable(_))));
    }

    #[test]
    fn parses_json_with_gaps() {
        let scanner = ReplayScanner::from_json(
            r#"[{"ripeness_score":0.5,"ripeness_category":"Ripe","quality_score":0.85,"confidence":0.9}, null]"#,
        )
        .unwrap();
        assert_eq!(scanner.remaining(), 2);
    }
}
