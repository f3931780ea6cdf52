use super::{ScanError, ScanRegion, SpectralAnalysis, SpectralMetrics, SpectralScan, SpectralScanner};
use crate::ripeness::Ripeness;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const BAND_COUNT: usize = 100;
pub const WAVELENGTH_START_NM: f32 = 700.0;
pub const WAVELENGTH_END_NM: f32 = 2500.0;

const WATER_BANDS: std::ops::Range<usize> = 20..30;
const WATER_ABSORPTION: f32 = -0.1;
const SUGAR_BANDS: std::ops::Range<usize> = 50..60;
const SUGAR_ABSORPTION: f32 = -0.15;

/// Simulated NIR scanner producing plausible random spectra.
pub struct MockScanner {
    connected: bool,
    rng: StdRng,
    wavelengths: Vec<f32>,
    last_spectrum: Option<Vec<f32>>,
}

impl MockScanner {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Reproducible scanner: the same seed yields the same readings.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let step = (WAVELENGTH_END_NM - WAVELENGTH_START_NM) / (BAND_COUNT - 1) as f32;
        let wavelengths = (0..BAND_COUNT)
            .map(|i| WAVELENGTH_START_NM + step * i as f32)
            .collect();

        Self {
            connected: false,
            rng,
            wavelengths,
            last_spectrum: None,
        }
    }

    pub fn wavelengths(&self) -> &[f32] {
        &self.wavelengths
    }

    fn generate_spectrum(&mut self) -> Vec<f32> {
        (0..BAND_COUNT)
            .map(|band| {
                let base: f32 = self.rng.random_range(0.3..0.7);
                let absorption = if WATER_BANDS.contains(&band) {
                    WATER_ABSORPTION
                } else if SUGAR_BANDS.contains(&band) {
                    SUGAR_ABSORPTION
                } else {
                    0.0
                };
                (base + absorption).clamp(0.0, 1.0)
            })
            .collect()
    }
}

impl Default for MockScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Bucket a continuous ripeness score into a label and its quality score.
pub fn categorize_ripeness_score(score: f32) -> (Ripeness, f32) {
    if score < 0.4 {
        (Ripeness::Unripe, 0.3)
    } else if score < 0.6 {
        (Ripeness::HalfRipe, 0.6)
    } else if score < 0.8 {
        (Ripeness::Ripe, 0.85)
    } else {
        (Ripeness::Overripe, 0.5)
    }
}

fn mean_and_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}

impl SpectralScanner for MockScanner {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn connect(&mut self) -> Result<(), ScanError> {
        self.connected = true;
        info!("mock spectral scanner connected");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        info!("mock spectral scanner disconnected");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn scan(&mut self, region: Option<ScanRegion>) -> Result<SpectralScan, ScanError> {
        if !self.connected {
            self.connect()?;
        }

        let spectrum = self.generate_spectrum();
        let (analysis, metrics) = self.analyze(&spectrum)?;
        debug!(
            "mock scan of {:?}: {} ({:.2})",
            region, analysis.ripeness_category, analysis.ripeness_score
        );
        self.last_spectrum = Some(spectrum.clone());

        Ok(SpectralScan {
            spectral_data: spectrum,
            wavelengths: self.wavelengths.clone(),
            analysis,
            metrics: Some(metrics),
            region,
        })
    }

    fn spectral_data(&self) -> Result<Vec<f32>, ScanError> {
        self.last_spectrum.clone().ok_or(ScanError::NoData)
    }

    fn analyze(
        &mut self,
        spectrum: &[f32],
    ) -> Result<(SpectralAnalysis, SpectralMetrics), ScanError> {
        let (mean_reflectance, std_reflectance) = mean_and_std(spectrum);

        let ripeness_score: f32 = self.rng.random_range(0.3..0.9);
        let (ripeness_category, quality_score) = categorize_ripeness_score(ripeness_score);

        let metrics = SpectralMetrics {
            sugar_content: ripeness_score * 20.0,
            moisture_content: self.rng.random_range(70.0..90.0),
            mean_reflectance,
            std_reflectance,
        };

        let analysis = SpectralAnalysis {
            ripeness_score,
            ripeness_category,
            quality_score,
            confidence: self.rng.random_range(0.7..0.95),
        };

        Ok((analysis, metrics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wavelengths_span_nir_range() {
        let scanner = MockScanner::seeded(1);
        let wavelengths = scanner.wavelengths();
        assert_eq!(wavelengths.len(), BAND_COUNT);
        assert_eq!(wavelengths[0], WAVELENGTH_START_NM);
        assert!((wavelengths[BAND_COUNT - 1] - WAVELENGTH_END_NM).abs() < 1e-2);
    }

    #[test]
    fn scan_connects_lazily() {
        let mut scanner = MockScanner::seeded(7);
        assert!(!scanner.is_connected());
        scanner.scan(None).unwrap();
        assert!(scanner.is_connected());
    }

    #[test]
    fn scan_produces_values_in_range() {
        let mut scanner = MockScanner::seeded(42);
        for _ in 0..50 {
            let scan = scanner.scan(None).unwrap();
            assert_eq!(scan.spectral_data.len(), BAND_COUNT);
            assert!(scan.spectral_data.iter().all(|v| (0.0..=1.0).contains(v)));

            let analysis = &scan.analysis;
            assert!((0.3..0.9).contains(&analysis.ripeness_score));
            assert!((0.7..0.95).contains(&analysis.confidence));
            assert_ne!(analysis.ripeness_category, Ripeness::Unknown);

            let metrics = scan.metrics.unwrap();
            assert!((70.0..90.0).contains(&metrics.moisture_content));
            assert!((metrics.sugar_content - analysis.ripeness_score * 20.0).abs() < 1e-4);
        }
    }

    #[test]
    fn absorption_bands_are_darker() {
        let mut scanner = MockScanner::seeded(3);
        let spectrum = scanner.scan(None).unwrap().spectral_data;
        // Base reflectance never exceeds 0.7, so absorbed bands stay below it.
        assert!(spectrum[WATER_BANDS].iter().all(|v| *v < 0.6));
        assert!(spectrum[SUGAR_BANDS].iter().all(|v| *v < 0.55));
    }

    #[test]
    fn seeded_scanners_are_reproducible() {
        let mut a = MockScanner::seeded(99);
        let mut b = MockScanner::seeded(99);
        assert_eq!(a.scan(None).unwrap(), b.scan(None).unwrap());
    }

    #[test]
    fn spectral_data_requires_a_scan() {
        let mut scanner = MockScanner::seeded(5);
        assert_eq!(scanner.spectral_data(), Err(ScanError::NoData));
        let scan = scanner.scan(None).unwrap();
        assert_eq!(scanner.spectral_data().unwrap(), scan.spectral_data);
    }

    #[test]
    fn region_is_echoed() {
        let mut scanner = MockScanner::seeded(5);
        let region = ScanRegion {
            x1: 1,
            y1: 2,
            x2: 30,
            y2: 40,
        };
        assert_eq!(scanner.scan(Some(region)).unwrap().region, Some(region));
    }

    #[test]
    fn ripeness_score_buckets() {
        assert_eq!(categorize_ripeness_score(0.35), (Ripeness::Unripe, 0.3));
        assert_eq!(categorize_ripeness_score(0.4), (Ripeness::HalfRipe, 0.6));
        assert_eq!(categorize_ripeness_score(0.7), (Ripeness::Ripe, 0.85));
        assert_eq!(categorize_ripeness_score(0.85), (Ripeness::Overripe, 0.5));
    }

    #[test]
    fn disconnect_clears_connection() {
        let mut scanner = MockScanner::seeded(5);
        scanner.connect().unwrap();
        scanner.disconnect();
        assert!(!scanner.is_connected());
    }
}
