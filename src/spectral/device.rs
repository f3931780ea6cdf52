use super::{ScanError, ScanRegion, SpectralAnalysis, SpectralMetrics, SpectralScan, SpectralScanner};
use log::info;

/// Hardware-backed NIR scanner.
///
/// Connection bookkeeping works, but acquisition is not wired to a device
/// driver yet, so every scan on a connected scanner reports `NotImplemented`.
pub struct DeviceScanner {
    device_id: Option<String>,
    api_url: Option<String>,
    connected: bool,
}

impl DeviceScanner {
    pub fn new(device_id: Option<String>, api_url: Option<String>) -> Self {
        info!(
            "device spectral scanner configured (device_id: {}, api_url: {})",
            device_id.as_deref().unwrap_or("none"),
            api_url.as_deref().unwrap_or("none")
        );
        Self {
            device_id,
            api_url,
            connected: false,
        }
    }

    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    pub fn api_url(&self) -> Option<&str> {
        self.api_url.as_deref()
    }
}

impl SpectralScanner for DeviceScanner {
    fn name(&self) -> &'static str {
        "device"
    }

    fn connect(&mut self) -> Result<(), ScanError> {
        self.connected = true;
        info!("device spectral scanner connected");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        info!("device spectral scanner disconnected");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn scan(&mut self, _region: Option<ScanRegion>) -> Result<SpectralScan, ScanError> {
        if !self.connected {
            return Err(ScanError::NotConnected);
        }
        Err(ScanError::NotImplemented("device scan"))
    }

    fn spectral_data(&self) -> Result<Vec<f32>, ScanError> {
        Err(ScanError::NotImplemented("device spectral data"))
    }

    fn analyze(
        &mut self,
        _spectrum: &[f32],
    ) -> Result<(SpectralAnalysis, SpectralMetrics), ScanError> {
        Err(ScanError::NotImplemented("device ripeness analysis"))
    }
}
