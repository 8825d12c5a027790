use crate::angle;
use crate::error::{Error, Result};
use crate::metrics::BeamAnalyzer;
use crate::plan::SweepPlan;
use crate::power::{PowerExtractor, Window};
use crate::sweep::{CaptureConfig, SweepMode, DEFAULT_EVENT_CAPACITY};

use std::time::Duration;

/// Everything needed to run and analyze a sweep. Defaults follow the
/// ADALM-Pluto demo setup: 2 MS/s, a 500 kHz tone, 4096-sample captures,
/// a full-circle sweep in 2° steps and half-wavelength spacing.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepConfig {
    pub start_deg: f64,
    pub stop_deg: f64,
    pub step_deg: f64,
    pub n_samples: usize,
    pub sample_rate: f64,
    pub tone_freq: f64,
    pub mode: SweepMode,

    pub settle_captures: usize,
    pub step_delay: Duration,
    pub event_capacity: usize,

    pub window: Window,
    pub remove_dc: bool,
    pub integration_bins: usize,
    pub peak_search_bins: usize,

    /// Element spacing in wavelengths (d/λ).
    pub spacing_wavelengths: f64,
    pub saturate_angles: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        SweepConfig {
            start_deg: -180.0,
            stop_deg: 180.0,
            step_deg: 2.0,
            n_samples: 4096,
            sample_rate: 2e6,
            tone_freq: 500e3,
            mode: SweepMode::OneShot,
            settle_captures: 0,
            step_delay: Duration::from_millis(0),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            window: Window::Hann,
            remove_dc: true,
            integration_bins: 0,
            peak_search_bins: 0,
            spacing_wavelengths: 0.5,
            saturate_angles: false,
        }
    }
}

impl SweepConfig {
    /// Set the spacing from a physical element distance and carrier.
    pub fn physical_spacing(&mut self, spacing_m: f64, carrier_hz: f64) {
        self.spacing_wavelengths = angle::spacing_from_physical(spacing_m, carrier_hz);
    }

    pub fn plan(&self) -> Result<SweepPlan> {
        SweepPlan::new(self.start_deg, self.stop_deg, self.step_deg)
    }

    pub fn extractor(&self) -> PowerExtractor {
        PowerExtractor::new()
            .window(self.window)
            .remove_dc(self.remove_dc)
            .integration_bins(self.integration_bins)
            .peak_search_bins(self.peak_search_bins)
    }

    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            settle_captures: self.settle_captures,
            step_delay: self.step_delay,
            extractor: self.extractor(),
            ..CaptureConfig::new(self.n_samples, self.sample_rate, self.tone_freq)
        }
    }

    pub fn analyzer(&self) -> BeamAnalyzer {
        BeamAnalyzer::new(self.spacing_wavelengths)
            .saturating(self.saturate_angles)
    }

    /// Check the whole configuration without touching hardware.
    pub fn validate(&self) -> Result<()> {
        self.plan()?;
        self.capture().validate()?;
        if !(self.spacing_wavelengths.is_finite() && self.spacing_wavelengths > 0.0) {
            return Err(Error::invalid(format!(
                "element spacing {} wavelengths must be positive",
                self.spacing_wavelengths)));
        }
        if self.event_capacity == 0 {
            return Err(Error::invalid("event capacity must be at least 1"));
        }
        Ok(())
    }
}
