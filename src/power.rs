//! Tone power measurement.
//!
//! [`PowerExtractor`] turns one receiver capture into a single linear power
//! figure at a known tone frequency. The spectrum is windowed and
//! normalized by the window sum, so a unit-amplitude tone sitting exactly
//! on a bin measures `1.0` regardless of buffer length.

use crate::error::{Error, Result};
use crate::fft;

use num::Complex;

/// Smallest capture the extractor will measure.
pub const MIN_SAMPLES: usize = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Window {
    Rectangular,
    Hann,
}

impl Window {
    pub fn coefficients(self, len: usize) -> Vec<f64> {
        match self {
            Window::Rectangular => vec![1.0; len],
            // periodic form, so an on-bin tone leaks into exactly one
            // neighbour on each side
            Window::Hann => (0..len)
                .map(|n| {
                    let x = 2.0 * std::f64::consts::PI * n as f64 / len as f64;
                    0.5 - 0.5 * x.cos()
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PowerExtractor {
    window: Window,
    remove_dc: bool,
    integration_bins: usize,
    peak_search_bins: usize,
}

impl Default for PowerExtractor {
    fn default() -> Self {
        PowerExtractor::new()
    }
}

impl PowerExtractor {
    pub fn new() -> Self {
        PowerExtractor {
            window: Window::Hann,
            remove_dc: false,
            integration_bins: 0,
            peak_search_bins: 0,
        }
    }

    pub fn window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    /// Subtract the buffer mean before transforming.
    pub fn remove_dc(mut self, remove_dc: bool) -> Self {
        self.remove_dc = remove_dc;
        self
    }

    /// Sum power over `bins` neighbours on each side of the measured bin.
    pub fn integration_bins(mut self, bins: usize) -> Self {
        self.integration_bins = bins;
        self
    }

    /// Measure at the strongest bin within `bins` of the nominal tone bin.
    pub fn peak_search_bins(mut self, bins: usize) -> Self {
        self.peak_search_bins = bins;
        self
    }

    /// Fail unless the search and integration windows each fit in a
    /// `len`-bin spectrum without wrapping onto themselves.
    pub fn check_len(&self, len: usize) -> Result<()> {
        let windows = [("integration", self.integration_bins),
                       ("peak search", self.peak_search_bins)];
        for &(name, bins) in &windows {
            let width = bins.checked_mul(2).and_then(|w| w.checked_add(1));
            match width {
                Some(w) if w <= len => (),
                _ => return Err(Error::invalid(format!(
                    "{} window of ±{} bins does not fit {} bins", name, bins, len))),
            }
        }
        Ok(())
    }

    /// Linear power at `tone_freq` in `samples`.
    pub fn extract(&self, samples: &[Complex<f64>], sample_rate: f64,
                   tone_freq: f64) -> Result<f64>
    {
        if samples.is_empty() {
            return Err(Error::invalid("empty sample buffer"));
        }
        if samples.len() < MIN_SAMPLES {
            return Err(Error::invalid(format!(
                "{} samples, need at least {}", samples.len(), MIN_SAMPLES)));
        }
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(Error::invalid(format!(
                "sample rate {} must be positive", sample_rate)));
        }
        if !(tone_freq >= 0.0 && tone_freq <= sample_rate / 2.0) {
            return Err(Error::invalid(format!(
                "tone {} Hz outside [0, {}]", tone_freq, sample_rate / 2.0)));
        }
        self.check_len(samples.len())?;
        if samples.iter().any(|v| !(v.re.is_finite() && v.im.is_finite())) {
            return Err(Error::invalid("sample buffer contains non-finite values"));
        }

        let len = samples.len();
        let mean = if self.remove_dc {
            samples.iter().fold(Complex::new(0.0, 0.0), |acc, v| acc + *v)
                / len as f64
        } else {
            Complex::new(0.0, 0.0)
        };
        let win = self.window.coefficients(len);
        let wsum: f64 = win.iter().sum();
        let windowed: Vec<Complex<f64>> = samples.iter()
            .zip(win.iter())
            .map(|(v, &w)| (*v - mean) * w)
            .collect();
        let spectrum = fft::transform(&windowed);
        let power = |i: isize| {
            let idx = i.rem_euclid(len as isize) as usize;
            (spectrum[idx] / wsum).norm_sqr()
        };

        let nominal = fft::nearest_bin(tone_freq, sample_rate, len) as isize;
        let mut center = nominal;
        let search = self.peak_search_bins as isize;
        for i in (nominal - search)..=(nominal + search) {
            if power(i) > power(center) {
                center = i;
            }
        }

        let span = self.integration_bins as isize;
        Ok(((center - span)..=(center + span)).map(power).sum())
    }
}

/// Linear power to dB, for display.
pub fn to_db(power: f64) -> f64 {
    10.0 * power.log10()
}
