//! Beam metrics from a finished phase sweep.
//!
//! [`BeamAnalyzer::analyze`] finds the strongest sample of a
//! [`SweepCurve`] and the half-power (-3 dB) beamwidth around it, both in
//! commanded phase and in steering angle. Powers are linear, so half power
//! is `peak / 2`.
//!
//! Crossings are found by walking outward from the peak to the first
//! sample strictly below half power and interpolating linearly against its
//! inner neighbour. When the beam runs off one end of the sweep the width
//! is measured on the side that crosses and doubled, and the result is
//! marked [`BeamMetrics::boundary_limited`].

use crate::angle::{self, AnglePolicy};
use crate::curve::{PhaseSample, SweepCurve};
use crate::error::{Error, Result};

/// Fewest samples for which a beamwidth is defined.
pub const MIN_CURVE_LEN: usize = 3;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamMetrics {
    pub peak_phase_deg: f64,
    pub peak_power: f64,
    pub hpbw_phase_deg: f64,
    pub peak_angle_deg: f64,
    pub hpbw_angle_deg: f64,
    /// Half-power crossing below the peak, in phase. Mirrored about the
    /// peak when the curve never crosses on that side.
    pub left_crossing_deg: f64,
    pub right_crossing_deg: f64,
    /// At least one crossing lies outside the swept range.
    pub boundary_limited: bool,
}

impl BeamMetrics {
    pub fn half_power(&self) -> f64 {
        self.peak_power / 2.0
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BeamAnalyzer {
    spacing: f64,
    policy: AnglePolicy,
}

impl BeamAnalyzer {
    /// `spacing` is the element spacing in wavelengths (d/λ).
    pub fn new(spacing: f64) -> Self {
        BeamAnalyzer { spacing, policy: AnglePolicy::Strict }
    }

    /// Clamp the arcsin argument instead of failing when a phase has no
    /// real steering angle.
    pub fn saturating(mut self, saturate: bool) -> Self {
        self.policy = if saturate {
            AnglePolicy::Saturate
        } else {
            AnglePolicy::Strict
        };
        self
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn analyze(&self, curve: &SweepCurve) -> Result<BeamMetrics> {
        angle::check_spacing(self.spacing)?;
        let samples = curve.samples();
        if samples.len() < MIN_CURVE_LEN {
            return Err(Error::EmptyCurve { len: samples.len() });
        }

        let peak_idx = peak_index(samples);
        let peak = samples[peak_idx];
        let half = peak.power() / 2.0;

        let left = left_crossing(samples, peak_idx, half);
        let right = right_crossing(samples, peak_idx, half);
        let to_angle = |phase| angle::steering_angle(phase, self.spacing, self.policy);
        let peak_angle = to_angle(peak.phase_deg())?;

        let p = peak.phase_deg();
        let (left, right, hpbw_angle, limited) = match (left, right) {
            (Some(l), Some(r)) => (l, r, to_angle(r)? - to_angle(l)?, false),
            (None, Some(r)) => {
                let a = 2.0 * (to_angle(r)? - peak_angle).abs();
                (2.0 * p - r, r, a, true)
            }
            (Some(l), None) => {
                let a = 2.0 * (peak_angle - to_angle(l)?).abs();
                (l, 2.0 * p - l, a, true)
            }
            (None, None) => {
                let first = samples[0].phase_deg();
                let last = samples[samples.len() - 1].phase_deg();
                (first, last, to_angle(last)? - to_angle(first)?, true)
            }
        };

        Ok(BeamMetrics {
            peak_phase_deg: p,
            peak_power: peak.power(),
            hpbw_phase_deg: right - left,
            peak_angle_deg: peak_angle,
            hpbw_angle_deg: hpbw_angle,
            left_crossing_deg: left,
            right_crossing_deg: right,
            boundary_limited: limited,
        })
    }
}

/// Strongest sample; ties go to the smallest |phase|, then to the first
/// in sweep order.
fn peak_index(samples: &[PhaseSample]) -> usize {
    let mut best = 0;
    for (i, s) in samples.iter().enumerate().skip(1) {
        let b = &samples[best];
        let closer = s.phase_deg().abs() < b.phase_deg().abs();
        if s.power() > b.power() || (s.power() == b.power() && closer) {
            best = i;
        }
    }
    best
}

fn interpolate(half: f64, inner: &PhaseSample, outer: &PhaseSample) -> f64 {
    let (p0, p1) = (inner.power(), outer.power());
    let t = (p0 - half) / (p0 - p1);
    inner.phase_deg() + t * (outer.phase_deg() - inner.phase_deg())
}

fn left_crossing(samples: &[PhaseSample], peak: usize, half: f64) -> Option<f64> {
    (0..peak).rev()
        .find(|&i| samples[i].power() < half)
        .map(|i| interpolate(half, &samples[i + 1], &samples[i]))
}

fn right_crossing(samples: &[PhaseSample], peak: usize, half: f64) -> Option<f64> {
    (peak + 1..samples.len())
        .find(|&i| samples[i].power() < half)
        .map(|i| interpolate(half, &samples[i - 1], &samples[i]))
}
