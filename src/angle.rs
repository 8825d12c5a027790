//! Phase difference to steering angle, for two elements spaced
//! `spacing` wavelengths apart:
//!
//! ```text
//! angle = asin(phase_rad / (2π · spacing))
//! ```

use crate::error::{Error, Result};

/// Speed of light, m/s.
pub const C: f64 = 299_792_458.0;

/// Element spacing in wavelengths from a physical spacing and carrier.
pub fn spacing_from_physical(spacing_m: f64, carrier_hz: f64) -> f64 {
    spacing_m * carrier_hz / C
}

/// What to do when a phase has no real steering angle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnglePolicy {
    Strict,
    Saturate,
}

pub(crate) fn check_spacing(spacing: f64) -> Result<()> {
    if spacing.is_finite() && spacing > 0.0 {
        Ok(())
    } else {
        Err(Error::invalid(format!(
            "element spacing {} wavelengths must be positive", spacing)))
    }
}

/// The arcsin argument for `phase_deg`.
pub fn sine_of(phase_deg: f64, spacing: f64) -> f64 {
    phase_deg.to_radians() / (2.0 * std::f64::consts::PI * spacing)
}

/// Steering angle in degrees for a phase difference in degrees.
pub fn steering_angle(phase_deg: f64, spacing: f64, policy: AnglePolicy)
                      -> Result<f64>
{
    check_spacing(spacing)?;
    let arg = sine_of(phase_deg, spacing);
    // ±180° at half-wave spacing lands a rounding error past ±1
    let arg = if arg.abs() <= 1.0 + 1e-12 {
        arg.max(-1.0).min(1.0)
    } else {
        match policy {
            AnglePolicy::Strict => return Err(Error::OutOfRange {
                phase_deg,
                argument: arg,
            }),
            AnglePolicy::Saturate => arg.max(-1.0).min(1.0),
        }
    };
    Ok(arg.asin().to_degrees())
}
