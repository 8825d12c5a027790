use crate::angle::{self, AnglePolicy};
use crate::error::{Error, Result};

/// Phase values closer than this to `stop` are snapped onto it.
const SNAP_DEG: f64 = 1e-9;

/// Smallest step a plan accepts, well clear of the snapping tolerance.
pub const MIN_STEP_DEG: f64 = 1e-6;

/// Most phase values one pass may hold.
pub const MAX_POINTS: usize = 100_000;

/// An inclusive phase sweep, in degrees.
///
/// Steps are `start + k * step` while they stay below `stop`; `stop` is
/// always the last value, so the final interval may be shorter than
/// `step`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SweepPlan {
    start_deg: f64,
    stop_deg: f64,
    step_deg: f64,
}

impl SweepPlan {
    pub fn new(start_deg: f64, stop_deg: f64, step_deg: f64) -> Result<Self> {
        let in_range = |v: f64| v.is_finite() && v >= -180.0 && v <= 180.0;
        let ok = in_range(start_deg)
            && in_range(stop_deg)
            && step_deg.is_finite()
            && step_deg >= MIN_STEP_DEG
            && start_deg <= stop_deg
            && (stop_deg - start_deg + SNAP_DEG) / step_deg < MAX_POINTS as f64 - 1.0;
        if !ok {
            return Err(Error::InvalidRange {
                start: start_deg,
                stop: stop_deg,
                step: step_deg,
            });
        }
        Ok(SweepPlan { start_deg, stop_deg, step_deg })
    }

    /// `-180..=180` in `step_deg` increments.
    pub fn full_circle(step_deg: f64) -> Result<Self> {
        SweepPlan::new(-180.0, 180.0, step_deg)
    }

    pub fn start_deg(&self) -> f64 {
        self.start_deg
    }

    pub fn stop_deg(&self) -> f64 {
        self.stop_deg
    }

    pub fn step_deg(&self) -> f64 {
        self.step_deg
    }

    /// Number of whole steps that fit, and whether `stop` is appended.
    fn layout(&self) -> (usize, bool) {
        let span = self.stop_deg - self.start_deg;
        let whole = ((span + SNAP_DEG) / self.step_deg).floor() as usize;
        let last = self.start_deg + whole as f64 * self.step_deg;
        (whole + 1, self.stop_deg - last > SNAP_DEG)
    }

    /// Number of phase values in one pass.
    pub fn len(&self) -> usize {
        let (whole, clamped) = self.layout();
        whole + clamped as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The phase values of one pass. Each call starts from the beginning.
    pub fn generate(&self) -> PhaseSteps {
        let (whole, clamped) = self.layout();
        PhaseSteps {
            plan: *self,
            whole,
            len: whole + clamped as usize,
            index: 0,
        }
    }

    /// Steering angle for each phase value, saturating at ±90°.
    pub fn steering_angles(&self, spacing: f64) -> Result<Vec<f64>> {
        self.generate()
            .map(|p| angle::steering_angle(p, spacing, AnglePolicy::Saturate))
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct PhaseSteps {
    plan: SweepPlan,
    whole: usize,
    len: usize,
    index: usize,
}

impl Iterator for PhaseSteps {
    type Item = f64;
    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let i = self.index;
        self.index += 1;
        if i >= self.whole {
            return Some(self.plan.stop_deg);
        }
        let v = self.plan.start_deg + i as f64 * self.plan.step_deg;
        if (self.plan.stop_deg - v).abs() <= SNAP_DEG {
            Some(self.plan.stop_deg)
        } else {
            Some(v.min(self.plan.stop_deg))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.len - self.index;
        (left, Some(left))
    }
}

impl ExactSizeIterator for PhaseSteps {}
