use crate::error::{Error, Result};
use crate::power;

/// One sweep step: the commanded phase and the linear tone power measured
/// there.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PhaseSample {
    phase_deg: f64,
    power: f64,
}

impl PhaseSample {
    pub fn new(phase_deg: f64, power: f64) -> Result<Self> {
        if !(phase_deg.is_finite() && phase_deg >= -180.0 && phase_deg <= 180.0) {
            return Err(Error::invalid(format!(
                "phase {} outside [-180, 180]", phase_deg)));
        }
        if !(power.is_finite() && power >= 0.0) {
            return Err(Error::invalid(format!("power {} must be >= 0", power)));
        }
        Ok(PhaseSample { phase_deg, power })
    }

    pub fn phase_deg(&self) -> f64 {
        self.phase_deg
    }

    pub fn power(&self) -> f64 {
        self.power
    }

    /// Power relative to `reference`, in dB.
    pub fn power_db(&self, reference: f64) -> f64 {
        power::to_db(self.power / reference)
    }
}

/// Phase-vs-power samples in sweep order, phase strictly increasing.
///
/// Curves handed out by a controller are read-only snapshots; a curve is
/// `complete` only when its lap ran to the end.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepCurve {
    samples: Vec<PhaseSample>,
    complete: bool,
}

impl SweepCurve {
    /// A complete curve from samples already in sweep order.
    pub fn from_samples(samples: Vec<PhaseSample>) -> Result<Self> {
        let mut builder = CurveBuilder::with_capacity(samples.len());
        for s in samples {
            builder.push(s)?;
        }
        Ok(builder.freeze())
    }

    /// A complete curve from `(phase_deg, power)` pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item=(f64, f64)>,
    {
        let samples = pairs.into_iter()
            .map(|(p, w)| PhaseSample::new(p, w))
            .collect::<Result<Vec<_>>>()?;
        SweepCurve::from_samples(samples)
    }

    pub fn samples(&self) -> &[PhaseSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn phases(&self) -> impl Iterator<Item=f64> + '_ {
        self.samples.iter().map(|s| s.phase_deg)
    }

    pub fn powers(&self) -> impl Iterator<Item=f64> + '_ {
        self.samples.iter().map(|s| s.power)
    }

    /// Powers in dB relative to the strongest sample, for display.
    pub fn powers_db(&self) -> Vec<f64> {
        let peak = self.powers().fold(0.0, f64::max);
        self.samples.iter().map(|s| s.power_db(peak)).collect()
    }
}

/// Accumulates a curve during a lap.
#[derive(Debug, Default)]
pub(crate) struct CurveBuilder {
    samples: Vec<PhaseSample>,
}

impl CurveBuilder {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        CurveBuilder { samples: Vec::with_capacity(capacity) }
    }

    pub(crate) fn push(&mut self, sample: PhaseSample) -> Result<()> {
        if let Some(last) = self.samples.last() {
            if sample.phase_deg <= last.phase_deg {
                return Err(Error::invalid(format!(
                    "phase {} does not follow {}",
                    sample.phase_deg, last.phase_deg)));
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    pub(crate) fn len(&self) -> usize {
        self.samples.len()
    }

    /// A partial copy for progress reporting.
    pub(crate) fn snapshot(&self) -> SweepCurve {
        SweepCurve { samples: self.samples.clone(), complete: false }
    }

    pub(crate) fn freeze(self) -> SweepCurve {
        SweepCurve { samples: self.samples, complete: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_validation() {
        assert!(PhaseSample::new(180.0, 0.0).is_ok());
        assert!(PhaseSample::new(-180.0, 3.5).is_ok());
        assert!(PhaseSample::new(181.0, 1.0).is_err());
        assert!(PhaseSample::new(0.0, -0.1).is_err());
        assert!(PhaseSample::new(0.0, std::f64::NAN).is_err());
    }

    #[test]
    fn rejects_duplicate_and_backwards_phases() {
        assert!(SweepCurve::from_pairs(vec![(0.0, 1.0), (0.0, 2.0)]).is_err());
        assert!(SweepCurve::from_pairs(vec![(10.0, 1.0), (5.0, 2.0)]).is_err());
        let ok = SweepCurve::from_pairs(vec![(-5.0, 1.0), (5.0, 2.0)]).unwrap();
        assert!(ok.is_complete());
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn snapshot_is_partial_and_detached() {
        let mut b = CurveBuilder::with_capacity(3);
        b.push(PhaseSample::new(-10.0, 1.0).unwrap()).unwrap();
        let snap = b.snapshot();
        b.push(PhaseSample::new(0.0, 2.0).unwrap()).unwrap();
        assert!(!snap.is_complete());
        assert_eq!(snap.len(), 1);
        assert_eq!(b.len(), 2);
        let done = b.freeze();
        assert!(done.is_complete());
        assert_eq!(done.phases().collect::<Vec<_>>(), vec![-10.0, 0.0]);
    }

    #[test]
    fn db_relative_to_peak() {
        let curve = SweepCurve::from_pairs(vec![(0.0, 4.0), (1.0, 2.0)]).unwrap();
        let db = curve.powers_db();
        assert_eq!(db[0], 0.0);
        assert!((db[1] + 3.0103).abs() < 1e-4);
    }
}
