use super::{HardwareResult, Receiver, Transmitter};
use crate::error::HardwareError;
use crate::signal::{self, Signal};

use num::Complex;
use std::sync::{Arc, Mutex, MutexGuard};

/// A two-element array and a receiver sitting at `target_angle_deg`.
///
/// Both elements radiate a unit-amplitude tone. The receiver sees their
/// sum, with the second element lagging by the geometric phase of the
/// target direction, so received tone power is
/// `gain² · (2 + 2 cos(phase - steer_phase))` and peaks when the commanded
/// phase steers the beam at the receiver.
#[derive(Debug, Clone)]
pub struct SimulatedArray {
    sample_rate: f64,
    tone_freq: f64,
    spacing: f64,
    target_angle_deg: f64,
    gain: f64,
    dc_offset: Complex<f64>,
    latency: usize,
}

#[derive(Debug)]
struct SimState {
    enabled: bool,
    phase: f64,
    previous: f64,
    stale_left: usize,
    clock: u64,
    phase_writes: usize,
    captures: usize,
}

impl SimulatedArray {
    pub fn new(sample_rate: f64, tone_freq: f64) -> Self {
        SimulatedArray {
            sample_rate,
            tone_freq,
            spacing: 0.5,
            target_angle_deg: 0.0,
            gain: 1.0,
            dc_offset: Complex::new(0.0, 0.0),
            latency: 0,
        }
    }

    /// Element spacing in wavelengths.
    pub fn spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Direction of the receiver from broadside, in degrees.
    pub fn target_angle(mut self, degrees: f64) -> Self {
        self.target_angle_deg = degrees;
        self
    }

    pub fn gain(mut self, gain: f64) -> Self {
        self.gain = gain;
        self
    }

    pub fn dc_offset(mut self, offset: Complex<f64>) -> Self {
        self.dc_offset = offset;
        self
    }

    /// Captures after a phase change that still show the old phase, like
    /// buffers queued in the radio before the write landed.
    pub fn latency(mut self, captures: usize) -> Self {
        self.latency = captures;
        self
    }

    /// The commanded phase that points the beam at the receiver.
    pub fn steer_phase(&self) -> f64 {
        360.0 * self.spacing * self.target_angle_deg.to_radians().sin()
    }

    pub fn split(self) -> (SimTransmitter, SimReceiver) {
        let state = Arc::new(Mutex::new(SimState {
            enabled: false,
            phase: 0.0,
            previous: 0.0,
            stale_left: 0,
            clock: 0,
            phase_writes: 0,
            captures: 0,
        }));
        let tx = SimTransmitter {
            state: state.clone(),
            latency: self.latency,
        };
        let rx = SimReceiver {
            state,
            array: self,
        };
        (tx, rx)
    }
}

fn lock(state: &Mutex<SimState>) -> HardwareResult<MutexGuard<'_, SimState>> {
    state.lock()
        .map_err(|_| HardwareError::new("simulated array state poisoned"))
}

#[derive(Debug, Clone)]
pub struct SimTransmitter {
    state: Arc<Mutex<SimState>>,
    latency: usize,
}

impl SimTransmitter {
    /// Phase writes so far.
    pub fn phase_writes(&self) -> usize {
        self.state.lock().map(|s| s.phase_writes).unwrap_or(0)
    }
}

impl Transmitter for SimTransmitter {
    fn set_phase(&mut self, degrees: f64) -> HardwareResult<()> {
        if !degrees.is_finite() {
            return Err(HardwareError::new(format!("bad phase {}", degrees)));
        }
        let mut st = lock(&self.state)?;
        st.previous = st.phase;
        st.phase = degrees;
        st.stale_left = self.latency;
        st.phase_writes += 1;
        Ok(())
    }

    fn enable(&mut self) -> HardwareResult<()> {
        lock(&self.state)?.enabled = true;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SimReceiver {
    state: Arc<Mutex<SimState>>,
    array: SimulatedArray,
}

impl SimReceiver {
    /// Captures so far, including discarded ones.
    pub fn captures(&self) -> usize {
        self.state.lock().map(|s| s.captures).unwrap_or(0)
    }
}

impl Receiver for SimReceiver {
    fn capture(&mut self, n_samples: usize) -> HardwareResult<Vec<Complex<f64>>> {
        let (enabled, seen, start) = {
            let mut st = lock(&self.state)?;
            let seen = if st.stale_left > 0 {
                st.stale_left -= 1;
                st.previous
            } else {
                st.phase
            };
            let start = st.clock;
            st.clock += n_samples as u64;
            st.captures += 1;
            (st.enabled, seen, start)
        };

        let a = &self.array;
        let dc = a.dc_offset;
        if !enabled {
            return Ok(signal::constant(a.sample_rate, dc).capture(n_samples));
        }

        // continue the tone from where the last capture stopped
        use std::f64::consts::PI;
        let t0 = start as f64 / a.sample_rate;
        let base = 2.0 * PI * a.tone_freq * t0;
        let lag = (seen - a.steer_phase()).to_radians();
        let gain = a.gain;
        let first = signal::freq(a.sample_rate, a.tone_freq, base);
        let second = signal::freq(a.sample_rate, a.tone_freq, base + lag);
        Ok(first.zip(second)
           .map(move |(x, y)| (x + y) * gain + dc)
           .capture(n_samples))
    }
}
