//! Capabilities the sweep engine needs from the radios.
//!
//! Anything that can set a relative transmit phase and hand back a buffer
//! of complex baseband samples can be swept. [`sim`] provides a software
//! two-element array for testing and demos.

use crate::error::HardwareError;

use num::Complex;

pub mod sim;

pub type HardwareResult<T> = std::result::Result<T, HardwareError>;

/// The two-channel transmitter whose relative phase is swept.
pub trait Transmitter: Send {
    /// Set the phase of the second channel relative to the first, in
    /// degrees.
    fn set_phase(&mut self, degrees: f64) -> HardwareResult<()>;

    /// Start transmitting the test tone on both channels.
    fn enable(&mut self) -> HardwareResult<()>;
}

/// The receiver measuring the combined beam.
pub trait Receiver: Send {
    fn capture(&mut self, n_samples: usize) -> HardwareResult<Vec<Complex<f64>>>;
}

impl<T: Transmitter + ?Sized> Transmitter for Box<T> {
    fn set_phase(&mut self, degrees: f64) -> HardwareResult<()> {
        (**self).set_phase(degrees)
    }

    fn enable(&mut self) -> HardwareResult<()> {
        (**self).enable()
    }
}

impl<R: Receiver + ?Sized> Receiver for Box<R> {
    fn capture(&mut self, n_samples: usize) -> HardwareResult<Vec<Complex<f64>>> {
        (**self).capture(n_samples)
    }
}
