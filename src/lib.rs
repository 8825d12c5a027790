// wickedly useful re-export
pub use num::Complex;

pub mod error;
pub use error::{Error, HardwareError, Result};

pub mod signal;
pub use signal::Signal;

pub mod fft;

pub mod power;
pub use power::{PowerExtractor, Window};

pub mod angle;
pub use angle::AnglePolicy;

pub mod plan;
pub use plan::SweepPlan;

pub mod curve;
pub use curve::{PhaseSample, SweepCurve};

pub mod metrics;
pub use metrics::{BeamAnalyzer, BeamMetrics};

pub mod hardware;
pub use hardware::{Receiver, Transmitter};

pub mod sweep;
pub use sweep::{CancelHandle, CaptureConfig, SweepController, SweepEvent,
                SweepMode, SweepState};

pub mod config;
pub use config::SweepConfig;

pub mod cli;
