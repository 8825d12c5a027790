use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a transmitter or receiver.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct HardwareError(pub String);

impl HardwareError {
    pub fn new<S: Into<String>>(msg: S) -> Self {
        HardwareError(msg.into())
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid sweep range: start {start}, stop {stop}, step {step}")]
    InvalidRange { start: f64, stop: f64, step: f64 },

    #[error("a sweep is already running")]
    AlreadyRunning,

    /// `phase_deg` is `None` when the failure happened outside a step,
    /// i.e. while enabling the transmitter.
    #[error("hardware failure at phase {}: {source}", fmt_phase(.phase_deg))]
    HardwareFailure {
        phase_deg: Option<f64>,
        #[source]
        source: HardwareError,
    },

    #[error("curve has {len} samples, need at least 3")]
    EmptyCurve { len: usize },

    #[error("phase {phase_deg} maps outside arcsin domain ({argument})")]
    OutOfRange { phase_deg: f64, argument: f64 },
}

impl Error {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }

    pub(crate) fn hardware(phase_deg: Option<f64>, source: HardwareError) -> Self {
        Error::HardwareFailure { phase_deg, source }
    }

    /// The phase being commanded when a hardware failure happened.
    pub fn failing_phase(&self) -> Option<f64> {
        match self {
            Error::HardwareFailure { phase_deg, .. } => *phase_deg,
            _ => None,
        }
    }
}

fn fmt_phase(phase: &Option<f64>) -> String {
    match phase {
        Some(p) => format!("{}°", p),
        None => "(enable)".to_owned(),
    }
}
