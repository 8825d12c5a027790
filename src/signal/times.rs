use super::Signal;

/// Sample timestamps, in seconds, starting at zero.
#[derive(Debug, Clone)]
pub struct Times {
    step: u64,
    rate: f64,
}

impl Times {
    pub fn new(rate: f64) -> Self {
        Times { step: 0, rate }
    }
}

impl Signal for Times {
    type Sample = f64;
    fn next(&mut self) -> Option<Self::Sample> {
        let now = self.step;
        self.step += 1;
        Some((now as f64) / self.rate)
    }
    fn rate(&self) -> f64 {
        self.rate
    }
}
