mod times;

mod sources;
pub use sources::*;

mod adapters;
pub use adapters::*;

/// A stream of samples taken at a fixed rate, in Hz.
pub trait Signal {
    type Sample;
    fn next(&mut self) -> Option<Self::Sample>;
    fn rate(&self) -> f64;

    fn map<F, A>(self, f: F) -> Map<Self, F>
    where
        F: FnMut(Self::Sample) -> A,
        Self: Sized,
    {
        Map::new(self, f)
    }

    /// Pair this signal with another of the same rate.
    fn zip<O>(self, other: O) -> Zip<Self, O>
    where
        O: Signal,
        Self: Sized,
    {
        Zip::new(self, other)
    }

    /// Pull exactly `count` samples into a buffer, or fewer if the signal
    /// ends early.
    fn capture(&mut self, count: usize) -> Vec<Self::Sample> where Self: Sized {
        let mut buf = Vec::with_capacity(count);
        while buf.len() < count {
            match self.next() {
                Some(v) => buf.push(v),
                None => break,
            }
        }
        buf
    }
}
