use super::Signal;

#[derive(Clone, Debug)]
pub struct Map<S, F> {
    signal: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub(super) fn new(signal: S, f: F) -> Self {
        Map { signal, f }
    }
}

impl<S, F, A> Signal for Map<S, F>
where
    F: FnMut(S::Sample) -> A,
    S: Signal,
{
    type Sample = A;
    fn next(&mut self) -> Option<Self::Sample> {
        self.signal.next().map(&mut self.f)
    }
    fn rate(&self) -> f64 {
        self.signal.rate()
    }
}

#[derive(Clone, Debug)]
pub struct Zip<A, B> {
    a: A,
    b: B,
}

impl<A, B> Zip<A, B> where A: Signal, B: Signal {
    pub(super) fn new(a: A, b: B) -> Self {
        // mixing rates would silently skew one side
        debug_assert!((a.rate() - b.rate()).abs() < 1e-9);
        Zip { a, b }
    }
}

impl<A, B> Signal for Zip<A, B> where A: Signal, B: Signal {
    type Sample = (A::Sample, B::Sample);
    fn next(&mut self) -> Option<Self::Sample> {
        let a = self.a.next()?;
        let b = self.b.next()?;
        Some((a, b))
    }
    fn rate(&self) -> f64 {
        self.a.rate()
    }
}

#[cfg(test)]
mod tests {
    use crate::signal::{self, Signal};

    #[test]
    fn zip_and_map_sum_elements() {
        let a = signal::constant(8.0, 1.5);
        let b = signal::from_iter(8.0, 0..4).map(|v| v as f64);
        let mut sum = a.zip(b).map(|(x, y)| x + y);
        assert_eq!(sum.rate(), 8.0);
        // the shorter side ends the pair
        assert_eq!(sum.capture(10), vec![1.5, 2.5, 3.5, 4.5]);
    }
}
