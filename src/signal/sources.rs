use super::Signal;
use super::times::Times;

use num::Complex;

#[derive(Debug, Clone)]
pub struct FromIter<I> {
    iter: I,
    rate: f64,
}

impl<I> FromIter<I> {
    pub fn new(rate: f64, iter: I) -> Self {
        FromIter {
            iter,
            rate,
        }
    }
}

impl<I> Signal for FromIter<I> where I: Iterator {
    type Sample = I::Item;
    fn next(&mut self) -> Option<Self::Sample> {
        self.iter.next()
    }
    fn rate(&self) -> f64 {
        self.rate
    }
}

pub fn from_iter<I>(rate: f64, iter: I) -> FromIter<I>
where
    I: Iterator,
{
    FromIter::new(rate, iter)
}

#[derive(Debug, Clone)]
struct FromFunc<F> {
    times: Times,
    f: F,
}

impl<F, A> Signal for FromFunc<F> where F: FnMut(f64) -> A {
    type Sample = A;
    fn next(&mut self) -> Option<Self::Sample> {
        self.times.next().map(&mut self.f)
    }
    fn rate(&self) -> f64 {
        self.times.rate()
    }
}

/// Unit-amplitude complex tone at `freq` Hz, starting at `phase` radians.
pub fn freq(rate: f64, freq: f64, phase: f64)
            -> impl Signal<Sample=Complex<f64>> + Clone
{
    use std::f64::consts::PI;
    FromFunc {
        times: Times::new(rate),
        f: move |t| Complex::new(0.0, PI * 2.0 * freq * t + phase).exp(),
    }
}

/// The same value forever.
pub fn constant<A>(rate: f64, value: A) -> impl Signal<Sample=A> + Clone
where
    A: Clone,
{
    from_iter(rate, std::iter::repeat(value))
}
