use num::Complex;

/// Forward transform in natural bin order: bin `k` is `k * rate / len`,
/// wrapping to negative frequencies in the upper half. Unnormalized.
pub fn transform(samples: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut data = samples.to_vec();
    let mut output = vec![Complex::new(0.0, 0.0); data.len()];
    if data.is_empty() {
        return output;
    }
    let mut planner = rustfft::FFTplanner::new(false);
    let fft = planner.plan_fft(data.len());
    fft.process(&mut data, &mut output);
    output
}

/// Index of the natural-order bin nearest `freq`.
pub fn nearest_bin(freq: f64, rate: f64, len: usize) -> usize {
    let idx = (freq * len as f64 / rate).round() as isize;
    idx.rem_euclid(len as isize) as usize
}
