//! Helpers for converting levels and measuring signal power.

/// Convert a dB value to linear gain.
pub fn db_to_linear(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Convert a linear gain to dB.
pub fn linear_to_db(value: f64) -> f64 {
    let v = value.max(f64::MIN_POSITIVE);
    20.0 * v.log10()
}

/// Root-mean-square level of `samples`, 0 for an empty slice.
pub fn rms(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let power: f64 = samples
        .iter()
        .map(|&sample| (sample as f64) * (sample as f64))
        .sum();
    (power / samples.len() as f64).sqrt()
}
