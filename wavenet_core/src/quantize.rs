//! Amplitude quantization for categorical targets

/// `bins` evenly spaced levels starting at -1 with step `2 / bins`.
///
/// The last level is `1 - 2 / bins`, so the levels cover `[-1, 1)`.
pub fn quantization_levels(bins: usize) -> Vec<f64> {
    (0..bins)
        .map(|i| i as f64 * 2.0 / bins as f64 - 1.0)
        .collect()
}

/// Index of the first level strictly greater than `value`.
///
/// Values below the first level map to 0, values at or above the last level
/// map to `levels.len()`. NaN sorts past every level.
pub fn digitize(value: f32, levels: &[f64]) -> usize {
    if value.is_nan() {
        return levels.len();
    }
    let value = value as f64;
    levels.partition_point(|&level| level <= value)
}
