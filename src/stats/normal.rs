//! Standard-normal helpers

/// Standard normal CDF, Abramowitz and Stegun approximation 26.2.17.
///
/// Absolute error below `7.5e-8`, far tighter than anything a conversion
/// experiment can resolve.
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.231_641_9 * x.abs());
    let d = 0.398_942_280_401_432_7; // 1/sqrt(2*pi)
    let poly = t
        * (0.319_381_530
            + t * (-0.356_563_782 + t * (1.781_477_937 + t * (-1.821_255_978 + t * 1.330_274_429))));
    let p = d * (-x * x / 2.0).exp() * poly;
    if x > 0.0 {
        1.0 - p
    } else {
        p
    }
}

/// Two-tailed critical z-value for a confidence level in `[90, 99]`.
///
/// Lifecycle validation bounds the level to this integer range, so a fixed
/// table is total; non-integer levels round to the nearest entry.
#[must_use]
pub fn z_critical(confidence_level: f64) -> f64 {
    const TABLE: [f64; 10] = [
        1.645, // 90
        1.695, // 91
        1.751, // 92
        1.812, // 93
        1.881, // 94
        1.960, // 95
        2.054, // 96
        2.170, // 97
        2.326, // 98
        2.576, // 99
    ];
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let idx = (confidence_level.round().clamp(90.0, 99.0) as usize) - 90;
    TABLE[idx]
}
