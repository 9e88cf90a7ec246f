//! Two-proportion z-test evaluator

use serde::{Deserialize, Serialize};

use super::{normal_cdf, z_critical};

/// Counter snapshot for one arm of the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    /// Distinct subjects bucketed into the arm.
    pub visitors: u64,
    /// Conversions attributed to the arm.
    pub conversions: u64,
}

impl ArmCounts {
    /// Create a counter snapshot.
    #[must_use]
    pub const fn new(visitors: u64, conversions: u64) -> Self {
        Self {
            visitors,
            conversions,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn visitors_f(self) -> f64 {
        self.visitors as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn conversions_f(self) -> f64 {
        self.conversions as f64
    }

    fn rate(self) -> f64 {
        if self.visitors == 0 {
            0.0
        } else {
            self.conversions_f() / self.visitors_f()
        }
    }
}

/// Outcome of a two-proportion evaluation. Derived, never persisted.
///
/// Every field is always finite: zero-visitor and zero-standard-error
/// inputs produce a flagged insufficient-data result, not NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsResult {
    /// Control conversion rate in `[0, 1]`.
    pub control_rate: f64,
    /// Variant conversion rate in `[0, 1]`.
    pub variant_rate: f64,
    /// `variant_rate - control_rate`.
    pub absolute_lift: f64,
    /// `absolute_lift / control_rate`, undefined when the control rate is 0.
    pub relative_lift: Option<f64>,
    /// Two-proportion z-score; 0 when the standard error is 0.
    pub z_score: f64,
    /// Two-tailed p-value; 1 when no difference can be resolved.
    pub p_value: f64,
    /// Lower bound of the confidence interval on the absolute lift.
    pub ci_lower: f64,
    /// Upper bound of the confidence interval on the absolute lift.
    pub ci_upper: f64,
    /// Whether `p_value < 1 - confidence_level / 100`.
    pub significant: bool,
    /// Whether both arms meet the configured minimum sample size.
    pub sufficient_sample: bool,
    /// Zero visitors on either arm, or zero standard error. When set,
    /// `significant` is always false.
    pub insufficient_data: bool,
}

impl StatisticsResult {
    fn insufficient(control: ArmCounts, variant: ArmCounts, min_sample_size: u64) -> Self {
        Self {
            control_rate: control.rate(),
            variant_rate: variant.rate(),
            absolute_lift: variant.rate() - control.rate(),
            relative_lift: None,
            z_score: 0.0,
            p_value: 1.0,
            ci_lower: 0.0,
            ci_upper: 0.0,
            significant: false,
            sufficient_sample: control.visitors >= min_sample_size
                && variant.visitors >= min_sample_size,
            insufficient_data: true,
        }
    }
}

/// Evaluate a variant arm against the control with a pooled two-proportion
/// z-test.
///
/// * `confidence_level` - percentage in `[90, 99]`, e.g. `95.0`
/// * `min_sample_size` - per-arm visitor floor for the sufficiency flag
///
/// Pure and read-only. Degenerate inputs (an arm with zero visitors, or a
/// zero standard error because both rates are at a shared boundary) return
/// a result with `insufficient_data = true` and `significant = false`
/// instead of dividing by zero.
#[must_use]
pub fn evaluate(
    control: ArmCounts,
    variant: ArmCounts,
    confidence_level: f64,
    min_sample_size: u64,
) -> StatisticsResult {
    if control.visitors == 0 || variant.visitors == 0 {
        return StatisticsResult::insufficient(control, variant, min_sample_size);
    }

    let p_c = control.rate();
    let p_v = variant.rate();

    let pooled = (control.conversions_f() + variant.conversions_f())
        / (control.visitors_f() + variant.visitors_f());
    let se = (pooled
        * (1.0 - pooled)
        * (1.0 / control.visitors_f() + 1.0 / variant.visitors_f()))
    .sqrt();

    if se == 0.0 {
        return StatisticsResult::insufficient(control, variant, min_sample_size);
    }

    let absolute_lift = p_v - p_c;
    let z = absolute_lift / se;
    let p_value = 2.0 * (1.0 - normal_cdf(z.abs()));
    // Clamp the tiny negative values the CDF approximation can leak at
    // extreme |z|.
    let p_value = p_value.clamp(0.0, 1.0);

    let alpha = 1.0 - confidence_level / 100.0;
    let z_crit = z_critical(confidence_level);

    StatisticsResult {
        control_rate: p_c,
        variant_rate: p_v,
        absolute_lift,
        relative_lift: if p_c > 0.0 {
            Some(absolute_lift / p_c)
        } else {
            None
        },
        z_score: z,
        p_value,
        ci_lower: absolute_lift - z_crit * se,
        ci_upper: absolute_lift + z_crit * se,
        significant: p_value < alpha,
        sufficient_sample: control.visitors >= min_sample_size
            && variant.visitors >= min_sample_size,
        insufficient_data: false,
    }
}
