//! Variation - one arm of an experiment, including the designated control

use serde::{Deserialize, Serialize};

/// A single arm of an experiment.
///
/// Owned exclusively by its parent [`Experiment`](super::Experiment).
/// Counters are cumulative and monotonically non-decreasing; they are only
/// written through [`CounterDelta`] applications performed atomically by
/// the repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variation {
    variation_id: String,
    name: String,
    traffic_pct: f64,
    is_control: bool,
    url: Option<String>,
    visitors: u64,
    conversions: u64,
    conversion_value: f64,
}

impl Variation {
    /// Create a new non-control variation with the given traffic share.
    ///
    /// # Arguments
    ///
    /// * `variation_id` - Unique identifier within the parent experiment
    /// * `name` - Human-readable name
    /// * `traffic_pct` - Share of traffic in `[0, 100]`
    #[must_use]
    pub fn new(variation_id: impl Into<String>, name: impl Into<String>, traffic_pct: f64) -> Self {
        Self {
            variation_id: variation_id.into(),
            name: name.into(),
            traffic_pct,
            is_control: false,
            url: None,
            visitors: 0,
            conversions: 0,
            conversion_value: 0.0,
        }
    }

    /// Create a control variation. Each experiment must contain exactly one.
    #[must_use]
    pub fn control(
        variation_id: impl Into<String>,
        name: impl Into<String>,
        traffic_pct: f64,
    ) -> Self {
        Self {
            is_control: true,
            ..Self::new(variation_id, name, traffic_pct)
        }
    }

    /// Create a builder for a variation with optional fields.
    #[must_use]
    pub fn builder(
        variation_id: impl Into<String>,
        name: impl Into<String>,
        traffic_pct: f64,
    ) -> VariationBuilder {
        VariationBuilder::new(variation_id, name, traffic_pct)
    }

    /// Get the variation ID.
    #[must_use]
    pub fn variation_id(&self) -> &str {
        &self.variation_id
    }

    /// Get the variation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the configured traffic percentage in `[0, 100]`.
    #[must_use]
    pub const fn traffic_pct(&self) -> f64 {
        self.traffic_pct
    }

    /// Whether this variation is the control arm.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        self.is_control
    }

    /// Destination URL for redirect / split-URL experiments, if set.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Cumulative count of distinct subjects bucketed into this arm.
    #[must_use]
    pub const fn visitors(&self) -> u64 {
        self.visitors
    }

    /// Cumulative count of attributed conversions.
    #[must_use]
    pub const fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Cumulative sum of conversion values.
    #[must_use]
    pub const fn conversion_value(&self) -> f64 {
        self.conversion_value
    }

    /// Apply a counter delta in place.
    ///
    /// Counters only ever grow; deltas carry unsigned increments so a
    /// decrement cannot be expressed.
    pub fn apply(&mut self, delta: &CounterDelta) {
        self.visitors += delta.visitors;
        self.conversions += delta.conversions;
        self.conversion_value += delta.value;
    }
}

/// An atomic increment against a variation's counters.
///
/// Passed to the repository's `increment_variant_counters`, which must apply
/// it as a single atomic read-modify-write (many concurrent conversions for
/// different subjects target the same counters).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterDelta {
    /// Visitor count increment (0 or 1 in practice).
    pub visitors: u64,
    /// Conversion count increment (0 or 1 in practice).
    pub conversions: u64,
    /// Conversion value increment, non-negative.
    pub value: f64,
}

impl CounterDelta {
    /// Delta for a first-seen subject: one visitor, nothing else.
    #[must_use]
    pub const fn visitor() -> Self {
        Self {
            visitors: 1,
            conversions: 0,
            value: 0.0,
        }
    }

    /// Delta for an attributed conversion carrying `value`.
    #[must_use]
    pub const fn conversion(value: f64) -> Self {
        Self {
            visitors: 0,
            conversions: 1,
            value,
        }
    }
}

/// Builder for [`Variation`].
#[derive(Debug)]
pub struct VariationBuilder {
    variation_id: String,
    name: String,
    traffic_pct: f64,
    is_control: bool,
    url: Option<String>,
}

impl VariationBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(
        variation_id: impl Into<String>,
        name: impl Into<String>,
        traffic_pct: f64,
    ) -> Self {
        Self {
            variation_id: variation_id.into(),
            name: name.into(),
            traffic_pct,
            is_control: false,
            url: None,
        }
    }

    /// Mark this variation as the control arm.
    #[must_use]
    pub const fn control(mut self) -> Self {
        self.is_control = true;
        self
    }

    /// Set the destination URL (redirect / split-URL experiments).
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Build the [`Variation`] with zeroed counters.
    #[must_use]
    pub fn build(self) -> Variation {
        Variation {
            variation_id: self.variation_id,
            name: self.name,
            traffic_pct: self.traffic_pct,
            is_control: self.is_control,
            url: self.url,
            visitors: 0,
            conversions: 0,
            conversion_value: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variation_new_zeroed_counters() {
        let var = Variation::new("var-1", "Treatment", 50.0);
        assert_eq!(var.visitors(), 0);
        assert_eq!(var.conversions(), 0);
        assert!(!var.is_control());
    }

    #[test]
    fn test_control_constructor() {
        let var = Variation::control("var-0", "Control", 50.0);
        assert!(var.is_control());
    }

    #[test]
    fn test_apply_delta_accumulates() {
        let mut var = Variation::new("var-1", "Treatment", 50.0);
        var.apply(&CounterDelta::visitor());
        var.apply(&CounterDelta::conversion(12.5));
        var.apply(&CounterDelta::conversion(7.5));

        assert_eq!(var.visitors(), 1);
        assert_eq!(var.conversions(), 2);
        assert!((var.conversion_value() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_with_url() {
        let var = Variation::builder("var-2", "Redirect arm", 25.0)
            .url("https://www.example.com/b")
            .build();
        assert_eq!(var.url(), Some("https://www.example.com/b"));
    }
}
