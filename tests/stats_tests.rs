//! Statistical evaluation: the canonical significance scenarios plus the
//! engine-level report and auto-completion policy.

use splitgate::engine::{EngineConfig, ExperimentEngine};
use splitgate::experiment::{CounterDelta, Experiment, ExperimentKind, ExperimentStatus, Variation};
use splitgate::repo::{ExperimentRepository, MemoryExperimentRepository};
use splitgate::stats::{evaluate, ArmCounts};

// =============================================================================
// Pure evaluator
// =============================================================================

#[test]
fn equal_rates_are_never_significant() {
    let result = evaluate(
        ArmCounts::new(1000, 500),
        ArmCounts::new(1000, 500),
        95.0,
        1000,
    );
    assert!(!result.significant);
    assert!(result.absolute_lift.abs() < 1e-12);
    assert!(!result.insufficient_data);
}

#[test]
fn ten_vs_fourteen_percent_is_significant_at_95() {
    let result = evaluate(
        ArmCounts::new(1000, 100),
        ArmCounts::new(1000, 140),
        95.0,
        1000,
    );
    assert!(result.significant);
    assert!(result.p_value < 0.05);
    assert!(result.sufficient_sample);

    let relative = result.relative_lift.expect("control rate is positive");
    assert!((relative - 0.40).abs() < 1e-9, "relative lift {relative}");
    assert!((result.absolute_lift - 0.04).abs() < 1e-12);
}

#[test]
fn zero_visitors_never_panics_or_nans() {
    for (control, variant) in [
        (ArmCounts::new(0, 0), ArmCounts::new(1000, 100)),
        (ArmCounts::new(1000, 100), ArmCounts::new(0, 0)),
        (ArmCounts::new(0, 0), ArmCounts::new(0, 0)),
    ] {
        let result = evaluate(control, variant, 95.0, 1000);
        assert!(result.insufficient_data);
        assert!(!result.significant);
        for field in [
            result.control_rate,
            result.variant_rate,
            result.absolute_lift,
            result.z_score,
            result.p_value,
            result.ci_lower,
            result.ci_upper,
        ] {
            assert!(field.is_finite(), "non-finite field in {result:?}");
        }
    }
}

#[test]
fn confidence_interval_contains_true_lift_shape() {
    let result = evaluate(
        ArmCounts::new(5000, 600),
        ArmCounts::new(5000, 700),
        95.0,
        1000,
    );
    // lift = 0.02; interval symmetric and bracketing
    assert!(result.ci_lower < 0.02 && 0.02 < result.ci_upper);
    // A significant result at 95% should have an interval excluding zero.
    if result.significant {
        assert!(result.ci_lower > 0.0 || result.ci_upper < 0.0);
    }
}

#[test]
fn sample_below_minimum_flags_insufficient_sample() {
    let result = evaluate(
        ArmCounts::new(999, 200),
        ArmCounts::new(2000, 500),
        95.0,
        1000,
    );
    assert!(!result.sufficient_sample);
    // Sufficiency is a flag, not a gate: significance is still computed.
    assert!(!result.insufficient_data);
}

// =============================================================================
// Engine-level report
// =============================================================================

async fn seeded_engine(
    config: EngineConfig,
    counters: &[(&str, bool, u64, u64)],
) -> ExperimentEngine<MemoryExperimentRepository> {
    let repo = MemoryExperimentRepository::new();
    #[allow(clippy::cast_precision_loss)]
    let share = 100.0 / counters.len() as f64;
    let mut builder = Experiment::builder("exp-report", "Stats suite")
        .kind(ExperimentKind::Multivariate)
        .target_url("https://www.example.com")
        .min_sample_size(1000);
    for (id, is_control, _, _) in counters {
        let variation = if *is_control {
            Variation::control(*id, *id, share)
        } else {
            Variation::new(*id, *id, share)
        };
        builder = builder.variation(variation);
    }
    repo.insert(builder.build()).await.unwrap();

    let engine = ExperimentEngine::with_config(repo, config);
    engine
        .transition("exp-report", ExperimentStatus::Running)
        .await
        .unwrap();

    // Seed counters directly through the repository's atomic increments.
    for (id, _, visitors, conversions) in counters {
        for _ in 0..*visitors {
            engine
                .repo()
                .increment_variant_counters("exp-report", id, CounterDelta::visitor())
                .await
                .unwrap();
        }
        for _ in 0..*conversions {
            engine
                .repo()
                .increment_variant_counters("exp-report", id, CounterDelta::conversion(1.0))
                .await
                .unwrap();
        }
    }
    engine
}

#[tokio::test]
async fn report_compares_each_arm_to_control() {
    let engine = seeded_engine(
        EngineConfig::default(),
        &[
            ("var-a", true, 1000, 100),
            ("var-b", false, 1000, 140),
            ("var-c", false, 1000, 95),
        ],
    )
    .await;

    let report = engine.evaluate("exp-report").await.unwrap();
    assert_eq!(report.arms.len(), 2);
    assert_eq!(report.control, ArmCounts::new(1000, 100));
    assert!(!report.experiment_closed);

    let var_b = report
        .arms
        .iter()
        .find(|arm| arm.variation_id == "var-b")
        .unwrap();
    assert!(var_b.stats.significant);

    let var_c = report
        .arms
        .iter()
        .find(|arm| arm.variation_id == "var-c")
        .unwrap();
    assert!(!var_c.stats.significant);
}

#[tokio::test]
async fn auto_complete_stops_a_winning_experiment() {
    let engine = seeded_engine(
        EngineConfig {
            auto_complete: true,
        },
        &[("var-a", true, 1000, 100), ("var-b", false, 1000, 140)],
    )
    .await;

    let report = engine.evaluate("exp-report").await.unwrap();
    assert!(report.auto_completed);
    assert!(report.experiment_closed);
    assert_eq!(report.status, ExperimentStatus::Completed);

    let exp = engine.repo().get("exp-report").await.unwrap();
    assert_eq!(exp.status(), ExperimentStatus::Completed);

    // No further allocations after auto-completion.
    assert!(engine
        .allocate_variant("exp-report", "late-subject")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn auto_complete_waits_for_sufficiency() {
    // 10% vs 17% on 500 visitors per arm is clearly significant, but the
    // sample floor of 1000 is not met, so the experiment keeps running.
    let engine = seeded_engine(
        EngineConfig {
            auto_complete: true,
        },
        &[("var-a", true, 500, 50), ("var-b", false, 500, 85)],
    )
    .await;

    let report = engine.evaluate("exp-report").await.unwrap();
    let arm = &report.arms[0];
    assert!(arm.stats.significant);
    assert!(!arm.stats.sufficient_sample);
    assert!(!report.auto_completed);
    assert_eq!(report.status, ExperimentStatus::Running);
}

#[tokio::test]
async fn evaluation_of_completed_experiment_is_marked_closed() {
    let engine = seeded_engine(
        EngineConfig::default(),
        &[("var-a", true, 1000, 100), ("var-b", false, 1000, 140)],
    )
    .await;
    engine
        .transition("exp-report", ExperimentStatus::Completed)
        .await
        .unwrap();

    let report = engine.evaluate("exp-report").await.unwrap();
    assert!(report.experiment_closed);
    assert!(!report.auto_completed);
}

#[tokio::test]
async fn report_serializes_for_dashboards() {
    let engine = seeded_engine(
        EngineConfig::default(),
        &[("var-a", true, 100, 10), ("var-b", false, 100, 12)],
    )
    .await;

    let report = engine.evaluate("exp-report").await.unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["experiment_id"], "exp-report");
    assert!(json["arms"].as_array().unwrap().len() == 1);
}
