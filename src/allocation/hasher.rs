//! Stable bucketing hash
//!
//! Not cryptographic; the requirement is repeatability across platforms and
//! releases plus good diffusion over short ASCII identifiers.

/// FNV-1a offset basis (64-bit).
const FNV_OFFSET: u64 = 14_695_981_039_346_656_037;
/// FNV-1a prime (64-bit).
const FNV_PRIME: u64 = 1_099_511_628_211;

/// Map (experiment, subject) to a stable pseudo-random value in `[0, 100)`.
///
/// Pure function of its inputs: no clock, no external state. The same pair
/// always yields the same bucket, so allocation and conversion recording
/// can recompute it independently and never disagree.
///
/// Implementation: FNV-1a over `experiment_id`, a `0x1F` unit separator,
/// then `subject_id`, finalized with SplitMix64 for bit diffusion, top 53
/// bits scaled to `[0, 100)`.
#[must_use]
pub fn bucket(experiment_id: &str, subject_id: &str) -> f64 {
    let mut h = FNV_OFFSET;
    for b in experiment_id.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    // Separator prevents ("ab","c") colliding with ("a","bc").
    h ^= 0x1F;
    h = h.wrapping_mul(FNV_PRIME);
    for b in subject_id.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    let mixed = splitmix64(h);

    // 53 significand bits keep the conversion to f64 exact.
    #[allow(clippy::cast_precision_loss)]
    let unit = (mixed >> 11) as f64 / (1u64 << 53) as f64;
    unit * 100.0
}

#[inline]
const fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_deterministic() {
        for i in 0..100 {
            let subject = format!("subject-{i}");
            assert_eq!(bucket("exp-1", &subject), bucket("exp-1", &subject));
        }
    }

    #[test]
    fn test_bucket_in_range() {
        for i in 0..10_000 {
            let b = bucket("exp-1", &format!("subject-{i}"));
            assert!((0.0..100.0).contains(&b), "bucket {b} out of range");
        }
    }

    #[test]
    fn test_bucket_differs_across_experiments() {
        // Same subject should not land on the same bucket for every
        // experiment, or cross-experiment assignments would correlate.
        let same = (0..1000)
            .filter(|i| {
                let subject = format!("subject-{i}");
                (bucket("exp-1", &subject) - bucket("exp-2", &subject)).abs() < 1.0
            })
            .count();
        assert!(same < 50, "buckets correlate across experiments: {same}");
    }

    #[test]
    fn test_separator_prevents_concatenation_collision() {
        assert_ne!(bucket("exp-1", "23"), bucket("exp-12", "3"));
    }

    #[test]
    fn test_rough_uniformity_in_deciles() {
        let mut counts = [0u32; 10];
        let n = 100_000;
        for i in 0..n {
            let b = bucket("exp-uniform", &format!("subject-{i}"));
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let decile = (b / 10.0) as usize;
            counts[decile.min(9)] += 1;
        }
        // Expect ~10_000 per decile; allow +-10% which is far beyond any
        // plausible random fluctuation at this sample size.
        for (i, count) in counts.iter().enumerate() {
            assert!(
                (9_000..=11_000).contains(count),
                "decile {i} count {count} outside tolerance"
            );
        }
    }
}
