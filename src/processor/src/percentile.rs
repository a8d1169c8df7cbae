//! Percentile estimation from cumulative explicit-bucket histograms.
//!
//! The estimate is deterministic: the target rank is floored with integer
//! arithmetic, the straddling buckets are located with a binary search and the
//! value is linearly interpolated between their bounds, assuming observations
//! are spread uniformly inside a bucket.

/// A percentile emitted by the processor: output suffix and numeric rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percentile {
    pub label: &'static str,
    pub rank: u64,
}

/// Percentiles derived for every delta histogram, in output order.
pub const PERCENTILES: [Percentile; 4] = [
    Percentile {
        label: "p50",
        rank: 50,
    },
    Percentile {
        label: "p75",
        rank: 75,
    },
    Percentile {
        label: "p90",
        rank: 90,
    },
    Percentile {
        label: "p95",
        rank: 95,
    },
];

/// Floored count-based position of `percentile` within `total_count` observations.
pub fn target_rank(percentile: u64, total_count: u64) -> u64 {
    // u128 keeps the product exact; the quotient always fits back into u64
    (u128::from(total_count) * u128::from(percentile) / 100) as u64
}

/// Estimates the value at `percentile` (0..=100).
///
/// Expects `cumulative_counts.len() == bounds.len() + 1`, non-decreasing counts
/// and a non-zero `total_count`; callers filter out points that don't satisfy
/// this. Ranks that land in the unbounded overflow bucket yield `f64::INFINITY`.
pub fn estimate_percentile(
    percentile: u64,
    total_count: u64,
    bounds: &[f64],
    cumulative_counts: &[u64],
) -> f64 {
    let rank = target_rank(percentile, total_count);
    let last = cumulative_counts.len().saturating_sub(1);

    let mut left = 0;
    let mut right = last;
    while left != right && left + 1 != right {
        let middle = (left + right) / 2;
        if cumulative_counts[middle] >= rank {
            right = middle;
        } else {
            left = middle;
        }
    }

    if right == last {
        return f64::INFINITY;
    }
    if left == right {
        return bounds.get(right).copied().unwrap_or(f64::INFINITY);
    }

    let lower_bound = bounds[left];
    let upper_bound = bounds[right];
    // signed: the rank may sit below the first bucket's count
    let bucket_count = i128::from(cumulative_counts[right]) - i128::from(cumulative_counts[left]);
    let count_offset = i128::from(rank) - i128::from(cumulative_counts[left]);

    lower_bound
        + (upper_bound - lower_bound) / (bucket_count as f64 + 1.0) * (count_offset as f64 + 1.0)
}
