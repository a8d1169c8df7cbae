//! Bucket count normalization.
//!
//! OTLP explicit-bucket histograms carry per-bucket counts, but some producers
//! already send running totals. Percentile estimation needs the cumulative form.

/// Returns true when `bucket_counts` already ends at the data point's total count.
pub fn is_cumulative(bucket_counts: &[u64], total_count: u64) -> bool {
    bucket_counts.last() == Some(&total_count)
}

/// Rewrites per-bucket counts into a running prefix sum, in place.
///
/// Counts whose last entry already equals `total_count` are treated as
/// cumulative and left as they are, so normalizing twice is a no-op.
pub fn normalize_bucket_counts(bucket_counts: &mut [u64], total_count: u64) {
    if is_cumulative(bucket_counts, total_count) {
        return;
    }

    let mut running = 0u64;
    for count in bucket_counts.iter_mut() {
        running = running.saturating_add(*count);
        *count = running;
    }
}

/// Cumulative counts never decrease from one bucket to the next.
pub fn is_non_decreasing(cumulative_counts: &[u64]) -> bool {
    cumulative_counts.windows(2).all(|pair| pair[0] <= pair[1])
}
