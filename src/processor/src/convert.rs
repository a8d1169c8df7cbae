//! Conversion of one delta histogram into derived gauge series.

use opentelemetry_proto::tonic::metrics::v1::{
    Gauge, Histogram, HistogramDataPoint, Metric, NumberDataPoint, metric::Data,
    number_data_point,
};

use crate::buckets::{is_non_decreasing, normalize_bucket_counts};
use crate::percentile::{PERCENTILES, estimate_percentile};

pub const COUNT_SUFFIX: &str = "count";
pub const SUM_SUFFIX: &str = "sum";

/// Number of series derived from a histogram: one per percentile plus count and sum.
pub const DERIVED_SERIES: usize = PERCENTILES.len() + 2;

/// Builds the gauge metrics replacing `histogram`, named after `source`.
///
/// Output order is p50, p75, p90, p95, count, sum. Series that end up with no
/// data points are left out, so percentile series disappear when every source
/// point is empty or malformed, and all series disappear for a histogram
/// without points.
pub fn convert_histogram(source: &Metric, histogram: Histogram) -> Vec<Metric> {
    let capacity = histogram.data_points.len();
    let mut percentile_points: Vec<Vec<NumberDataPoint>> = (0..PERCENTILES.len())
        .map(|_| Vec::with_capacity(capacity))
        .collect();
    let mut count_points = Vec::with_capacity(capacity);
    let mut sum_points = Vec::with_capacity(capacity);

    for mut point in histogram.data_points {
        count_points.push(gauge_point(&point, point.count as f64));
        sum_points.push(gauge_point(&point, point.sum.unwrap_or_default()));

        if point.count == 0 {
            tracing::trace!(metric = %source.name, "Skipping percentiles for empty data point");
            continue;
        }
        if !has_valid_shape(&point) {
            tracing::trace!(
                metric = %source.name,
                bounds = point.explicit_bounds.len(),
                buckets = point.bucket_counts.len(),
                "Skipping percentiles for data point with mismatched buckets"
            );
            continue;
        }

        normalize_bucket_counts(&mut point.bucket_counts, point.count);
        if !is_non_decreasing(&point.bucket_counts) {
            tracing::trace!(
                metric = %source.name,
                "Skipping percentiles for data point with decreasing cumulative counts"
            );
            continue;
        }

        for (percentile, points) in PERCENTILES.iter().zip(percentile_points.iter_mut()) {
            let value = estimate_percentile(
                percentile.rank,
                point.count,
                &point.explicit_bounds,
                &point.bucket_counts,
            );
            points.push(gauge_point(&point, value));
        }
    }

    let series = PERCENTILES
        .iter()
        .map(|p| p.label)
        .zip(percentile_points)
        .chain([(COUNT_SUFFIX, count_points), (SUM_SUFFIX, sum_points)]);

    series
        .filter(|(_, points)| !points.is_empty())
        .map(|(suffix, points)| gauge_metric(source, suffix, points))
        .collect()
}

/// Percentiles need exactly one more bucket than explicit bounds.
pub fn has_valid_shape(point: &HistogramDataPoint) -> bool {
    point.bucket_counts.len() == point.explicit_bounds.len() + 1
}

fn gauge_metric(source: &Metric, suffix: &str, data_points: Vec<NumberDataPoint>) -> Metric {
    Metric {
        name: format!("{}.{suffix}", source.name),
        description: source.description.clone(),
        unit: source.unit.clone(),
        data: Some(Data::Gauge(Gauge { data_points })),
        ..Default::default()
    }
}

fn gauge_point(source: &HistogramDataPoint, value: f64) -> NumberDataPoint {
    NumberDataPoint {
        attributes: source.attributes.clone(),
        start_time_unix_nano: source.start_time_unix_nano,
        time_unix_nano: source.time_unix_nano,
        exemplars: source.exemplars.clone(),
        flags: source.flags,
        value: Some(number_data_point::Value::AsDouble(value)),
    }
}
