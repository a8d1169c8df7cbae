//! Batch rewriting: swap delta histograms for their derived gauges.

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::metrics::v1::{
    AggregationTemporality, Histogram, Metric, ResourceMetrics, ScopeMetrics, metric::Data,
};

use crate::convert::convert_histogram;

/// What a rewrite did to a batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteStats {
    /// Delta histograms replaced by gauges
    pub converted_histograms: usize,
    /// Gauge metrics emitted in their place
    pub derived_metrics: usize,
    /// Scope groups removed because they ended up empty
    pub pruned_scopes: usize,
    /// Resource groups removed because they ended up empty
    pub pruned_resources: usize,
}

impl RewriteStats {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Only delta histograms are converted; everything else passes through.
pub fn is_eligible(histogram: &Histogram) -> bool {
    histogram.aggregation_temporality == AggregationTemporality::Delta as i32
}

/// Rewrites `request` in place.
pub fn rewrite_batch(request: &mut ExportMetricsServiceRequest) -> RewriteStats {
    rewrite_resource_metrics(&mut request.resource_metrics)
}

/// Rewrites resource groups bottom-up: metrics within each scope, then scopes
/// within each resource, then the resources themselves. Every level is rebuilt
/// into a fresh `Vec` and swapped back, and empty groups are dropped.
pub fn rewrite_resource_metrics(resource_metrics: &mut Vec<ResourceMetrics>) -> RewriteStats {
    let mut stats = RewriteStats::default();

    let resources = std::mem::take(resource_metrics);
    resource_metrics.reserve(resources.len());

    for mut resource in resources {
        let scopes = std::mem::take(&mut resource.scope_metrics);
        for mut scope in scopes {
            rewrite_scope(&mut scope, &mut stats);
            if scope.metrics.is_empty() {
                stats.pruned_scopes += 1;
            } else {
                resource.scope_metrics.push(scope);
            }
        }

        if resource.scope_metrics.is_empty() {
            stats.pruned_resources += 1;
        } else {
            resource_metrics.push(resource);
        }
    }

    stats
}

fn rewrite_scope(scope: &mut ScopeMetrics, stats: &mut RewriteStats) {
    let metrics = std::mem::take(&mut scope.metrics);
    scope.metrics.reserve(metrics.len());

    for mut metric in metrics {
        match metric.data.take() {
            Some(Data::Histogram(histogram)) if is_eligible(&histogram) => {
                let derived = convert_histogram(&metric, histogram);
                stats.converted_histograms += 1;
                stats.derived_metrics += derived.len();
                scope.metrics.extend(derived);
            }
            data => {
                metric.data = data;
                scope.metrics.push(metric);
            }
        }
    }
}

/// Convenience wrapper for callers holding the batch by value.
pub fn rewrite(
    mut request: ExportMetricsServiceRequest,
) -> (ExportMetricsServiceRequest, RewriteStats) {
    let stats = rewrite_batch(&mut request);
    (request, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::common::v1::InstrumentationScope;
    use opentelemetry_proto::tonic::metrics::v1::{
        Gauge, HistogramDataPoint, NumberDataPoint, Sum, number_data_point,
    };

    fn histogram_metric(name: &str, temporality: AggregationTemporality, points: usize) -> Metric {
        let data_points = (0..points)
            .map(|_| HistogramDataPoint {
                count: 8,
                sum: Some(321.0),
                explicit_bounds: vec![1.0, 5.0, 10.0, 20.0, 50.0, 75.0, 100.0],
                bucket_counts: vec![1, 2, 3, 4, 5, 6, 7, 8],
                ..Default::default()
            })
            .collect();

        Metric {
            name: name.to_string(),
            data: Some(Data::Histogram(Histogram {
                data_points,
                aggregation_temporality: temporality as i32,
            })),
            ..Default::default()
        }
    }

    fn gauge_metric(name: &str) -> Metric {
        Metric {
            name: name.to_string(),
            data: Some(Data::Gauge(Gauge {
                data_points: vec![NumberDataPoint {
                    value: Some(number_data_point::Value::AsInt(3)),
                    ..Default::default()
                }],
            })),
            ..Default::default()
        }
    }

    fn sum_metric(name: &str) -> Metric {
        Metric {
            name: name.to_string(),
            data: Some(Data::Sum(Sum {
                data_points: vec![NumberDataPoint::default()],
                aggregation_temporality: AggregationTemporality::Delta as i32,
                is_monotonic: true,
            })),
            ..Default::default()
        }
    }

    fn scope(name: &str, metrics: Vec<Metric>) -> ScopeMetrics {
        ScopeMetrics {
            scope: Some(InstrumentationScope {
                name: name.to_string(),
                ..Default::default()
            }),
            metrics,
            ..Default::default()
        }
    }

    fn request(resources: Vec<Vec<ScopeMetrics>>) -> ExportMetricsServiceRequest {
        ExportMetricsServiceRequest {
            resource_metrics: resources
                .into_iter()
                .map(|scope_metrics| ResourceMetrics {
                    scope_metrics,
                    ..Default::default()
                })
                .collect(),
        }
    }

    fn metric_names(request: &ExportMetricsServiceRequest) -> Vec<Vec<Vec<String>>> {
        request
            .resource_metrics
            .iter()
            .map(|rm| {
                rm.scope_metrics
                    .iter()
                    .map(|sm| sm.metrics.iter().map(|m| m.name.clone()).collect())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_ineligible_metrics_are_untouched() {
        let mut batch = request(vec![vec![scope(
            "lib",
            vec![
                gauge_metric("queue_depth"),
                histogram_metric("latency", AggregationTemporality::Cumulative, 2),
                sum_metric("requests"),
                Metric {
                    name: "empty".to_string(),
                    ..Default::default()
                },
            ],
        )]]);
        let original = batch.clone();

        let stats = rewrite_batch(&mut batch);

        assert_eq!(batch, original);
        assert!(stats.is_noop());
    }

    #[test]
    fn test_delta_histogram_replaced_in_position() {
        let mut batch = request(vec![vec![scope(
            "lib",
            vec![
                gauge_metric("before"),
                histogram_metric("latency", AggregationTemporality::Delta, 1),
                gauge_metric("after"),
            ],
        )]]);

        let stats = rewrite_batch(&mut batch);

        assert_eq!(
            metric_names(&batch),
            vec![vec![vec![
                "before",
                "latency.p50",
                "latency.p75",
                "latency.p90",
                "latency.p95",
                "latency.count",
                "latency.sum",
                "after",
            ]]]
        );
        assert_eq!(stats.converted_histograms, 1);
        assert_eq!(stats.derived_metrics, 6);
        assert_eq!(stats.pruned_scopes, 0);
    }

    #[test]
    fn test_unspecified_temporality_passes_through() {
        let mut batch = request(vec![vec![scope(
            "lib",
            vec![histogram_metric(
                "latency",
                AggregationTemporality::Unspecified,
                1,
            )],
        )]]);
        let original = batch.clone();

        rewrite_batch(&mut batch);
        assert_eq!(batch, original);
    }

    #[test]
    fn test_emptied_groups_are_pruned() {
        let mut batch = request(vec![
            vec![
                scope(
                    "only-empty-histograms",
                    vec![histogram_metric("a", AggregationTemporality::Delta, 0)],
                ),
                scope("kept", vec![gauge_metric("g")]),
            ],
            vec![scope(
                "also-empty",
                vec![histogram_metric("b", AggregationTemporality::Delta, 0)],
            )],
        ]);

        let stats = rewrite_batch(&mut batch);

        assert_eq!(metric_names(&batch), vec![vec![vec!["g".to_string()]]]);
        assert_eq!(
            batch.resource_metrics[0].scope_metrics[0]
                .scope
                .as_ref()
                .map(|s| s.name.as_str()),
            Some("kept")
        );
        assert_eq!(stats.pruned_scopes, 2);
        assert_eq!(stats.pruned_resources, 1);
    }

    #[test]
    fn test_batch_of_empty_histograms_becomes_empty() {
        let mut batch = request(vec![
            vec![scope(
                "a",
                vec![
                    histogram_metric("x", AggregationTemporality::Delta, 0),
                    histogram_metric("y", AggregationTemporality::Delta, 0),
                ],
            )],
            vec![scope(
                "b",
                vec![histogram_metric("z", AggregationTemporality::Delta, 0)],
            )],
        ]);

        let stats = rewrite_batch(&mut batch);

        assert!(batch.resource_metrics.is_empty());
        assert_eq!(stats.converted_histograms, 3);
        assert_eq!(stats.derived_metrics, 0);
        assert_eq!(stats.pruned_resources, 2);
    }

    #[test]
    fn test_resource_and_scope_fields_survive() {
        let mut batch = request(vec![vec![scope(
            "instrumentation",
            vec![histogram_metric("latency", AggregationTemporality::Delta, 1)],
        )]]);
        batch.resource_metrics[0].schema_url = "https://opentelemetry.io/schemas/1.21.0".into();

        let (batch, _) = rewrite(batch);

        let resource = &batch.resource_metrics[0];
        assert_eq!(resource.schema_url, "https://opentelemetry.io/schemas/1.21.0");
        assert_eq!(
            resource.scope_metrics[0].scope.as_ref().map(|s| s.name.as_str()),
            Some("instrumentation")
        );
    }

    #[test]
    fn test_multiple_histograms_keep_relative_order() {
        let mut batch = request(vec![vec![scope(
            "lib",
            vec![
                histogram_metric("first", AggregationTemporality::Delta, 1),
                histogram_metric("kept", AggregationTemporality::Cumulative, 1),
                histogram_metric("second", AggregationTemporality::Delta, 1),
            ],
        )]]);

        rewrite_batch(&mut batch);

        let names = &metric_names(&batch)[0][0];
        assert_eq!(names.len(), 13);
        assert_eq!(names[0], "first.p50");
        assert_eq!(names[5], "first.sum");
        assert_eq!(names[6], "kept");
        assert_eq!(names[7], "second.p50");
        assert_eq!(names[12], "second.sum");
    }

    #[test]
    fn test_empty_batch() {
        let mut batch = ExportMetricsServiceRequest::default();
        assert!(rewrite_batch(&mut batch).is_noop());
        assert!(batch.resource_metrics.is_empty());
    }
}
