use std::sync::atomic::{AtomicU64, Ordering};

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::metrics::v1::{Metric, metric::Data};
use processor::{MetricsConsumer, Result};

/// Sizes of a metrics batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub resources: usize,
    pub scopes: usize,
    pub metrics: usize,
    pub data_points: usize,
}

impl BatchSummary {
    pub fn of(request: &ExportMetricsServiceRequest) -> Self {
        let mut summary = Self {
            resources: request.resource_metrics.len(),
            ..Default::default()
        };

        for resource_metrics in &request.resource_metrics {
            summary.scopes += resource_metrics.scope_metrics.len();
            for scope_metrics in &resource_metrics.scope_metrics {
                summary.metrics += scope_metrics.metrics.len();
                summary.data_points += scope_metrics
                    .metrics
                    .iter()
                    .map(data_point_count)
                    .sum::<usize>();
            }
        }

        summary
    }
}

fn data_point_count(metric: &Metric) -> usize {
    match &metric.data {
        Some(Data::Gauge(g)) => g.data_points.len(),
        Some(Data::Sum(s)) => s.data_points.len(),
        Some(Data::Histogram(h)) => h.data_points.len(),
        Some(Data::ExponentialHistogram(eh)) => eh.data_points.len(),
        Some(Data::Summary(s)) => s.data_points.len(),
        None => 0,
    }
}

/// Terminal consumer that logs what reaches the end of the pipeline
#[derive(Debug, Default)]
pub struct DebugExporter {
    batches: AtomicU64,
}

impl DebugExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches exported so far
    pub fn exported_batches(&self) -> u64 {
        self.batches.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl MetricsConsumer for DebugExporter {
    async fn consume_metrics(&self, request: ExportMetricsServiceRequest) -> Result<()> {
        let summary = BatchSummary::of(&request);
        let batch = self.batches.fetch_add(1, Ordering::Relaxed) + 1;

        log::info!(
            "Metrics batch #{batch}: {} resources, {} scopes, {} metrics, {} data points",
            summary.resources,
            summary.scopes,
            summary.metrics,
            summary.data_points
        );

        if log::log_enabled!(log::Level::Debug) {
            for metric in request
                .resource_metrics
                .iter()
                .flat_map(|rm| &rm.scope_metrics)
                .flat_map(|sm| &sm.metrics)
            {
                log::debug!("  {} ({} points)", metric.name, data_point_count(metric));
            }
        }

        Ok(())
    }
}
