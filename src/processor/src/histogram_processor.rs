use std::sync::atomic::{AtomicBool, Ordering};

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use tokio::sync::watch;

use crate::consumer::{Capabilities, MetricsConsumer};
use crate::error::{ProcessorError, Result};
use crate::factory::ComponentId;
use crate::rewrite::rewrite;

/// Start/shutdown bookkeeping for a pipeline component.
///
/// Nothing runs in the background today; the shutdown channel is where
/// future background work would subscribe.
#[derive(Debug)]
struct Lifecycle {
    started: AtomicBool,
    stopped: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl Lifecycle {
    fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            shutdown_tx,
        }
    }
}

/// Pipeline stage replacing delta histograms with percentile, count and sum gauges
/// before handing batches to the next consumer.
pub struct HistogramProcessor<C> {
    id: ComponentId,
    enabled: bool,
    next: C,
    lifecycle: Lifecycle,
}

impl<C: MetricsConsumer> HistogramProcessor<C> {
    pub fn new(id: ComponentId, enabled: bool, next: C) -> Self {
        Self {
            id,
            enabled,
            next,
            lifecycle: Lifecycle::new(),
        }
    }

    pub fn id(&self) -> &ComponentId {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn next_consumer(&self) -> &C {
        &self.next
    }

    /// Marks the processor as started. Calling it more than once is harmless.
    pub fn start(&self) {
        if !self.lifecycle.started.swap(true, Ordering::SeqCst) {
            tracing::info!(
                processor = %self.id,
                enabled = self.enabled,
                "Histogram processor started"
            );
        }
    }

    /// Stops accepting batches and releases the shutdown channel. Idempotent;
    /// a batch already being processed is not interrupted.
    pub fn shutdown(&self) {
        if self.lifecycle.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.lifecycle.shutdown_tx.send_replace(true);
        tracing::info!(processor = %self.id, "Histogram processor shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.lifecycle.stopped.load(Ordering::SeqCst)
    }

    /// Resolves to `true` once the processor has been shut down.
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.lifecycle.shutdown_tx.subscribe()
    }

    /// Rewrites one batch. Never fails; ineligible metrics pass through untouched.
    pub fn process_metrics(
        &self,
        request: ExportMetricsServiceRequest,
    ) -> ExportMetricsServiceRequest {
        if !self.enabled {
            return request;
        }

        let (request, stats) = rewrite(request);
        if !stats.is_noop() {
            tracing::debug!(
                processor = %self.id,
                converted = stats.converted_histograms,
                derived = stats.derived_metrics,
                pruned_scopes = stats.pruned_scopes,
                pruned_resources = stats.pruned_resources,
                "Rewrote metrics batch"
            );
        }
        request
    }
}

#[async_trait::async_trait]
impl<C: MetricsConsumer> MetricsConsumer for HistogramProcessor<C> {
    fn capabilities(&self) -> Capabilities {
        Capabilities { mutates_data: true }
    }

    async fn consume_metrics(&self, request: ExportMetricsServiceRequest) -> Result<()> {
        if self.is_shut_down() {
            return Err(ProcessorError::ShutDown);
        }

        let request = self.process_metrics(request);
        self.next.consume_metrics(request).await
    }
}
