use std::sync::Arc;

use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;

use crate::error::Result;

/// How a pipeline component treats the batches handed to it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// The component modifies batches in place before passing them on
    pub mutates_data: bool,
}

/// Next stage of a metrics pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetricsConsumer: Send + Sync {
    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    async fn consume_metrics(&self, request: ExportMetricsServiceRequest) -> Result<()>;
}

#[async_trait::async_trait]
impl<C: MetricsConsumer + ?Sized> MetricsConsumer for Arc<C> {
    fn capabilities(&self) -> Capabilities {
        (**self).capabilities()
    }

    async fn consume_metrics(&self, request: ExportMetricsServiceRequest) -> Result<()> {
        (**self).consume_metrics(request).await
    }
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use super::*;
    use tokio::sync::Mutex;

    /// Consumer that keeps every batch it receives
    #[derive(Default)]
    pub struct CollectingConsumer {
        pub batches: Mutex<Vec<ExportMetricsServiceRequest>>,
    }

    impl CollectingConsumer {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn take(&self) -> Vec<ExportMetricsServiceRequest> {
            std::mem::take(&mut *self.batches.lock().await)
        }
    }

    #[async_trait::async_trait]
    impl MetricsConsumer for CollectingConsumer {
        async fn consume_metrics(&self, request: ExportMetricsServiceRequest) -> Result<()> {
            self.batches.lock().await.push(request);
            Ok(())
        }
    }
}
