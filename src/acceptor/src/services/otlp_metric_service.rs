use opentelemetry_proto::tonic::collector::metrics::v1::{
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
    metrics_service_server::MetricsService,
};
use processor::{MetricsConsumer, ProcessorError};
use tonic::{Request, Response, Status};

/// OTLP/gRPC metrics endpoint feeding a metrics pipeline
pub struct MetricsAcceptorService<C: MetricsConsumer> {
    consumer: C,
}

impl<C: MetricsConsumer> MetricsAcceptorService<C> {
    pub fn new(consumer: C) -> Self {
        Self { consumer }
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }
}

fn to_status(err: ProcessorError) -> Status {
    match err {
        ProcessorError::ShutDown => Status::unavailable(err.to_string()),
        ProcessorError::Downstream(_) => Status::internal(err.to_string()),
        ProcessorError::InvalidComponentId(_) | ProcessorError::ComponentTypeMismatch { .. } => {
            Status::invalid_argument(err.to_string())
        }
    }
}

#[tonic::async_trait]
impl<C: MetricsConsumer + 'static> MetricsService for MetricsAcceptorService<C> {
    async fn export(
        &self,
        request: Request<ExportMetricsServiceRequest>,
    ) -> Result<Response<ExportMetricsServiceResponse>, Status> {
        let request_inner = request.into_inner();
        log::debug!(
            "Received OTLP metrics export with {} resource groups",
            request_inner.resource_metrics.len()
        );

        self.consumer
            .consume_metrics(request_inner)
            .await
            .map_err(|e| {
                log::error!("Failed to process OTLP metrics: {e}");
                to_status(e)
            })?;

        Ok(Response::new(ExportMetricsServiceResponse::default()))
    }
}
