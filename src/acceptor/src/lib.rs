pub mod handler;
pub mod services;

use std::net::SocketAddr;

use opentelemetry_proto::tonic::collector::metrics::v1::metrics_service_server::MetricsServiceServer;
use processor::MetricsConsumer;
use services::MetricsAcceptorService;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

/// Serves the OTLP/gRPC metrics endpoint on `addr`, feeding `consumer`.
pub async fn serve_otlp_grpc<C>(
    addr: SocketAddr,
    consumer: C,
    init_tx: oneshot::Sender<()>,
    shutdown_rx: oneshot::Receiver<()>,
    stopped_tx: oneshot::Sender<()>,
) -> Result<(), anyhow::Error>
where
    C: MetricsConsumer + 'static,
{
    let listener = TcpListener::bind(addr).await?;
    serve_otlp_grpc_with_listener(listener, consumer, init_tx, shutdown_rx, stopped_tx).await
}

/// Same as [`serve_otlp_grpc`] on an already bound listener.
pub async fn serve_otlp_grpc_with_listener<C>(
    listener: TcpListener,
    consumer: C,
    init_tx: oneshot::Sender<()>,
    shutdown_rx: oneshot::Receiver<()>,
    stopped_tx: oneshot::Sender<()>,
) -> Result<(), anyhow::Error>
where
    C: MetricsConsumer + 'static,
{
    let addr = listener.local_addr()?;
    log::info!("Starting OTLP/gRPC metrics acceptor on {addr}");

    let metrics_server = MetricsServiceServer::new(MetricsAcceptorService::new(consumer));

    init_tx
        .send(())
        .map_err(|_| anyhow::anyhow!("Unable to send init signal for OTLP/gRPC server"))?;

    Server::builder()
        .add_service(metrics_server)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
            shutdown_rx.await.ok();
            log::info!("Shutting down OTLP/gRPC acceptor");
        })
        .await?;

    stopped_tx
        .send(())
        .map_err(|_| anyhow::anyhow!("Unable to send stopped signal for OTLP/gRPC server"))?;

    Ok(())
}
