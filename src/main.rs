use std::net::SocketAddr;
use std::sync::Arc;

use acceptor::handler::DebugExporter;
use acceptor::serve_otlp_grpc;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::cli::{CommonArgs, CommonCommands, utils};
use processor::HistogramProcessorFactory;
use tokio::sync::oneshot;

#[derive(Parser)]
#[command(name = "histoproc")]
#[command(about = "histoproc - turns delta histograms into percentile gauges")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Option<HistoprocCommands>,
}

#[derive(Subcommand)]
enum HistoprocCommands {
    #[command(flatten)]
    Common(CommonCommands),
}

impl Default for HistoprocCommands {
    fn default() -> Self {
        Self::Common(CommonCommands::Start)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    utils::init_logging(&cli.common);

    let config = utils::load_config(cli.common.config.as_ref())?;

    let command = cli.command.unwrap_or_default();
    let HistoprocCommands::Common(ref common_cmd) = command;
    let factory = HistogramProcessorFactory::new();
    if matches!(common_cmd, CommonCommands::Validate) {
        factory
            .validate_config(&config.processors.histogram)
            .context("Invalid histogram processor configuration")?;
    }
    if utils::handle_common_command(common_cmd, &config)? {
        return Ok(());
    }

    let grpc_addr: SocketAddr = config
        .acceptor
        .grpc_addr
        .parse()
        .with_context(|| format!("Invalid OTLP/gRPC address: {}", config.acceptor.grpc_addr))?;

    let processor = Arc::new(
        factory
            .create_metrics_processor(&config.processors.histogram, DebugExporter::new())
            .context("Failed to create histogram processor")?,
    );
    processor.start();

    let (grpc_init_tx, grpc_init_rx) = oneshot::channel::<()>();
    let (grpc_shutdown_tx, grpc_shutdown_rx) = oneshot::channel::<()>();
    let (grpc_stopped_tx, grpc_stopped_rx) = oneshot::channel::<()>();

    let grpc_processor = processor.clone();
    let grpc_handle = tokio::spawn(async move {
        if let Err(e) = serve_otlp_grpc(
            grpc_addr,
            grpc_processor,
            grpc_init_tx,
            grpc_shutdown_rx,
            grpc_stopped_tx,
        )
        .await
        {
            log::error!("OTLP/gRPC server failed: {e:#}");
        }
    });

    grpc_init_rx
        .await
        .context("Failed to receive init signal from OTLP/gRPC server")?;
    log::info!("histoproc started, press Ctrl+C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    log::info!("Shutdown signal received");

    let _ = grpc_shutdown_tx.send(());
    match tokio::time::timeout(config.acceptor.shutdown_timeout, grpc_stopped_rx).await {
        Ok(Ok(())) => log::info!("OTLP/gRPC server stopped"),
        Ok(Err(_)) => log::warn!("OTLP/gRPC server exited without confirming shutdown"),
        Err(_) => {
            log::warn!(
                "OTLP/gRPC server did not stop within {:?}, aborting",
                config.acceptor.shutdown_timeout
            );
            grpc_handle.abort();
        }
    }

    processor.shutdown();
    log::info!("histoproc stopped");

    Ok(())
}
