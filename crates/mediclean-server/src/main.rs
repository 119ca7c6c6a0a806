//! MediClean
//!
//! Serves the preparation and training pipeline over HTTP, or runs it once
//! from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use mediclean_pipeline::run_pipeline;
use mediclean_server::cli::{Cli, Commands};
use mediclean_server::{run_server, AppState, ServerConfig};
use metrics_exporter_prometheus::PrometheusHandle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            listen,
            port,
            verbose,
        } => {
            init_tracing(verbose);
            info!("Starting MediClean server");

            let config = ServerConfig::load(&config)
                .with_context(|| format!("failed to load {}", config.display()))?
                .with_overrides(listen, port);
            info!("Upload directory: {}", config.upload_dir.display());
            info!("Processed directory: {}", config.processed_dir.display());

            let metrics_handle = init_metrics()?;

            let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
            let state = AppState::new(config, metrics_handle);

            let shutdown = async {
                shutdown_signal().await;
                warn!("Shutdown signal received, stopping server...");
            };
            run_server(state, addr, shutdown).await?;

            info!("Server shutdown complete");
        }

        Commands::Run {
            file,
            config,
            output,
            verbose,
        } => {
            init_tracing(verbose);

            let config = ServerConfig::load(&config)
                .with_context(|| format!("failed to load {}", config.display()))?;
            let output = output.unwrap_or_else(|| config.processed_dir.clone());

            let result = tokio::task::spawn_blocking(move || {
                run_pipeline(&file, &config.pipeline, &output)
            })
            .await??;

            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("mediclean=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mediclean=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!("mediclean_runs_total", "Total number of pipeline runs started");
    metrics::describe_counter!(
        "mediclean_run_failures_total",
        "Total number of failed pipeline runs by error kind"
    );
    metrics::describe_histogram!(
        "mediclean_stage_latency_us",
        metrics::Unit::Microseconds,
        "Table stage latency in microseconds by stage"
    );
    metrics::describe_counter!("mediclean_uploads_total", "Total number of upload requests");

    info!("Metrics exporter initialized");
    Ok(handle)
}
