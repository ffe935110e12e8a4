use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hl_exporter::routes;
use hl_exporter::state::AppState;
use hl_exporter::{ExporterConfig, MonitorError, PrometheusSink, ValidatorMonitor};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match ExporterConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let sink = match PrometheusSink::new() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::error!("Failed to register metrics: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Hyperliquid exporter v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Network: {} ({})", config.network, config.api_url);
    tracing::info!(
        "Polling validator summaries every {}s",
        config.poll_interval.as_secs()
    );

    // ── Validator monitor ───────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let (error_tx, error_rx) = mpsc::channel(config.error_channel_capacity);

    let monitor = ValidatorMonitor::from_config(&config, sink.clone());
    let monitor_handle = monitor.spawn(cancel.clone(), error_tx);
    let drain_handle = tokio::spawn(drain_errors(error_rx));

    // ── Scrape server ───────────────────────────────────────────────────
    let port = config.port;
    let state = web::Data::new(AppState {
        sink,
        network: config.network,
        metrics_token: config.metrics_token.map(String::into_bytes),
    });

    tracing::info!("  GET  http://localhost:{port}/metrics");
    tracing::info!("  GET  http://localhost:{port}/health");

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(routes::health)
            .service(routes::metrics_endpoint)
    })
    .bind(("0.0.0.0", port))?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
        server_handle.stop(true).await;
    });

    server.await?;

    cancel.cancel();
    if let Err(e) = monitor_handle.await {
        tracing::warn!("Validator monitor task ended abnormally: {e}");
    }
    // The monitor owned the only sender, so the drain finishes on its own.
    let _ = drain_handle.await;

    tracing::info!("Hyperliquid exporter stopped");
    Ok(())
}

/// Consume forwarded monitor errors so they reach the operator log with a
/// running failure count.
async fn drain_errors(mut errors: mpsc::Receiver<MonitorError>) {
    let mut failures: u64 = 0;
    while let Some(e) = errors.recv().await {
        failures += 1;
        tracing::warn!(
            kind = e.kind(),
            failures,
            "Validator cycle failed: {e}"
        );
    }
}
