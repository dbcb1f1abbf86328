use aqmonitor::client::ProviderClient;
use aqmonitor::config::Config;
use aqmonitor::db::{self, PgStore};
use aqmonitor::gateway::AirVisualGateway;
use aqmonitor::service::AirQualityService;
use aqmonitor::{metrics, rest, scheduler};
use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting air-quality monitor");
    info!("Provider: {}", config.api_url);
    info!(
        "Database: {}:{}/{}",
        config.database_host, config.database_port, config.database_name
    );
    info!(
        "Snapshot location: {}, {} every {:?}",
        config.snapshot_lat,
        config.snapshot_lon,
        config.snapshot_interval()
    );

    metrics::init_metrics();

    let pool = match db::make_pool(config.connect_options()).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    let client = ProviderClient::new(&config.api_url)?;
    let gateway = AirVisualGateway::new(client, config.api_key.clone());
    let service = AirQualityService::new(
        Arc::new(gateway),
        Arc::new(PgStore::new(pool)),
        config.snapshot_location(),
        config.display_format(),
    );

    let scheduler_service = service.clone();
    let period = config.snapshot_interval();
    let scheduler_handle = tokio::spawn(async move {
        scheduler::run_scheduler(scheduler_service, period).await;
    });

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(rest::create_router(service));

    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", http_addr, e);
            std::process::exit(1);
        });

    info!("HTTP server listening on {}", http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = scheduler_handle => {
            error!("Scheduler task terminated");
        }
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
    Ok(())
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
